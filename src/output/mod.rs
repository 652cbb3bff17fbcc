//! Output backends for displaying or storing processed video.

mod image_sequence;
pub mod window_output;

pub use image_sequence::ImageSequenceOutput;
pub use window_output::WindowRenderer;

use crate::frame::VideoFrame;
use anyhow::Result;

/// Trait for video output backends.
pub trait OutputBackend {
    /// Write a frame to the output.
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<()>;
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NullOutput {
    frames: u64,
}

impl NullOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames received so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl OutputBackend for NullOutput {
    fn write_frame(&mut self, _frame: &VideoFrame) -> Result<()> {
        self.frames += 1;
        Ok(())
    }
}
