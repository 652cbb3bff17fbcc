//! Frame sources: webcams, video files and in-memory sequences.

mod nokhwa_backend;
mod video_file;

pub use nokhwa_backend::CameraSource;
pub use video_file::VideoFileSource;

use crate::config::SourceConfig;
use crate::frame::VideoFrame;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A pull-based producer of frames.
pub trait FrameSource {
    /// Returns the next frame, or `None` once the stream is exhausted.
    ///
    /// After `None` the source stays exhausted.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>>;

    /// Returns the frame dimensions the source produces.
    fn frame_size(&self) -> (u32, u32);

    /// Nominal frames per second, if the source knows it.
    fn frame_rate(&self) -> Option<f64> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        (**self).next_frame()
    }

    fn frame_size(&self) -> (u32, u32) {
        (**self).frame_size()
    }

    fn frame_rate(&self) -> Option<f64> {
        (**self).frame_rate()
    }
}

/// Information about a camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index
    pub index: u32,
    /// Human-readable name
    pub name: String,
}

/// Configuration for camera capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index
    pub device_index: u32,
    /// Desired frame width
    pub width: u32,
    /// Desired frame height
    pub height: u32,
    /// Desired frame rate
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

/// Opens the source described by `config`.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    match config {
        SourceConfig::Camera(capture) => Ok(Box::new(CameraSource::open(capture.clone())?)),
        SourceConfig::File { path } => Ok(Box::new(VideoFileSource::open(path)?)),
    }
}

/// Adapts any frame iterator into a [`FrameSource`].
pub struct IterSource<I> {
    frames: I,
    size: (u32, u32),
    exhausted: bool,
}

impl<I: Iterator<Item = VideoFrame>> IterSource<I> {
    pub fn new(frames: impl IntoIterator<IntoIter = I>, size: (u32, u32)) -> Self {
        Self {
            frames: frames.into_iter(),
            size,
            exhausted: false,
        }
    }
}

impl<I: Iterator<Item = VideoFrame>> FrameSource for IterSource<I> {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        if self.exhausted {
            return Ok(None);
        }
        let next = self.frames.next();
        self.exhausted = next.is_none();
        Ok(next)
    }

    fn frame_size(&self) -> (u32, u32) {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;

    #[test]
    fn iter_source_yields_then_stays_exhausted() {
        let frames = vec![
            VideoFrame::new(2, 2, PixelFormat::Rgb),
            VideoFrame::new(2, 2, PixelFormat::Rgb),
        ];
        let mut source = IterSource::new(frames, (2, 2));
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.frame_size(), (2, 2));
        assert_eq!(source.frame_rate(), None);
    }
}
