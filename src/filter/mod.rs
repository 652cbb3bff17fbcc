//! Frame filters.

mod blur;
mod flip;
mod grayscale;
mod resize;

pub use blur::Blur;
pub use flip::HorizontalFlip;
pub use grayscale::Grayscale;
pub use resize::{Interpolation, Resize};

use crate::error::Result;
use crate::frame::VideoFrame;

/// A stateless transform from one frame to another.
///
/// Implementations keep their parameters fixed after construction and hold
/// no memory of previous frames, so one value may process frames from any
/// number of threads.
pub trait Filter: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Transforms `input` into a new frame.
    fn process(&self, input: VideoFrame) -> Result<VideoFrame>;
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn process(&self, input: VideoFrame) -> Result<VideoFrame> {
        (**self).process(input)
    }
}
