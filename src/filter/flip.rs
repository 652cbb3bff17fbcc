use super::Filter;
use crate::error::Result;
use crate::frame::VideoFrame;

const NAME: &str = "horizontal_flip";

/// Mirrors frames left to right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizontalFlip;

impl Filter for HorizontalFlip {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&self, input: VideoFrame) -> Result<VideoFrame> {
        let timestamp = input.timestamp_us;
        let flipped = input.into_image(NAME)?.fliph();
        Ok(VideoFrame::from_image(flipped, timestamp))
    }
}
