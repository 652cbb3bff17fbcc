use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::Filter;
use crate::error::{FilterError, Result};
use crate::frame::VideoFrame;

const NAME: &str = "resize";

/// Resampling method used by [`Resize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Nearest neighbour
    Nearest,
    /// Triangle filter. When shrinking, its support widens by the scale
    /// factor, so each output sample is an area-weighted average of every
    /// source pixel it covers (antialiased). This differs from a 2-tap
    /// bilinear sample, which only looks at the two nearest source pixels.
    #[default]
    Bilinear,
}

impl Interpolation {
    fn filter_type(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Bilinear => FilterType::Triangle,
        }
    }
}

/// Resamples frames to a fixed size, ignoring the input aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    width: u32,
    height: u32,
    interpolation: Interpolation,
}

impl Resize {
    /// Creates a bilinear resize to `width` x `height`.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_interpolation(width, height, Interpolation::default())
    }

    /// Creates a resize using the given resampling method.
    pub fn with_interpolation(width: u32, height: u32, interpolation: Interpolation) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::invalid(
                NAME,
                format!("target size must be positive, got {}x{}", width, height),
            ));
        }
        Ok(Self {
            width,
            height,
            interpolation,
        })
    }

    /// Target dimensions.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }
}

impl Filter for Resize {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&self, input: VideoFrame) -> Result<VideoFrame> {
        if (input.width, input.height) == (self.width, self.height) {
            input.check_layout(NAME)?;
            return Ok(input);
        }
        let timestamp = input.timestamp_us;
        let resized = input
            .into_image(NAME)?
            .resize_exact(self.width, self.height, self.interpolation.filter_type());
        Ok(VideoFrame::from_image(resized, timestamp))
    }
}
