//! Video frame types and pixel format conversions.

use crate::error::{FilterError, Result};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// Supported pixel formats for video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single 8-bit luminance channel
    Gray,
    /// RGB with 8 bits per channel (24 bits per pixel)
    Rgb,
    /// RGBA with 8 bits per channel (32 bits per pixel)
    Rgba,
}

impl PixelFormat {
    /// Returns the number of interleaved channels per pixel.
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Gray => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// A video frame containing image data.
///
/// Samples are stored row-major and tightly packed, `channels()` bytes per
/// pixel. Two frames are equal when their shape, format, timestamp and bytes
/// are identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format of the frame data
    pub format: PixelFormat,
    /// Timestamp in microseconds (if available)
    pub timestamp_us: Option<u64>,
    /// Raw pixel data
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// Creates a new zero-filled video frame with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let size = (width as usize) * (height as usize) * format.channels();
        Self {
            width,
            height,
            format,
            timestamp_us: None,
            data: vec![0; size],
        }
    }

    /// Creates a video frame from existing data.
    pub fn from_data(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            timestamp_us: None,
            data,
        }
    }

    /// Creates a frame where every pixel has the same value.
    ///
    /// `pixel` must hold exactly `format.channels()` samples.
    pub fn filled(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> Self {
        debug_assert_eq!(pixel.len(), format.channels());
        let count = (width as usize) * (height as usize);
        Self::from_data(width, height, format, pixel.repeat(count))
    }

    /// Attaches a presentation timestamp.
    pub fn with_timestamp(mut self, timestamp_us: u64) -> Self {
        self.timestamp_us = Some(timestamp_us);
        self
    }

    /// Number of bytes the frame's shape calls for.
    pub fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * self.format.channels()
    }

    /// Returns the samples of the pixel at `(x, y)`, or `None` when the
    /// coordinates fall outside the frame or the buffer is short.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.format.channels();
        let start = ((y as usize) * (self.width as usize) + x as usize) * channels;
        self.data.get(start..start + channels)
    }

    /// Verifies that the frame is non-empty and that its buffer matches its shape.
    pub fn check_layout(&self, filter: &'static str) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FilterError::incompatible(
                filter,
                format!("frame is empty ({}x{})", self.width, self.height),
            ));
        }
        let expected = self.expected_len();
        if self.data.len() != expected {
            return Err(FilterError::incompatible(
                filter,
                format!(
                    "{}x{} {:?} frame needs {} bytes, got {}",
                    self.width,
                    self.height,
                    self.format,
                    expected,
                    self.data.len()
                ),
            ));
        }
        Ok(())
    }

    /// Wraps the frame's buffer in an `image` buffer without copying.
    pub(crate) fn into_image(self, filter: &'static str) -> Result<DynamicImage> {
        self.check_layout(filter)?;
        let (w, h) = (self.width, self.height);
        let image = match self.format {
            PixelFormat::Gray => GrayImage::from_raw(w, h, self.data).map(DynamicImage::ImageLuma8),
            PixelFormat::Rgb => RgbImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba => RgbaImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgba8),
        };
        image.ok_or_else(|| FilterError::incompatible(filter, "buffer too small for frame"))
    }

    /// Builds a frame from an 8-bit `image` buffer.
    pub(crate) fn from_image(image: DynamicImage, timestamp_us: Option<u64>) -> Self {
        let (width, height) = (image.width(), image.height());
        let (format, data) = match image {
            DynamicImage::ImageLuma8(buf) => (PixelFormat::Gray, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (PixelFormat::Rgb, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (PixelFormat::Rgba, buf.into_raw()),
            other => (PixelFormat::Rgba, other.to_rgba8().into_raw()),
        };
        Self {
            width,
            height,
            format,
            timestamp_us,
            data,
        }
    }

    /// Converts this frame to RGBA format.
    pub fn to_rgba(&self) -> VideoFrame {
        if self.format == PixelFormat::Rgba {
            return self.clone();
        }

        let pixel_count = (self.width as usize) * (self.height as usize);
        let mut rgba_data = Vec::with_capacity(pixel_count * 4);

        match self.format {
            PixelFormat::Gray => {
                for &y in self.data.iter().take(pixel_count) {
                    rgba_data.extend_from_slice(&[y, y, y, 255]);
                }
            }
            PixelFormat::Rgb => {
                for px in self.data.chunks_exact(3).take(pixel_count) {
                    rgba_data.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
            }
            PixelFormat::Rgba => unreachable!(),
        }

        VideoFrame {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgba,
            timestamp_us: self.timestamp_us,
            data: rgba_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_rgba_conversion() {
        let rgb_data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let frame = VideoFrame::from_data(2, 2, PixelFormat::Rgb, rgb_data);
        let rgba_frame = frame.to_rgba();

        assert_eq!(rgba_frame.format, PixelFormat::Rgba);
        assert_eq!(rgba_frame.data.len(), 16);
        // Check first pixel (red)
        assert_eq!(&rgba_frame.data[0..4], &[255, 0, 0, 255]);
        // Check second pixel (green)
        assert_eq!(&rgba_frame.data[4..8], &[0, 255, 0, 255]);
    }

    #[test]
    fn test_gray_to_rgba_replicates_luma() {
        let frame = VideoFrame::from_data(2, 1, PixelFormat::Gray, vec![10, 200]);
        let rgba = frame.to_rgba();
        assert_eq!(rgba.data, vec![10, 10, 10, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_check_layout_rejects_empty_and_short_frames() {
        let empty = VideoFrame::new(0, 4, PixelFormat::Rgb);
        assert!(matches!(
            empty.check_layout("test"),
            Err(FilterError::IncompatibleFrame { .. })
        ));

        let short = VideoFrame::from_data(2, 2, PixelFormat::Rgb, vec![0; 11]);
        assert!(matches!(
            short.check_layout("test"),
            Err(FilterError::IncompatibleFrame { .. })
        ));

        assert!(VideoFrame::new(2, 2, PixelFormat::Rgb).check_layout("test").is_ok());
    }

    #[test]
    fn test_image_roundtrip_keeps_timestamp_and_bytes() {
        let frame = VideoFrame::from_data(2, 1, PixelFormat::Rgb, vec![1, 2, 3, 4, 5, 6])
            .with_timestamp(42);
        let image = frame.clone().into_image("test").unwrap();
        let back = VideoFrame::from_image(image, frame.timestamp_us);
        assert_eq!(back, frame);
    }

    #[test]
    fn test_pixel_accessor() {
        let frame = VideoFrame::from_data(2, 2, PixelFormat::Gray, vec![1, 2, 3, 4]);
        assert_eq!(frame.pixel(1, 0), Some(&[2][..]));
        assert_eq!(frame.pixel(0, 1), Some(&[3][..]));
    }

    #[test]
    fn test_pixel_out_of_range_is_none() {
        let frame = VideoFrame::from_data(2, 2, PixelFormat::Rgb, vec![0; 12]);
        assert_eq!(frame.pixel(1, 1), Some(&[0, 0, 0][..]));
        assert_eq!(frame.pixel(2, 0), None);
        assert_eq!(frame.pixel(0, 2), None);

        let short = VideoFrame::from_data(2, 2, PixelFormat::Rgb, vec![0; 6]);
        assert_eq!(short.pixel(1, 1), None);
    }
}
