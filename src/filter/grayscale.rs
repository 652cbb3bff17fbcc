use image::{DynamicImage, GrayImage, Luma};

use super::Filter;
use crate::error::Result;
use crate::frame::VideoFrame;

const NAME: &str = "grayscale";

/// Converts color frames to single-channel luminance.
///
/// Uses BT.601 weights (`0.299 R + 0.587 G + 0.114 B`) in 14-bit fixed
/// point, rounding half up. Alpha is dropped. A frame that is already
/// grayscale is returned unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grayscale;

/// Luma of one RGB sample.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    ((R * r as u32 + G * g as u32 + B * b as u32 + (1 << 13)) >> 14) as u8
}

impl Filter for Grayscale {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&self, input: VideoFrame) -> Result<VideoFrame> {
        let timestamp = input.timestamp_us;
        let gray = match input.into_image(NAME)? {
            image @ DynamicImage::ImageLuma8(_) => image,
            DynamicImage::ImageRgb8(rgb) => DynamicImage::ImageLuma8(GrayImage::from_fn(
                rgb.width(),
                rgb.height(),
                |x, y| {
                    let p = rgb.get_pixel(x, y);
                    Luma([luma(p[0], p[1], p[2])])
                },
            )),
            other => {
                let rgba = other.to_rgba8();
                DynamicImage::ImageLuma8(GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                    let p = rgba.get_pixel(x, y);
                    Luma([luma(p[0], p[1], p[2])])
                }))
            }
        };
        Ok(VideoFrame::from_image(gray, timestamp))
    }
}
