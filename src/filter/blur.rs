use super::Filter;
use crate::error::{FilterError, Result};
use crate::frame::VideoFrame;

const NAME: &str = "blur";

/// Separable Gaussian blur with an explicit odd kernel size per axis.
///
/// Sigma is derived from each kernel size as `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
/// Pixels outside the frame are taken from a mirror of the border that does
/// not repeat the edge pixel (`dcb|abcd|cba`).
#[derive(Debug, Clone, PartialEq)]
pub struct Blur {
    kernel_x: u32,
    kernel_y: u32,
    weights_x: Vec<f32>,
    weights_y: Vec<f32>,
}

impl Blur {
    pub const DEFAULT_KERNEL: (u32, u32) = (15, 15);

    /// Creates a blur with a `kernel_x` x `kernel_y` kernel.
    pub fn new(kernel_x: u32, kernel_y: u32) -> Result<Self> {
        for (axis, k) in [("x", kernel_x), ("y", kernel_y)] {
            if k == 0 || k % 2 == 0 {
                return Err(FilterError::invalid(
                    NAME,
                    format!("kernel {} size must be a positive odd integer, got {}", axis, k),
                ));
            }
        }
        Ok(Self {
            kernel_x,
            kernel_y,
            weights_x: gaussian_kernel(kernel_x),
            weights_y: gaussian_kernel(kernel_y),
        })
    }

    /// Kernel dimensions `(kx, ky)`.
    pub fn kernel(&self) -> (u32, u32) {
        (self.kernel_x, self.kernel_y)
    }
}

impl Default for Blur {
    fn default() -> Self {
        let (kx, ky) = Self::DEFAULT_KERNEL;
        Self {
            kernel_x: kx,
            kernel_y: ky,
            weights_x: gaussian_kernel(kx),
            weights_y: gaussian_kernel(ky),
        }
    }
}

/// Normalised 1D Gaussian weights for an odd kernel size.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Maps an out-of-range index back into `0..len` using reflect-101.
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as usize;
        }
    }
}

impl Filter for Blur {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&self, input: VideoFrame) -> Result<VideoFrame> {
        input.check_layout(NAME)?;

        let width = input.width as usize;
        let height = input.height as usize;
        let channels = input.format.channels();
        let stride = width * channels;
        let rx = (self.weights_x.len() / 2) as isize;
        let ry = (self.weights_y.len() / 2) as isize;

        // Horizontal pass into a float buffer
        let mut horizontal = vec![0f32; input.data.len()];
        for y in 0..height {
            let row = &input.data[y * stride..(y + 1) * stride];
            for x in 0..width {
                for c in 0..channels {
                    let mut acc = 0f32;
                    for (k, w) in self.weights_x.iter().enumerate() {
                        let sx = reflect_101(x as isize + k as isize - rx, width);
                        acc += w * row[sx * channels + c] as f32;
                    }
                    horizontal[y * stride + x * channels + c] = acc;
                }
            }
        }

        // Vertical pass back to 8-bit samples
        let mut data = vec![0u8; input.data.len()];
        for y in 0..height {
            for i in 0..stride {
                let mut acc = 0f32;
                for (k, w) in self.weights_y.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - ry, height);
                    acc += w * horizontal[sy * stride + i];
                }
                data[y * stride + i] = acc.round().clamp(0.0, 255.0) as u8;
            }
        }

        Ok(VideoFrame {
            data,
            ..input
        })
    }
}
