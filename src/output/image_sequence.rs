//! Writes frames as numbered PNG files.

use super::OutputBackend;
use crate::frame::{PixelFormat, VideoFrame};
use anyhow::{Context, Result};
use image::ColorType;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stores each frame as `frame_NNNNNN.png` inside a directory.
pub struct ImageSequenceOutput {
    directory: PathBuf,
    next_index: u64,
}

impl ImageSequenceOutput {
    /// Creates the target directory if needed.
    pub fn new(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)
            .with_context(|| format!("Failed to create output directory {:?}", directory))?;
        info!("Writing frames to {:?}", directory);
        Ok(Self {
            directory,
            next_index: 0,
        })
    }

    /// Path the next frame will be written to.
    pub fn next_path(&self) -> PathBuf {
        self.directory.join(format!("frame_{:06}.png", self.next_index))
    }
}

impl OutputBackend for ImageSequenceOutput {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        frame.check_layout("image_sequence")?;
        let color = match frame.format {
            PixelFormat::Gray => ColorType::L8,
            PixelFormat::Rgb => ColorType::Rgb8,
            PixelFormat::Rgba => ColorType::Rgba8,
        };
        let path = self.next_path();
        image::save_buffer(&path, &frame.data, frame.width, frame.height, color)
            .with_context(|| format!("Failed to write {:?}", path))?;
        self.next_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_numbered_files_in_frame_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = ImageSequenceOutput::new(dir.path().join("frames")).unwrap();

        let gray = VideoFrame::filled(4, 3, PixelFormat::Gray, &[77]);
        let rgb = VideoFrame::filled(2, 2, PixelFormat::Rgb, &[1, 2, 3]);
        output.write_frame(&gray).unwrap();
        output.write_frame(&rgb).unwrap();

        let first = image::open(dir.path().join("frames/frame_000000.png")).unwrap();
        assert_eq!((first.width(), first.height()), (4, 3));
        assert_eq!(first.to_luma8().into_raw(), gray.data);

        let second = image::open(dir.path().join("frames/frame_000001.png")).unwrap();
        assert_eq!(second.to_rgb8().into_raw(), rgb.data);
        assert_eq!(output.next_path(), dir.path().join("frames/frame_000002.png"));
    }

    #[test]
    fn malformed_frame_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = ImageSequenceOutput::new(dir.path()).unwrap();
        let bad = VideoFrame::from_data(4, 4, PixelFormat::Rgb, vec![0; 3]);
        assert!(output.write_frame(&bad).is_err());
        assert_eq!(output.next_path(), dir.path().join("frame_000000.png"));
    }
}
