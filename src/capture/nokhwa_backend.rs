//! Nokhwa-based webcam source.

use super::{CameraInfo, CaptureConfig, FrameSource};
use crate::frame::{PixelFormat, VideoFrame};
use anyhow::{anyhow, Result};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use std::time::Instant;
use tracing::{info, warn};

/// Webcam capture using the nokhwa library. A camera never runs out of frames.
pub struct CameraSource {
    camera: Camera,
    width: u32,
    height: u32,
    fps: u32,
    started: Instant,
}

impl CameraSource {
    /// Returns a list of available camera devices.
    pub fn list_devices() -> Result<Vec<CameraInfo>> {
        let devices = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;
        Ok(devices
            .into_iter()
            .map(|d| CameraInfo {
                index: d.index().as_index().unwrap_or(0),
                name: d.human_name().to_string(),
            })
            .collect())
    }

    /// Opens the camera, preferring the configured resolution and frame rate.
    pub fn open(config: CaptureConfig) -> Result<Self> {
        // Uncompressed formats first for built-in cameras, MJPEG for USB ones.
        let resolution = Resolution::new(config.width, config.height);
        let requests = [FrameFormat::NV12, FrameFormat::YUYV, FrameFormat::MJPEG]
            .into_iter()
            .map(|format| {
                RequestedFormatType::Closest(CameraFormat::new(resolution, format, config.fps))
            })
            .chain(std::iter::once(RequestedFormatType::AbsoluteHighestResolution));

        let mut camera = None;
        for request in requests {
            let requested = RequestedFormat::new::<RgbFormat>(request);
            let Ok(mut cam) = Camera::new(CameraIndex::Index(config.device_index), requested) else {
                continue;
            };
            // Some drivers only fail once the stream is actually opened.
            match cam.open_stream() {
                Ok(()) => {
                    info!("Verified connection with request: {:?}", request);
                    camera = Some(cam);
                    break;
                }
                Err(e) => warn!("Camera rejected {:?}: {}", request, e),
            }
        }

        let camera = camera.ok_or_else(|| {
            anyhow!(
                "Problem opening video stream: camera index {} accepted no format",
                config.device_index
            )
        })?;

        let format = camera.camera_format();
        info!("Camera opened with format: {}", format);

        Ok(Self {
            width: format.resolution().width(),
            height: format.resolution().height(),
            fps: format.frame_rate(),
            camera,
            started: Instant::now(),
        })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        let buffer = self.camera.frame()?;
        let decoded = buffer.decode_image::<RgbFormat>()?;
        let (width, height) = (decoded.width(), decoded.height());
        let timestamp_us = self.started.elapsed().as_micros() as u64;

        Ok(Some(
            VideoFrame::from_data(width, height, PixelFormat::Rgb, decoded.into_raw())
                .with_timestamp(timestamp_us),
        ))
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_rate(&self) -> Option<f64> {
        (self.fps > 0).then_some(self.fps as f64)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop camera stream: {}", e);
        }
    }
}
