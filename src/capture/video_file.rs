//! Video file source.
//! Uses the `ffprobe`/`ffmpeg` command-line tools to probe and decode frames.

use super::FrameSource;
use crate::frame::{PixelFormat, VideoFrame};
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use tracing::{error, info, warn};

/// Decodes a video file through a child `ffmpeg` process writing raw RGB frames.
///
/// The stream ends at end of file; it does not loop.
pub struct VideoFileSource {
    path: PathBuf,
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    fps: Option<f64>,
    frame_index: u64,
    exhausted: bool,
}

/// Stream properties reported by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ProbeInfo {
    width: u32,
    height: u32,
    fps: Option<f64>,
}

impl VideoFileSource {
    /// Probes the file and starts the decoder.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Opening video via ffmpeg CLI: {:?}", path);

        let output = Command::new("ffprobe")
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height,r_frame_rate"])
            .args(["-of", "csv=p=0"])
            .arg(&path)
            .output()
            .context("Failed to run ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "Problem opening video stream {:?}: {}",
                path,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let probe = parse_probe_output(&String::from_utf8(output.stdout)?)?;
        info!(
            "Video: {}x{}, {} fps",
            probe.width,
            probe.height,
            probe.fps.map_or_else(|| "unknown".to_string(), |f| format!("{:.2}", f))
        );

        let mut child = Command::new("ffmpeg")
            .args(["-loglevel", "error", "-nostdin", "-i"])
            .arg(&path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg")?;

        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    error!("ffmpeg: {}", line);
                }
            });
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout was not captured"))?;

        Ok(Self {
            path,
            child,
            stdout,
            width: probe.width,
            height: probe.height,
            fps: probe.fps,
            frame_index: 0,
            exhausted: false,
        })
    }

    fn timestamp_us(&self) -> Option<u64> {
        self.fps
            .map(|fps| (self.frame_index as f64 * 1_000_000.0 / fps).round() as u64)
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut frame = VideoFrame::new(self.width, self.height, PixelFormat::Rgb);
        if let Err(e) = self.stdout.read_exact(&mut frame.data) {
            self.exhausted = true;
            if e.kind() == ErrorKind::UnexpectedEof {
                info!("End of video {:?} after {} frames", self.path, self.frame_index);
                return Ok(None);
            }
            return Err(e).with_context(|| format!("Failed to read frame from {:?}", self.path));
        }

        frame.timestamp_us = self.timestamp_us();
        self.frame_index += 1;
        Ok(Some(frame))
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_rate(&self) -> Option<f64> {
        self.fps
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            // Already exited at end of stream
            if e.kind() != ErrorKind::InvalidInput {
                warn!("Failed to stop ffmpeg: {}", e);
            }
        }
        let _ = self.child.wait();
    }
}

/// Parses `width,height,r_frame_rate` as printed by ffprobe's csv writer.
fn parse_probe_output(stdout: &str) -> Result<ProbeInfo> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("ffprobe found no video stream"))?;
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return Err(anyhow!("Invalid ffprobe output: {}", line));
    }

    let width: u32 = parts[0].parse().with_context(|| format!("Invalid width in {:?}", line))?;
    let height: u32 = parts[1].parse().with_context(|| format!("Invalid height in {:?}", line))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("Video stream has no pixels: {}x{}", width, height));
    }

    Ok(ProbeInfo {
        width,
        height,
        fps: parts.get(2).and_then(|s| parse_fps(s)),
    })
}

/// Parses a rational (`30000/1001`) or decimal frame rate.
fn parse_fps(s: &str) -> Option<f64> {
    let fps = match s.split_once('/') {
        Some((num, den)) => {
            let n: f64 = num.parse().ok()?;
            let d: f64 = den.parse().ok()?;
            if d == 0.0 {
                return None;
            }
            n / d
        }
        None => s.parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}
