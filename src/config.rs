//! Startup configuration loaded from YAML.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::CaptureConfig;
use crate::driver::ErrorPolicy;
use crate::error::FilterError;
use crate::filter::{Blur, Grayscale, HorizontalFlip, Interpolation, Resize};
use crate::pipeline::Pipeline;

/// Top-level configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub filters: FilterConfig,
    pub output: OutputConfig,
    pub on_error: ErrorPolicy,
}

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// Webcam capture
    Camera(CaptureConfig),
    /// Video file decoded with ffmpeg
    File { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Camera(CaptureConfig::default())
    }
}

impl SourceConfig {
    /// Interprets a command-line input: digits select a camera, anything else is a file.
    pub fn from_input(input: &str, base: &SourceConfig) -> Self {
        match input.parse::<u32>() {
            Ok(index) => {
                let mut capture = match base {
                    SourceConfig::Camera(c) => c.clone(),
                    SourceConfig::File { .. } => CaptureConfig::default(),
                };
                capture.device_index = index;
                SourceConfig::Camera(capture)
            }
            Err(_) => SourceConfig::File {
                path: PathBuf::from(input),
            },
        }
    }
}

/// Filter parameters. The filter order itself is fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub resize: ResizeConfig,
    pub blur: BlurConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub width: u32,
    pub height: u32,
    pub interpolation: Interpolation,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            interpolation: Interpolation::Bilinear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    pub kernel: (u32, u32),
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            kernel: Blur::DEFAULT_KERNEL,
        }
    }
}

/// Output mode for processed video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Display in a window (default)
    #[default]
    Window,
    /// Write numbered PNG files
    Images,
    /// Discard frames
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    /// Window title
    pub title: String,
    /// Target directory for image output
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Window,
            title: "Processed Video Stream".to_string(),
            directory: PathBuf::from("frames"),
        }
    }
}

impl Config {
    /// Reads and parses a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Builds the grayscale -> mirror -> resize -> blur pipeline.
    pub fn build_pipeline(&self) -> Result<Pipeline, FilterError> {
        let resize = &self.filters.resize;
        let (kx, ky) = self.filters.blur.kernel;
        Ok(Pipeline::new()
            .with_filter(Grayscale)
            .with_filter(HorizontalFlip)
            .with_filter(Resize::with_interpolation(
                resize.width,
                resize.height,
                resize.interpolation,
            )?)
            .with_filter(Blur::new(kx, ky)?))
    }
}
