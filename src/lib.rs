//! Framepipe: real-time video filter pipeline
//!
//! Reads frames from a webcam or video file, runs them through an ordered
//! chain of filters, and displays or stores the result.

pub mod capture;
pub mod config;
pub mod driver;
pub mod error;
pub mod filter;
pub mod frame;
pub mod output;
pub mod pipeline;

pub use error::FilterError;
pub use filter::Filter;
pub use frame::{PixelFormat, VideoFrame};
pub use pipeline::Pipeline;
