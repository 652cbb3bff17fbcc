//! Source -> pipeline -> sink loop.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::capture::FrameSource;
use crate::output::OutputBackend;
use crate::pipeline::Pipeline;

/// What a filter error does to the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the stream and report the error
    #[default]
    Halt,
    /// Drop the frame and keep going
    Skip,
}

/// Result of a single driver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A processed frame reached the sink
    Displayed,
    /// The pipeline rejected the frame and it was dropped
    Skipped,
    /// The source has no more frames
    Exhausted,
}

/// Counters for a stream run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub processed: u64,
    pub skipped: u64,
}

/// Periodic frame rate reporting.
struct FpsCounter {
    frame_count: u32,
    last_time: Instant,
}

impl FpsCounter {
    const INTERVAL: Duration = Duration::from_secs(1);

    fn new() -> Self {
        Self {
            frame_count: 0,
            last_time: Instant::now(),
        }
    }

    /// Returns Some(fps) once per interval.
    fn update(&mut self) -> Option<f32> {
        self.frame_count += 1;
        let elapsed = self.last_time.elapsed();
        if elapsed < Self::INTERVAL {
            return None;
        }
        let fps = self.frame_count as f32 / elapsed.as_secs_f32();
        self.frame_count = 0;
        self.last_time = Instant::now();
        Some(fps)
    }
}

/// Pulls frames from a source, runs them through a pipeline and hands them to a sink.
pub struct FrameDriver<S> {
    source: S,
    pipeline: Pipeline,
    policy: ErrorPolicy,
    stats: StreamStats,
    fps: FpsCounter,
    exhausted: bool,
}

impl<S: FrameSource> FrameDriver<S> {
    pub fn new(source: S, pipeline: Pipeline, policy: ErrorPolicy) -> Self {
        Self {
            source,
            pipeline,
            policy,
            stats: StreamStats::default(),
            fps: FpsCounter::new(),
            exhausted: false,
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Processes one frame.
    ///
    /// Source and sink errors always end the stream. Filter errors follow the
    /// configured [`ErrorPolicy`].
    pub fn step(&mut self, sink: &mut dyn OutputBackend) -> Result<Step> {
        if self.exhausted {
            return Ok(Step::Exhausted);
        }

        let Some(frame) = self.source.next_frame().context("Failed to read frame")? else {
            self.exhausted = true;
            return Ok(Step::Exhausted);
        };
        let index = self.stats.processed + self.stats.skipped;

        let processed = match self.pipeline.process(frame) {
            Ok(processed) => processed,
            Err(e) => match self.policy {
                ErrorPolicy::Halt => {
                    return Err(e).with_context(|| format!("Pipeline failed on frame {}", index));
                }
                ErrorPolicy::Skip => {
                    warn!("Skipping frame {}: {}", index, e);
                    self.stats.skipped += 1;
                    return Ok(Step::Skipped);
                }
            },
        };

        sink.write_frame(&processed).context("Failed to output frame")?;
        self.stats.processed += 1;

        if let Some(fps) = self.fps.update() {
            debug!(
                "[Perf] Processing at {:.2} FPS (output {}x{})",
                fps, processed.width, processed.height
            );
        }
        Ok(Step::Displayed)
    }

    /// Runs until the source is exhausted, an error stops the stream or `running` is cleared.
    pub fn run(&mut self, sink: &mut dyn OutputBackend, running: &AtomicBool) -> Result<StreamStats> {
        while running.load(Ordering::SeqCst) {
            if self.step(sink)? == Step::Exhausted {
                info!("Stream exhausted");
                break;
            }
        }
        info!(
            "Stream stopped: {} frames processed, {} skipped",
            self.stats.processed, self.stats.skipped
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::IterSource;
    use crate::error::FilterError;
    use crate::filter::{Grayscale, Resize};
    use crate::frame::{PixelFormat, VideoFrame};
    use crate::output::NullOutput;

    #[derive(Default)]
    struct Collect(Vec<VideoFrame>);

    impl OutputBackend for Collect {
        fn write_frame(&mut self, frame: &VideoFrame) -> Result<()> {
            self.0.push(frame.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl OutputBackend for FailingSink {
        fn write_frame(&mut self, _frame: &VideoFrame) -> Result<()> {
            anyhow::bail!("display gone")
        }
    }

    fn frames() -> Vec<VideoFrame> {
        vec![
            VideoFrame::filled(4, 4, PixelFormat::Rgb, &[10, 10, 10]).with_timestamp(0),
            // Truncated buffer, rejected by every filter
            VideoFrame::from_data(4, 4, PixelFormat::Rgb, vec![0; 7]),
            VideoFrame::filled(4, 4, PixelFormat::Rgb, &[30, 30, 30]).with_timestamp(2),
        ]
    }

    fn pipeline() -> Pipeline {
        Pipeline::new()
            .with_filter(Grayscale)
            .with_filter(Resize::new(2, 2).unwrap())
    }

    #[test]
    fn steps_until_exhausted() {
        let good = vec![frames().remove(0), frames().remove(2)];
        let mut driver = FrameDriver::new(IterSource::new(good, (4, 4)), pipeline(), ErrorPolicy::Halt);
        let mut sink = Collect::default();

        assert_eq!(driver.step(&mut sink).unwrap(), Step::Displayed);
        assert_eq!(driver.step(&mut sink).unwrap(), Step::Displayed);
        assert_eq!(driver.step(&mut sink).unwrap(), Step::Exhausted);
        assert_eq!(driver.step(&mut sink).unwrap(), Step::Exhausted);

        assert_eq!(
            sink.0,
            vec![
                VideoFrame::filled(2, 2, PixelFormat::Gray, &[10]).with_timestamp(0),
                VideoFrame::filled(2, 2, PixelFormat::Gray, &[30]).with_timestamp(2),
            ]
        );
        assert_eq!(driver.stats(), StreamStats { processed: 2, skipped: 0 });
    }

    #[test]
    fn halt_policy_surfaces_filter_error() {
        let mut driver = FrameDriver::new(IterSource::new(frames(), (4, 4)), pipeline(), ErrorPolicy::Halt);
        let mut sink = NullOutput::new();
        let running = AtomicBool::new(true);

        let err = driver.run(&mut sink, &running).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FilterError>(),
            Some(FilterError::IncompatibleFrame { filter: "grayscale", .. })
        ));
        assert_eq!(sink.frames(), 1);
    }

    #[test]
    fn skip_policy_drops_bad_frames() {
        let mut driver = FrameDriver::new(IterSource::new(frames(), (4, 4)), pipeline(), ErrorPolicy::Skip);
        let mut sink = Collect::default();
        let running = AtomicBool::new(true);

        let stats = driver.run(&mut sink, &running).unwrap();
        assert_eq!(stats, StreamStats { processed: 2, skipped: 1 });
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[1].timestamp_us, Some(2));
    }

    #[test]
    fn cleared_flag_stops_before_reading() {
        let mut driver = FrameDriver::new(IterSource::new(frames(), (4, 4)), pipeline(), ErrorPolicy::Halt);
        let mut sink = NullOutput::new();
        let running = AtomicBool::new(false);

        let stats = driver.run(&mut sink, &running).unwrap();
        assert_eq!(stats, StreamStats::default());
        assert_eq!(sink.frames(), 0);
    }

    #[test]
    fn sink_errors_end_the_stream() {
        let mut driver = FrameDriver::new(IterSource::new(frames(), (4, 4)), pipeline(), ErrorPolicy::Skip);
        assert!(driver.step(&mut FailingSink).is_err());
        assert_eq!(driver.stats().processed, 0);
    }

    #[test]
    fn empty_source_is_exhausted_immediately() {
        let mut driver = FrameDriver::new(
            IterSource::new(Vec::<VideoFrame>::new(), (0, 0)),
            Pipeline::new(),
            ErrorPolicy::Halt,
        );
        assert_eq!(driver.step(&mut NullOutput::new()).unwrap(), Step::Exhausted);
    }
}
