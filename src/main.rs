//! Framepipe: real-time video filter pipeline CLI.

use anyhow::Result;
use clap::Parser;
use framepipe::capture::{open_source, CameraSource, FrameSource};
use framepipe::config::{Config, OutputMode, SourceConfig};
use framepipe::driver::{ErrorPolicy, FrameDriver, Step};
use framepipe::output::{ImageSequenceOutput, NullOutput, OutputBackend, WindowRenderer};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Real-time video filter pipeline.
///
/// Frames go through grayscale, mirror, resize and blur, in that order.
#[derive(Parser, Debug)]
#[command(name = "framepipe")]
#[command(about = "Apply a fixed filter chain to webcam or video frames in real-time")]
struct Args {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index or video file path
    #[arg(short, long)]
    input: Option<String>,

    /// Resize target width
    #[arg(long)]
    width: Option<u32>,

    /// Resize target height
    #[arg(long)]
    height: Option<u32>,

    /// Blur kernel size (odd, per axis)
    #[arg(long, num_args = 2, value_names = ["KX", "KY"])]
    blur_kernel: Option<Vec<u32>>,

    /// Output mode
    #[arg(long, value_enum)]
    output: Option<OutputMode>,

    /// Directory for image output
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Drop frames the pipeline rejects instead of stopping
    #[arg(long)]
    skip_bad_frames: bool,

    /// List available cameras and exit
    #[arg(long)]
    list_devices: bool,
}

impl Args {
    /// Loads the config file (if any) and applies command-line overrides.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(input) = &self.input {
            config.source = SourceConfig::from_input(input, &config.source);
        }
        if let Some(width) = self.width {
            config.filters.resize.width = width;
        }
        if let Some(height) = self.height {
            config.filters.resize.height = height;
        }
        if let Some(kernel) = &self.blur_kernel {
            config.filters.blur.kernel = (kernel[0], kernel[1]);
        }
        if let Some(mode) = self.output {
            config.output.mode = mode;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.skip_bad_frames {
            config.on_error = ErrorPolicy::Skip;
        }
        Ok(config)
    }
}

/// Application state for the event loop.
struct FramepipeApp {
    config: Config,
    driver: FrameDriver<Box<dyn FrameSource>>,
    window: Option<Arc<Window>>,
    renderer: Option<WindowRenderer>,
    last_frame_time: Instant,
    frame_duration: Duration,
    result: Result<()>,
}

impl FramepipeApp {
    fn new(config: Config, driver: FrameDriver<Box<dyn FrameSource>>) -> Self {
        let frame_duration = driver
            .source()
            .frame_rate()
            .map(|fps| Duration::from_secs_f64(1.0 / fps))
            .unwrap_or(Duration::ZERO);
        Self {
            config,
            driver,
            window: None,
            renderer: None,
            last_frame_time: Instant::now(),
            frame_duration,
            result: Ok(()),
        }
    }

    fn process_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        match self.driver.step(renderer) {
            Ok(Step::Displayed | Step::Skipped) => {}
            Ok(Step::Exhausted) => {
                info!("End of stream");
                event_loop.exit();
            }
            Err(e) => {
                error!("Stopping stream: {:#}", e);
                self.result = Err(e);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for FramepipeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let resize = &self.config.filters.resize;
        let window_attrs = WindowAttributes::default()
            .with_title(self.config.output.title.clone())
            .with_inner_size(PhysicalSize::new(resize.width, resize.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                self.result = Err(e.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match WindowRenderer::new(window) {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                info!("Window created successfully");
            }
            Err(e) => {
                error!("Failed to create renderer: {}", e);
                self.result = Err(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let quit = match &event.logical_key {
                    Key::Character(c) => c.as_str().eq_ignore_ascii_case("q"),
                    Key::Named(NamedKey::Escape) => true,
                    _ => false,
                };
                if quit {
                    info!("Quit requested");
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if now.duration_since(self.last_frame_time) >= self.frame_duration {
                    self.process_frame(event_loop);
                    self.last_frame_time = now;
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // List devices mode
    if args.list_devices {
        println!("Available cameras:");
        match CameraSource::list_devices() {
            Ok(devices) => {
                for device in devices {
                    println!("  [{}] {}", device.index, device.name);
                }
            }
            Err(e) => {
                eprintln!("Failed to list devices: {}", e);
            }
        }
        return Ok(());
    }

    let config = args.resolve_config()?;

    // Invalid filter parameters fail here, before the source is touched
    let pipeline = config.build_pipeline()?;
    info!("Pipeline: {}", pipeline.filter_names().join(" -> "));

    let source = open_source(&config.source)?;
    let (w, h) = source.frame_size();
    info!("Source opened at {}x{}", w, h);

    let driver = FrameDriver::new(source, pipeline, config.on_error);

    match config.output.mode {
        OutputMode::Window => run_window_mode(config, driver),
        OutputMode::Images => {
            let mut output = ImageSequenceOutput::new(&config.output.directory)?;
            run_headless_mode(driver, &mut output)
        }
        OutputMode::None => run_headless_mode(driver, &mut NullOutput::new()),
    }
}

/// Run in window output mode (default).
fn run_window_mode(config: Config, driver: FrameDriver<Box<dyn FrameSource>>) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FramepipeApp::new(config, driver);
    event_loop.run_app(&mut app)?;

    let stats = app.driver.stats();
    info!("Displayed {} frames, skipped {}", stats.processed, stats.skipped);
    app.result
}

/// Run without a window until the stream ends or Ctrl-C.
fn run_headless_mode(
    mut driver: FrameDriver<Box<dyn FrameSource>>,
    output: &mut dyn OutputBackend,
) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal, shutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    driver.run(output, &running)?;
    Ok(())
}
