//! Chladni - Live microphone input shown as a vibrating circular plate
//!
//! Sound excites plate modes; sand gathers where the plate stands still.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use chladni::audio::{CaptureService, ModeSource};
use chladni::cli::Args;
use chladni::params::{CaptureConfig, RenderConfig, ShadingParams, NUM_MODES};
use chladni::plate;
use chladni::rendering::PlateRenderer;

/// How often capture diagnostics are logged while running
const DIAGNOSTICS_INTERVAL: Duration = Duration::from_secs(5);

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    renderer: Option<PlateRenderer>,

    // Audio pipeline
    capture: Option<CaptureService>,
    source: ModeSource,

    // Configuration
    render_config: RenderConfig,
    shading: ShadingParams,

    last_report: Instant,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(
        capture: CaptureService,
        source: ModeSource,
        render_config: RenderConfig,
        shading: ShadingParams,
    ) -> Self {
        Self {
            window: None,
            renderer: None,
            capture: Some(capture),
            source,
            render_config,
            shading,
            last_report: Instant::now(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.fatal = Some(error);
        event_loop.exit();
    }

    /// Pull the latest frame through the pipeline and draw it
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let modes = self.source.current_modes();
        renderer.update_modes(&modes);

        if let Err(e) = renderer.render() {
            self.fail(event_loop, anyhow::Error::new(e).context("Render failed"));
            return;
        }

        if self.last_report.elapsed() >= DIAGNOSTICS_INTERVAL {
            if let Some(capture) = &self.capture {
                log::debug!("Capture: {}", capture.diagnostics());
            }
            self.last_report = Instant::now();
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("Failed to create window"));
                return;
            }
        };

        let renderer = match pollster::block_on(PlateRenderer::new(
            Arc::clone(&window),
            self.shading,
        )) {
            Ok(renderer) => renderer,
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("Failed to initialize renderer"));
                return;
            }
        };

        log::info!("Chladni is running, press ESC to quit");

        self.window = Some(window);
        self.renderer = Some(renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Stop callbacks before the frame buffer goes away with the rest of App
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
    }
}

/// Headless mode: capture briefly, shade one frame on the CPU, save a PNG
fn run_snapshot(
    args: &Args,
    capture: CaptureService,
    mut source: ModeSource,
    shading: &ShadingParams,
) -> Result<()> {
    std::thread::sleep(args.snapshot_delay());

    let modes = source.current_modes();
    log::info!("Snapshot after {} frames", source.frames_published());
    capture.stop();

    let Some(path) = args.snapshot.as_ref() else {
        return Ok(());
    };
    let image = plate::rasterize(&modes, args.snapshot_size, args.snapshot_size, shading);
    image
        .save(path)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    let capture_config = CaptureConfig::default();
    let render_config = args.render_config();
    let shading = args.shading_params();
    render_config.validate()?;
    shading.validate()?;

    // Device errors are fatal before the render loop starts
    let (capture, reader) =
        CaptureService::start(&capture_config).context("Failed to start audio capture")?;
    let source = ModeSource::new(reader, capture_config.chunk_size);

    let analysis = CaptureConfig {
        sample_rate_hz: capture.format().sample_rate_hz,
        ..capture_config
    };
    log::info!(
        "Frames of {} samples (~{:.1} ms), {} spectrum bins, modes cover 0-{:.0}Hz",
        analysis.chunk_size,
        analysis.chunk_duration().as_secs_f64() * 1000.0,
        analysis.spectrum_len(),
        analysis.bin_frequency_hz(NUM_MODES - 1)
    );

    if args.snapshot.is_some() {
        return run_snapshot(&args, capture, source, &shading);
    }

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(capture, source, render_config, shading);
    event_loop.run_app(&mut app)?;

    // In case the loop ended without calling `exiting`
    if let Some(capture) = app.capture.take() {
        capture.stop();
    }

    match app.fatal.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
