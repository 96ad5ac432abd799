//! Error types for configuration, audio capture and rendering.

use thiserror::Error;

/// Invalid parameter values, caught before any device is opened
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be > 0")]
    ZeroSampleRate,

    #[error("chunk size must be a power of 2 and at least 2, got {0}")]
    InvalidChunkSize(usize),

    #[error("window size must be non-zero, got {width}x{height}")]
    InvalidWindowSize { width: u32, height: u32 },

    #[error("nodal band must be positive, got {0}")]
    InvalidNodalBand(f32),
}

/// Device errors while opening or starting the input stream (fatal at startup)
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid capture config: {0}")]
    Config(#[from] ConfigError),

    #[error("no audio input device found")]
    NoInputDevice,

    #[error("failed to query input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported input sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

/// Graphics errors reported to the application layer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
