//! Microphone capture and spectral analysis.
//!
//! The capture callback publishes fixed-length frames into a latest-wins
//! slot; the render loop pulls the newest frame each tick and turns it
//! into plate mode amplitudes.

pub mod buffer;
mod capture;
mod frame;
mod modes;
mod spectrum;

// Re-export public types
pub use buffer::{FrameReader, FrameWriter};
pub use capture::{
    CaptureDiagnostics, CaptureHandler, CaptureService, ChunkStatus, DiagnosticsSnapshot,
    NegotiatedFormat,
};
pub use frame::{fit_into, AudioFrame, FrameFit};
pub use modes::{map_modes, ModeSource, ModeVector};
pub use spectrum::{NormalizedSpectrum, SpectralAnalyzer, SpectralFrame};
