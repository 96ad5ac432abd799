//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (Hz, samples, pixels)
//! - Documented ranges and meanings
//! - Validation before any device is opened

mod audio;
mod render;

// Re-export all types
pub use audio::{CaptureConfig, NORMALIZATION_EPSILON};
pub use render::{RenderConfig, ShadingParams, NODAL_BAND, NUM_MODES, PLATE_FREQUENCY_CYCLE};
