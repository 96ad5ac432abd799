//! Rendering and plate shading configuration.

use crate::error::ConfigError;

/// Number of plate modes uploaded to the shader each frame (fixed)
pub const NUM_MODES: usize = 32;

/// Width of the bright band around zero displacement
/// (brightness 1.0 at |z| = 0, 0.0 at |z| >= NODAL_BAND)
pub const NODAL_BAND: f32 = 0.02;

/// Spatial frequencies cycle through 1..=8 along each plate axis
pub const PLATE_FREQUENCY_CYCLE: u32 = 8;

/// Window configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Window title
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 800,
            title: "Chladni Circular - Real Time".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::InvalidWindowSize {
                width: self.window_width,
                height: self.window_height,
            });
        }
        Ok(())
    }
}

/// Plate shading parameters shared by the GPU shader and the CPU reference
#[derive(Debug, Clone, Copy)]
pub struct ShadingParams {
    /// "Sand accumulation" falloff width
    pub nodal_band: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            nodal_band: NODAL_BAND,
        }
    }
}

impl ShadingParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodal_band.is_nan() || self.nodal_band <= 0.0 {
            return Err(ConfigError::InvalidNodalBand(self.nodal_band));
        }
        Ok(())
    }
}
