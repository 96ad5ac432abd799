//! Audio capture configuration and analysis constants.

use std::time::Duration;

use crate::error::ConfigError;

/// Guard added to the spectrum maximum before normalizing
/// (keeps silent frames at 0 instead of NaN)
pub const NORMALIZATION_EPSILON: f32 = 1e-6;

/// Microphone capture configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Input sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Samples per audio frame (must be power of 2)
    /// 1024 @ 44.1kHz ≈ 23ms per chunk
    pub chunk_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            chunk_size: 1024,
        }
    }
}

impl CaptureConfig {
    /// Wall-clock duration of one chunk at the configured rate
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_secs_f64(self.chunk_size as f64 / self.sample_rate_hz as f64)
    }

    /// Number of real-FFT bins for one frame (N/2 + 1)
    pub fn spectrum_len(&self) -> usize {
        self.chunk_size / 2 + 1
    }

    /// Center frequency of an FFT bin (Hz)
    pub fn bin_frequency_hz(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate_hz as f32 / self.chunk_size as f32
    }

    /// Validate configuration (chunk size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.chunk_size < 2 || !self.chunk_size.is_power_of_two() {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }
}
