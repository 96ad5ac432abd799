//! Magnitude spectrum and peak normalization of audio frames.

use rustfft::{num_complex::Complex, Fft, FftPlanner, Length};
use std::sync::Arc;

use super::frame::AudioFrame;
use crate::params::NORMALIZATION_EPSILON;

/// Raw real-FFT magnitudes (N/2 + 1 bins, all >= 0)
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrame {
    magnitudes: Vec<f32>,
}

impl SpectralFrame {
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Scale so the loudest bin is ≈1.0 (silence stays all-zero)
    pub fn normalize(self) -> NormalizedSpectrum {
        let peak = self.magnitudes.iter().copied().fold(0.0f32, f32::max);
        let scale = 1.0 / (peak + NORMALIZATION_EPSILON);

        let mut bins = self.magnitudes;
        for value in &mut bins {
            *value *= scale;
        }
        NormalizedSpectrum { bins }
    }
}

/// Spectrum scaled into [0, 1], lowest frequency first
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSpectrum {
    bins: Vec<f32>,
}

impl NormalizedSpectrum {
    /// Wrap already-normalized values (clamped into [0, 1], NaN mapped to 0)
    pub fn from_bins(bins: Vec<f32>) -> Self {
        let bins = bins
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) })
            .collect();
        Self { bins }
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Index of the loudest bin (first one on ties), None if empty
    pub fn peak_bin(&self) -> Option<usize> {
        self.bins
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| i)
    }
}

/// Computes normalized magnitude spectra; holds only the FFT plan and scratch
pub struct SpectralAnalyzer {
    planner: FftPlanner<f32>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl SpectralAnalyzer {
    /// Create an analyzer planned for frames of `chunk_size` samples
    pub fn new(chunk_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(chunk_size);
        Self {
            planner,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); chunk_size],
        }
    }

    /// Magnitude spectrum of `frame`, normalized to its peak
    pub fn analyze(&mut self, frame: &AudioFrame) -> NormalizedSpectrum {
        self.magnitude_spectrum(frame.samples()).normalize()
    }

    /// |X[k]| for k in 0..=N/2 of the real-valued input
    pub fn magnitude_spectrum(&mut self, samples: &[f32]) -> SpectralFrame {
        let n = samples.len();
        if n == 0 {
            return SpectralFrame {
                magnitudes: Vec::new(),
            };
        }
        if self.fft.len() != n {
            self.fft = self.planner.plan_fft_forward(n);
        }

        // Device glitches: non-finite samples count as silence,
        // out-of-range ones are clipped to full scale
        self.buffer.clear();
        self.buffer.extend(samples.iter().map(|&s| {
            let s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
            Complex::new(s, 0.0)
        }));

        self.fft.process(&mut self.buffer);

        let magnitudes = self.buffer[..n / 2 + 1]
            .iter()
            .map(|c| c.norm())
            .collect();
        SpectralFrame { magnitudes }
    }
}
