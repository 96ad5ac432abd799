//! Mapping of spectral bins onto plate mode amplitudes.

use super::buffer::FrameReader;
use super::spectrum::{NormalizedSpectrum, SpectralAnalyzer};
use crate::params::NUM_MODES;

/// Fixed-length plate mode amplitudes, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeVector([f32; NUM_MODES]);

impl Default for ModeVector {
    fn default() -> Self {
        Self([0.0; NUM_MODES])
    }
}

impl ModeVector {
    pub fn from_amplitudes(amplitudes: [f32; NUM_MODES]) -> Self {
        Self(amplitudes)
    }

    /// Vector with a single excited mode
    pub fn single(index: usize, amplitude: f32) -> Self {
        let mut modes = Self::default();
        if let Some(slot) = modes.0.get_mut(index) {
            *slot = amplitude;
        }
        modes
    }

    pub fn amplitudes(&self) -> &[f32; NUM_MODES] {
        &self.0
    }

    pub fn is_silent(&self) -> bool {
        self.0.iter().all(|&a| a == 0.0)
    }

    /// Amplitudes packed as vec4s, in index order
    pub fn packed(&self) -> [[f32; 4]; NUM_MODES / 4] {
        let mut packed = [[0.0f32; 4]; NUM_MODES / 4];
        for (dst, src) in packed.iter_mut().zip(self.0.chunks_exact(4)) {
            dst.copy_from_slice(src);
        }
        packed
    }
}

/// Take the lowest `NUM_MODES` bins in order; missing bins stay zero.
pub fn map_modes(spectrum: &NormalizedSpectrum) -> ModeVector {
    let mut modes = ModeVector::default();
    let bins = spectrum.len().min(NUM_MODES);
    modes.0[..bins].copy_from_slice(&spectrum.bins()[..bins]);
    modes
}

/// Pull side of the pipeline: buffer snapshot → spectrum → modes.
///
/// Every call re-runs the whole chain on whatever the buffer holds now;
/// nothing is carried over between calls.
pub struct ModeSource {
    reader: FrameReader,
    analyzer: SpectralAnalyzer,
}

impl ModeSource {
    pub fn new(reader: FrameReader, chunk_size: usize) -> Self {
        Self {
            reader,
            analyzer: SpectralAnalyzer::new(chunk_size),
        }
    }

    /// Mode amplitudes for the most recent audio frame
    pub fn current_modes(&mut self) -> ModeVector {
        let frame = self.reader.snapshot();
        let spectrum = self.analyzer.analyze(&frame);
        map_modes(&spectrum)
    }

    /// Frames published by the capture side so far
    pub fn frames_published(&self) -> u64 {
        self.reader.published()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer;

    #[test]
    fn test_truncates_long_spectrum_in_order() {
        let bins: Vec<f32> = (0..513).map(|i| i as f32 / 512.0).collect();
        let modes = map_modes(&NormalizedSpectrum::from_bins(bins.clone()));

        assert_eq!(modes.amplitudes().len(), NUM_MODES);
        assert_eq!(&modes.amplitudes()[..], &bins[..NUM_MODES]);
    }

    #[test]
    fn test_pads_short_spectrum_with_zeros() {
        let modes = map_modes(&NormalizedSpectrum::from_bins(vec![0.9, 0.4, 0.1]));

        assert_eq!(&modes.amplitudes()[..3], &[0.9, 0.4, 0.1]);
        assert!(modes.amplitudes()[3..].iter().all(|&a| a == 0.0));
    }

    #[test]
    fn test_empty_spectrum_gives_silent_modes() {
        let modes = map_modes(&NormalizedSpectrum::from_bins(Vec::new()));
        assert!(modes.is_silent());
    }

    #[test]
    fn test_vec4_packing() {
        let mut amplitudes = [0.0; NUM_MODES];
        for (i, a) in amplitudes.iter_mut().enumerate() {
            *a = i as f32;
        }
        let packed = ModeVector::from_amplitudes(amplitudes).packed();

        assert_eq!(packed.len(), 8);
        assert_eq!(packed[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(packed[7], [28.0, 29.0, 30.0, 31.0]);
    }

    #[test]
    fn test_single_ignores_out_of_range() {
        assert_eq!(ModeVector::single(5, 1.0).amplitudes()[5], 1.0);
        assert!(ModeVector::single(NUM_MODES, 1.0).is_silent());
    }

    #[test]
    fn test_source_follows_latest_frame() {
        let (mut writer, reader) = buffer::channel(64, 44100);
        let mut source = ModeSource::new(reader, 64);

        assert!(source.current_modes().is_silent());

        writer.publish(&[1.0; 64]);
        let modes = source.current_modes();
        assert!((modes.amplitudes()[0] - 1.0).abs() < 1e-4);
        assert!(modes.amplitudes()[1..].iter().all(|&a| a < 1e-4));
        assert_eq!(source.frames_published(), 1);

        writer.publish(&[0.0; 64]);
        assert!(source.current_modes().is_silent());
    }
}
