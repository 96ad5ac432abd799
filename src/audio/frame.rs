//! Fixed-length mono audio frames.

/// How an incoming chunk was fitted to the configured frame length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFit {
    Exact,
    /// Chunk was short; trailing samples zero-filled
    Padded,
    /// Chunk was long; extra samples dropped
    Truncated,
}

/// Copy `src` into `dst`, zero-padding or truncating to `dst.len()`.
///
/// Never allocates; safe to call from the audio callback.
pub fn fit_into(dst: &mut [f32], src: &[f32]) -> FrameFit {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    dst[n..].fill(0.0);

    match src.len().cmp(&dst.len()) {
        std::cmp::Ordering::Equal => FrameFit::Exact,
        std::cmp::Ordering::Less => FrameFit::Padded,
        std::cmp::Ordering::Greater => FrameFit::Truncated,
    }
}

/// One chunk of mono samples, always exactly `len()` == chunk size
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Box<[f32]>,
    sample_rate_hz: u32,
}

impl AudioFrame {
    /// Zero-filled frame (startup state)
    pub fn silent(chunk_size: usize, sample_rate_hz: u32) -> Self {
        Self {
            samples: vec![0.0; chunk_size].into_boxed_slice(),
            sample_rate_hz,
        }
    }

    /// Build a frame of exactly `chunk_size` samples from arbitrary-length input
    pub fn from_samples(samples: &[f32], chunk_size: usize, sample_rate_hz: u32) -> Self {
        let mut frame = Self::silent(chunk_size, sample_rate_hz);
        fit_into(&mut frame.samples, samples);
        frame
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_chunk_is_zero_padded() {
        let frame = AudioFrame::from_samples(&[0.5, -0.5, 0.25], 8, 44100);

        assert_eq!(frame.len(), 8);
        assert_eq!(&frame.samples()[..3], &[0.5, -0.5, 0.25]);
        assert!(frame.samples()[3..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_long_chunk_is_truncated() {
        let input: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let frame = AudioFrame::from_samples(&input, 8, 44100);

        assert_eq!(frame.samples(), &input[..8]);
    }

    #[test]
    fn test_fit_reports_mismatch() {
        let mut dst = [1.0; 4];

        assert_eq!(fit_into(&mut dst, &[0.0; 4]), FrameFit::Exact);
        assert_eq!(fit_into(&mut dst, &[0.3; 2]), FrameFit::Padded);
        assert_eq!(dst, [0.3, 0.3, 0.0, 0.0]);
        assert_eq!(fit_into(&mut dst, &[0.7; 6]), FrameFit::Truncated);
        assert_eq!(dst, [0.7; 4]);
    }

    #[test]
    fn test_empty_chunk_gives_silence() {
        let frame = AudioFrame::from_samples(&[], 16, 48000);
        assert_eq!(frame, AudioFrame::silent(16, 48000));
        assert_eq!(frame.sample_rate_hz(), 48000);
    }
}
