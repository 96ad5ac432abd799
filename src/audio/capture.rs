//! Microphone capture: cpal input stream feeding the frame buffer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::buffer::{self, FrameReader, FrameWriter};
use super::frame::FrameFit;
use crate::error::CaptureError;
use crate::params::CaptureConfig;

/// Per-chunk stream status as seen by the data callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Clean,
    /// The backend reported an overflow/underflow since the previous chunk
    Xrun,
}

/// Lock-free counters shared between the audio thread and the application
#[derive(Debug, Default)]
pub struct CaptureDiagnostics {
    chunks: AtomicU64,
    short_chunks: AtomicU64,
    long_chunks: AtomicU64,
    xrun_chunks: AtomicU64,
    stream_errors: AtomicU64,
    pending_xrun: AtomicBool,
}

impl CaptureDiagnostics {
    /// Called from the stream error callback
    pub fn report_stream_error(&self) {
        self.stream_errors.fetch_add(1, Ordering::Relaxed);
        self.pending_xrun.store(true, Ordering::Release);
    }

    /// Status for the next chunk (consumes any pending error report)
    pub fn take_status(&self) -> ChunkStatus {
        if self.pending_xrun.swap(false, Ordering::Acquire) {
            ChunkStatus::Xrun
        } else {
            ChunkStatus::Clean
        }
    }

    fn record(&self, fit: FrameFit, status: ChunkStatus) {
        self.chunks.fetch_add(1, Ordering::Relaxed);
        match fit {
            FrameFit::Exact => {}
            FrameFit::Padded => {
                self.short_chunks.fetch_add(1, Ordering::Relaxed);
            }
            FrameFit::Truncated => {
                self.long_chunks.fetch_add(1, Ordering::Relaxed);
            }
        }
        if status == ChunkStatus::Xrun {
            self.xrun_chunks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            chunks: self.chunks.load(Ordering::Relaxed),
            short_chunks: self.short_chunks.load(Ordering::Relaxed),
            long_chunks: self.long_chunks.load(Ordering::Relaxed),
            xrun_chunks: self.xrun_chunks.load(Ordering::Relaxed),
            stream_errors: self.stream_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the capture counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub chunks: u64,
    pub short_chunks: u64,
    pub long_chunks: u64,
    pub xrun_chunks: u64,
    pub stream_errors: u64,
}

impl fmt::Display for DiagnosticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunks ({} short, {} long, {} after xrun), {} stream errors",
            self.chunks, self.short_chunks, self.long_chunks, self.xrun_chunks, self.stream_errors
        )
    }
}

/// State owned by the audio callback: the buffer writer and a preallocated scratch.
///
/// `process` never allocates, blocks or fails.
pub struct CaptureHandler {
    writer: FrameWriter,
    diagnostics: Arc<CaptureDiagnostics>,
    scratch: Vec<f32>,
    chunk_size: usize,
    channels: usize,
}

impl CaptureHandler {
    pub fn new(writer: FrameWriter, diagnostics: Arc<CaptureDiagnostics>, channels: u16) -> Self {
        let chunk_size = writer.chunk_size();
        Self {
            writer,
            diagnostics,
            scratch: Vec::with_capacity(chunk_size),
            chunk_size,
            channels: usize::from(channels.max(1)),
        }
    }

    /// Handle one interleaved chunk: keep channel 0, fit to the chunk size, publish.
    pub fn process<T>(&mut self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        let status = self.diagnostics.take_status();
        let chunk_size = self.chunk_size;
        let frames = data.len() / self.channels;

        self.scratch.clear();
        self.scratch.extend(
            data.iter()
                .step_by(self.channels)
                .take(frames.min(chunk_size))
                .map(|&s| f32::from_sample(s)),
        );
        self.writer.publish(&self.scratch);

        let fit = match frames.cmp(&chunk_size) {
            std::cmp::Ordering::Equal => FrameFit::Exact,
            std::cmp::Ordering::Less => FrameFit::Padded,
            std::cmp::Ordering::Greater => FrameFit::Truncated,
        };
        self.diagnostics.record(fit, status);
    }
}

/// Stream parameters actually granted by the device
#[derive(Debug, Clone)]
pub struct NegotiatedFormat {
    pub device_name: String,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub buffer_size: cpal::BufferSize,
    pub sample_format: cpal::SampleFormat,
}

/// Running microphone stream (stopped on `stop` or drop)
pub struct CaptureService {
    stream: Option<cpal::Stream>,
    diagnostics: Arc<CaptureDiagnostics>,
    format: NegotiatedFormat,
}

impl CaptureService {
    /// Open the default input device and start publishing frames.
    ///
    /// Returns the read side of a frame slot labeled with the negotiated rate.
    pub fn start(config: &CaptureConfig) -> Result<(Self, FrameReader), CaptureError> {
        config.validate()?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let (stream_config, sample_format) = negotiate(&device, config)?;
        let format = NegotiatedFormat {
            device_name,
            sample_rate_hz: stream_config.sample_rate.0,
            channels: stream_config.channels,
            buffer_size: stream_config.buffer_size.clone(),
            sample_format,
        };

        log::info!(
            "Audio input: {} @ {}Hz, {} channel(s), buffer {:?}, {:?}",
            format.device_name,
            format.sample_rate_hz,
            format.channels,
            format.buffer_size,
            format.sample_format
        );
        if format.sample_rate_hz != config.sample_rate_hz {
            log::warn!(
                "Requested {}Hz, device runs at {}Hz",
                config.sample_rate_hz,
                format.sample_rate_hz
            );
        }

        let (writer, reader) = open_channel(config, &format);
        let diagnostics = Arc::new(CaptureDiagnostics::default());
        let handler = CaptureHandler::new(writer, Arc::clone(&diagnostics), format.channels);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, handler, &diagnostics)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, handler, &diagnostics)?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, handler, &diagnostics)?
            }
            other => return Err(CaptureError::UnsupportedFormat(other)),
        };

        stream.play()?;

        Ok((
            Self {
                stream: Some(stream),
                diagnostics,
                format,
            },
            reader,
        ))
    }

    pub fn format(&self) -> &NegotiatedFormat {
        &self.format
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Stop callbacks, then release the stream and the buffer writer it owns
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        if let Err(e) = stream.pause() {
            log::warn!("Failed to pause input stream: {}", e);
        }
        // Dropping the stream waits for any in-flight callback
        drop(stream);
        log::info!("Audio capture stopped: {}", self.diagnostics.snapshot());
    }
}

impl Drop for CaptureService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Frame slot sized to the configured chunk, labeled with the device's actual rate
fn open_channel(config: &CaptureConfig, format: &NegotiatedFormat) -> (FrameWriter, FrameReader) {
    buffer::channel(config.chunk_size, format.sample_rate_hz)
}

/// Prefer mono f32 at the configured rate and chunk size; otherwise use the
/// device default and keep channel 0.
fn negotiate(
    device: &cpal::Device,
    config: &CaptureConfig,
) -> Result<(cpal::StreamConfig, cpal::SampleFormat), CaptureError> {
    let wanted_rate = cpal::SampleRate(config.sample_rate_hz);
    let chunk = config.chunk_size as u32;

    let mono = device.supported_input_configs().ok().and_then(|mut ranges| {
        ranges.find(|r| {
            r.channels() == 1
                && r.sample_format() == cpal::SampleFormat::F32
                && r.min_sample_rate() <= wanted_rate
                && wanted_rate <= r.max_sample_rate()
        })
    });

    if let Some(range) = mono {
        let buffer_size = match range.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&chunk) => {
                cpal::BufferSize::Fixed(chunk)
            }
            _ => cpal::BufferSize::Default,
        };
        let stream_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: wanted_rate,
            buffer_size,
        };
        return Ok((stream_config, cpal::SampleFormat::F32));
    }

    log::warn!("Device has no mono f32 input at {}Hz, using its default config", config.sample_rate_hz);
    let default = device.default_input_config()?;
    Ok((default.config(), default.sample_format()))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut handler: CaptureHandler,
    diagnostics: &Arc<CaptureDiagnostics>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let error_diagnostics = Arc::clone(diagnostics);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| handler.process(data),
        move |err| {
            error_diagnostics.report_stream_error();
            log::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_at(sample_rate_hz: u32) -> NegotiatedFormat {
        NegotiatedFormat {
            device_name: "Test".to_string(),
            sample_rate_hz,
            channels: 2,
            buffer_size: cpal::BufferSize::Default,
            sample_format: cpal::SampleFormat::F32,
        }
    }

    #[test]
    fn test_handler_publishes_exact_chunk() {
        let (writer, mut reader) = buffer::channel(4, 44100);
        let diagnostics = Arc::new(CaptureDiagnostics::default());
        let mut handler = CaptureHandler::new(writer, Arc::clone(&diagnostics), 1);

        handler.process(&[0.1f32, 0.2, 0.3, 0.4]);

        assert_eq!(reader.snapshot().samples(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(
            diagnostics.snapshot(),
            DiagnosticsSnapshot {
                chunks: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_handler_counts_length_mismatch() {
        let (writer, mut reader) = buffer::channel(4, 44100);
        let diagnostics = Arc::new(CaptureDiagnostics::default());
        let mut handler = CaptureHandler::new(writer, Arc::clone(&diagnostics), 1);

        handler.process(&[0.5f32, 0.5]);
        assert_eq!(reader.snapshot().samples(), &[0.5, 0.5, 0.0, 0.0]);

        handler.process(&[0.25f32; 6]);
        assert_eq!(reader.snapshot().samples(), &[0.25; 4]);

        let stats = diagnostics.snapshot();
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.short_chunks, 1);
        assert_eq!(stats.long_chunks, 1);
    }

    #[test]
    fn test_handler_fits_to_writer_chunk_size() {
        let (writer, mut reader) = buffer::channel(5, 44100);
        let diagnostics = Arc::new(CaptureDiagnostics::default());
        let mut handler = CaptureHandler::new(writer, Arc::clone(&diagnostics), 1);

        handler.process(&[1.0f32; 5]);
        assert_eq!(reader.snapshot().samples(), &[1.0; 5]);

        handler.process(&[2.0f32; 7]);
        assert_eq!(reader.snapshot().samples(), &[2.0; 5]);

        handler.process(&[3.0f32; 4]);
        assert_eq!(reader.snapshot().samples(), &[3.0, 3.0, 3.0, 3.0, 0.0]);

        let stats = diagnostics.snapshot();
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.long_chunks, 1);
        assert_eq!(stats.short_chunks, 1);
    }

    #[test]
    fn test_channel_uses_negotiated_rate() {
        let config = CaptureConfig::default();
        let (mut writer, mut reader) = open_channel(&config, &format_at(48000));

        assert_eq!(writer.chunk_size(), config.chunk_size);
        let frame = reader.snapshot();
        assert_eq!(frame.sample_rate_hz(), 48000);
        assert_eq!(frame.len(), config.chunk_size);

        writer.publish(&[0.5; 16]);
        assert_eq!(reader.snapshot().sample_rate_hz(), 48000);
    }

    #[test]
    fn test_handler_keeps_first_channel() {
        let (writer, mut reader) = buffer::channel(3, 48000);
        let diagnostics = Arc::new(CaptureDiagnostics::default());
        let mut handler = CaptureHandler::new(writer, Arc::clone(&diagnostics), 2);

        // Interleaved L/R
        handler.process(&[0.1f32, -1.0, 0.2, -1.0, 0.3, -1.0]);

        assert_eq!(reader.snapshot().samples(), &[0.1, 0.2, 0.3]);
        assert_eq!(diagnostics.snapshot().short_chunks, 0);
    }

    #[test]
    fn test_handler_converts_integer_samples() {
        let (writer, mut reader) = buffer::channel(2, 44100);
        let diagnostics = Arc::new(CaptureDiagnostics::default());
        let mut handler = CaptureHandler::new(writer, diagnostics, 1);

        handler.process(&[0i16, i16::MIN]);

        let frame = reader.snapshot();
        assert_eq!(frame.samples()[0], 0.0);
        assert!((frame.samples()[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stream_error_marks_next_chunk_only() {
        let (writer, _reader) = buffer::channel(2, 44100);
        let diagnostics = Arc::new(CaptureDiagnostics::default());
        let mut handler = CaptureHandler::new(writer, Arc::clone(&diagnostics), 1);

        diagnostics.report_stream_error();
        handler.process(&[0.0f32; 2]);
        handler.process(&[0.0f32; 2]);

        let stats = diagnostics.snapshot();
        assert_eq!(stats.stream_errors, 1);
        assert_eq!(stats.xrun_chunks, 1);
        assert_eq!(stats.chunks, 2);
    }

    #[test]
    fn test_diagnostics_display() {
        let stats = DiagnosticsSnapshot {
            chunks: 10,
            short_chunks: 1,
            long_chunks: 2,
            xrun_chunks: 3,
            stream_errors: 4,
        };
        assert_eq!(
            stats.to_string(),
            "10 chunks (1 short, 2 long, 3 after xrun), 4 stream errors"
        );
    }
}
