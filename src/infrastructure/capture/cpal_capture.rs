//! Cross-platform audio capture using cpal
//!
//! Delivers mono i16 chunks at 16 kHz regardless of what the device
//! produces: stereo is mixed down in the stream callback and non-16k rates
//! are resampled on the capture thread.
//!
//! cpal streams are not Send, so each acquired source runs on its own
//! dedicated thread; the stream guard flips a stop flag that ends it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::{broadcast, oneshot};

use crate::application::ports::{
    AudioCapture, AudioChunk, CaptureError, DeviceInfo, SourceStream, StreamGuard,
    CAPTURE_SAMPLE_RATE,
};
use crate::domain::recording::Duration;

/// Fan-out capacity in chunks (~3 minutes at the default 3s granularity)
const CHUNK_BUFFER: usize = 64;

/// Resampler input block size
const RESAMPLER_CHUNK: usize = 1024;

/// How often the capture thread drains the callback buffer
const DRAIN_INTERVAL_MS: u64 = 50;

/// cpal-backed capture adapter
pub struct CpalCapture;

impl CpalCapture {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::EnumerationFailed(e.to_string()))?;

        Ok(devices
            .enumerate()
            .map(|(index, device)| DeviceInfo {
                index,
                name: device.name().unwrap_or_else(|_| format!("Input {}", index)),
            })
            .collect())
    }

    async fn acquire_mic(&self, chunk: Duration) -> Result<SourceStream, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;
        open_stream(device, chunk).await
    }

    async fn acquire_device(
        &self,
        index: usize,
        chunk: Duration,
    ) -> Result<SourceStream, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .input_devices()
            .map_err(|e| CaptureError::EnumerationFailed(e.to_string()))?
            .nth(index)
            .ok_or(CaptureError::UnknownDevice(index))?;
        open_stream(device, chunk).await
    }
}

/// Spin up the capture thread for one device and wait until its stream is
/// actually playing before handing out the source.
async fn open_stream(device: cpal::Device, chunk: Duration) -> Result<SourceStream, CaptureError> {
    let (fanout, _) = broadcast::channel(CHUNK_BUFFER);
    let stop = Arc::new(AtomicBool::new(false));
    let (ready_tx, ready_rx) = oneshot::channel();

    let thread_fanout = fanout.clone();
    let thread_stop = Arc::clone(&stop);
    let chunk_ms = chunk.as_millis();
    std::thread::spawn(move || {
        capture_thread(device, chunk_ms, thread_fanout, thread_stop, ready_tx);
    });

    match ready_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => return Err(error),
        Err(_) => {
            return Err(CaptureError::StreamFailed(
                "capture thread exited before starting".to_string(),
            ))
        }
    }

    let guard = StreamGuard::new(move || stop.store(true, Ordering::SeqCst));
    Ok(SourceStream::new(fanout, guard))
}

/// Owns the cpal stream for its whole lifetime; drains the callback buffer
/// on a short cadence and fans finished chunks out to subscribers.
fn capture_thread(
    device: cpal::Device,
    chunk_ms: u64,
    fanout: broadcast::Sender<AudioChunk>,
    stop: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<(), CaptureError>>,
) {
    let (config, sample_format) = match pick_input_config(&device) {
        Ok(picked) => picked,
        Err(error) => {
            let _ = ready.send(Err(error));
            return;
        }
    };
    let device_rate = config.sample_rate.0;
    let channels = config.channels;

    let raw: Arc<StdMutex<Vec<i16>>> = Arc::new(StdMutex::new(Vec::new()));

    let stream = match build_stream(&device, &config, sample_format, channels, Arc::clone(&raw)) {
        Ok(stream) => stream,
        Err(error) => {
            let _ = ready.send(Err(error));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(CaptureError::StreamFailed(e.to_string())));
        return;
    }

    let chunk_samples = (CAPTURE_SAMPLE_RATE as u64 * chunk_ms / 1000).max(1) as usize;
    let mut chunker = match Chunker::new(device_rate, chunk_samples) {
        Ok(chunker) => chunker,
        Err(error) => {
            let _ = ready.send(Err(error));
            return;
        }
    };

    let _ = ready.send(Ok(()));
    tracing::debug!(device_rate, channels, "capture stream started");

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(DRAIN_INTERVAL_MS));
        let drained: Vec<i16> = {
            let mut buffer = raw.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *buffer)
        };
        for chunk in chunker.feed(&drained) {
            let _ = fanout.send(chunk);
        }
    }

    drop(stream);
    for chunk in chunker.flush() {
        let _ = fanout.send(chunk);
    }
    tracing::debug!("capture stream released");
}

/// Build the input stream for the picked sample format, mixing to mono in
/// the callback.
fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    channels: u16,
    raw: Arc<StdMutex<Vec<i16>>>,
) -> Result<cpal::Stream, CaptureError> {
    let err_fn = |err| tracing::warn!("audio stream error: {}", err);

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mono = mix_to_mono(data, channels);
                    if let Ok(mut buffer) = raw.lock() {
                        buffer.extend_from_slice(&mono);
                    }
                },
                err_fn,
                None,
            )
            .map_err(map_build_error)?,

        SampleFormat::F32 => device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let i16_data: Vec<i16> = data.iter().map(|&s| (s * 32767.0) as i16).collect();
                    let mono = mix_to_mono(&i16_data, channels);
                    if let Ok(mut buffer) = raw.lock() {
                        buffer.extend_from_slice(&mono);
                    }
                },
                err_fn,
                None,
            )
            .map_err(map_build_error)?,

        _ => {
            return Err(CaptureError::StreamFailed(
                "unsupported sample format".to_string(),
            ))
        }
    };

    Ok(stream)
}

/// Pick an input configuration: i16/f32 only, preferring mono and a range
/// that includes 16 kHz.
fn pick_input_config(
    device: &cpal::Device,
) -> Result<(StreamConfig, SampleFormat), CaptureError> {
    let supported_configs = device
        .supported_input_configs()
        .map_err(|e| CaptureError::StreamFailed(format!("Failed to get configs: {}", e)))?;

    let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

    for config in supported_configs {
        if config.sample_format() != SampleFormat::I16
            && config.sample_format() != SampleFormat::F32
        {
            continue;
        }

        let includes_target = config.min_sample_rate().0 <= CAPTURE_SAMPLE_RATE
            && config.max_sample_rate().0 >= CAPTURE_SAMPLE_RATE;

        let is_better = match &best_config {
            None => true,
            Some(current) => {
                let fewer_channels = config.channels() < current.channels();
                let better_rate =
                    includes_target && current.min_sample_rate().0 > CAPTURE_SAMPLE_RATE;
                fewer_channels || better_rate
            }
        };
        if is_better {
            best_config = Some(config);
        }
    }

    let config_range = best_config.ok_or(CaptureError::StreamFailed(
        "No suitable input config found".to_string(),
    ))?;

    let sample_rate = if config_range.min_sample_rate().0 <= CAPTURE_SAMPLE_RATE
        && config_range.max_sample_rate().0 >= CAPTURE_SAMPLE_RATE
    {
        SampleRate(CAPTURE_SAMPLE_RATE)
    } else {
        config_range.min_sample_rate()
    };

    let sample_format = config_range.sample_format();
    let config = StreamConfig {
        channels: config_range.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    Ok((config, sample_format))
}

fn map_build_error(error: cpal::BuildStreamError) -> CaptureError {
    let text = error.to_string();
    if text.to_lowercase().contains("denied") || text.to_lowercase().contains("permission") {
        CaptureError::PermissionDenied(text)
    } else {
        CaptureError::StreamFailed(text)
    }
}

/// Mix interleaved frames down to mono
fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Stateful resample-and-slice pipeline: device-rate mono in, fixed-length
/// 16 kHz chunks out.
struct Chunker {
    resampler: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
    out: Vec<i16>,
    chunk_samples: usize,
}

impl Chunker {
    fn new(device_rate: u32, chunk_samples: usize) -> Result<Self, CaptureError> {
        let resampler = if device_rate == CAPTURE_SAMPLE_RATE {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(
                    device_rate as usize,
                    CAPTURE_SAMPLE_RATE as usize,
                    RESAMPLER_CHUNK,
                    2,
                    1,
                )
                .map_err(|e| {
                    CaptureError::StreamFailed(format!("Resampler init failed: {}", e))
                })?,
            )
        };

        Ok(Self {
            resampler,
            pending: Vec::new(),
            out: Vec::new(),
            chunk_samples,
        })
    }

    /// Absorb device-rate samples and emit every completed chunk
    fn feed(&mut self, samples: &[i16]) -> Vec<AudioChunk> {
        if self.resampler.is_none() {
            self.out.extend_from_slice(samples);
        } else {
            self.pending
                .extend(samples.iter().map(|&s| s as f32 / 32768.0));
            self.resample_pending(false);
        }
        self.emit_complete()
    }

    /// Emit whatever remains once the stream has stopped
    fn flush(&mut self) -> Vec<AudioChunk> {
        self.resample_pending(true);
        let mut chunks = self.emit_complete();
        if !self.out.is_empty() {
            chunks.push(AudioChunk::from_samples(std::mem::take(&mut self.out)));
        }
        chunks
    }

    fn resample_pending(&mut self, pad_tail: bool) {
        let Self {
            resampler,
            pending,
            out,
            ..
        } = self;
        let Some(resampler) = resampler.as_mut() else {
            return;
        };

        loop {
            let frames_needed = resampler.input_frames_next();
            if pending.len() < frames_needed {
                if !pad_tail || pending.is_empty() {
                    break;
                }
                pending.resize(frames_needed, 0.0);
            }

            let frame: Vec<Vec<f32>> = vec![pending[..frames_needed].to_vec()];
            match resampler.process(&frame, None) {
                Ok(resampled) => {
                    out.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
                }
                Err(error) => {
                    tracing::warn!(%error, "resampling failed, dropping block");
                }
            }
            pending.drain(..frames_needed);
        }
    }

    fn emit_complete(&mut self) -> Vec<AudioChunk> {
        let mut chunks = Vec::new();
        while self.out.len() >= self.chunk_samples {
            let samples: Vec<i16> = self.out.drain(..self.chunk_samples).collect();
            chunks.push(AudioChunk::from_samples(samples));
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_to_mono_passthrough_for_mono() {
        let samples = vec![1i16, 2, 3];
        assert_eq!(mix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn mix_to_mono_averages_stereo_frames() {
        let samples = vec![100i16, 200, -100, 100];
        assert_eq!(mix_to_mono(&samples, 2), vec![150, 0]);
    }

    #[test]
    fn chunker_slices_at_chunk_boundaries() {
        let mut chunker = Chunker::new(CAPTURE_SAMPLE_RATE, 4).unwrap();

        let chunks = chunker.feed(&[1, 2, 3]);
        assert!(chunks.is_empty());

        let chunks = chunker.feed(&[4, 5, 6, 7, 8, 9]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples.as_ref(), &[1, 2, 3, 4]);
        assert_eq!(chunks[1].samples.as_ref(), &[5, 6, 7, 8]);
    }

    #[test]
    fn chunker_flush_emits_the_remainder() {
        let mut chunker = Chunker::new(CAPTURE_SAMPLE_RATE, 4).unwrap();
        chunker.feed(&[1, 2, 3]);

        let chunks = chunker.flush();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].samples.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn chunker_flush_on_empty_input_emits_nothing() {
        let mut chunker = Chunker::new(CAPTURE_SAMPLE_RATE, 4).unwrap();
        assert!(chunker.flush().is_empty());
    }

    #[test]
    fn chunker_resamples_48k_to_16k() {
        let mut chunker = Chunker::new(48_000, 1600).unwrap();

        // 48000 device samples (1s) should yield ~16000 output samples
        let mut total = 0;
        let chunks = chunker.feed(&vec![0i16; 48_000]);
        for chunk in &chunks {
            total += chunk.samples.len();
        }
        for chunk in chunker.flush() {
            total += chunk.samples.len();
        }

        let expected = CAPTURE_SAMPLE_RATE as usize;
        assert!(
            total >= expected - 1600 && total <= expected + 1600,
            "expected ~{} samples, got {}",
            expected,
            total
        );
    }
}
