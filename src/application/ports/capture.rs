//! Capture port interfaces
//!
//! An acquired source is exposed as an opaque live audio stream: a fan-out of
//! fixed-granularity PCM chunks that any number of overlapping segment
//! recorders can subscribe to independently.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::recording::Duration;

/// Sample rate every adapter delivers (16 kHz mono, speech-optimized)
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No default input device available")]
    NoInputDevice,

    #[error("No capture device at index {0}")]
    UnknownDevice(usize),

    #[error("Access to the capture device was denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to open capture stream: {0}")]
    StreamFailed(String),

    #[error("Failed to enumerate capture devices: {0}")]
    EnumerationFailed(String),
}

/// One internal buffering unit of captured audio (mono i16 at 16 kHz)
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Arc<[i16]>,
}

impl AudioChunk {
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

/// An enumerable capture device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
}

/// Releases the capture backend when dropped.
pub struct StreamGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Guard with nothing to release (tests, synthetic streams)
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Live audio handle for one acquired source.
///
/// Dropping the stream releases the underlying hardware. Each subscriber
/// receives every chunk produced after it subscribed, so overlapping segment
/// recorders tap the same stream without disturbing each other.
pub struct SourceStream {
    chunks: broadcast::Sender<AudioChunk>,
    _guard: StreamGuard,
}

impl SourceStream {
    pub fn new(chunks: broadcast::Sender<AudioChunk>, guard: StreamGuard) -> Self {
        Self {
            chunks,
            _guard: guard,
        }
    }

    /// Tap the stream from this point on
    pub fn subscribe(&self) -> broadcast::Receiver<AudioChunk> {
        self.chunks.subscribe()
    }

    /// Handle for creating further subscriptions without borrowing the stream
    pub fn fanout(&self) -> broadcast::Sender<AudioChunk> {
        self.chunks.clone()
    }
}

/// Port for acquiring live audio sources
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Enumerate the system's capture devices
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError>;

    /// Acquire the default microphone, producing chunks of the given length
    async fn acquire_mic(&self, chunk: Duration) -> Result<SourceStream, CaptureError>;

    /// Acquire a capture device by enumeration index
    async fn acquire_device(
        &self,
        index: usize,
        chunk: Duration,
    ) -> Result<SourceStream, CaptureError>;
}
