//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod credentials;
pub mod encoder;
pub mod transcriber;

// Re-export common types
pub use capture::{
    AudioCapture, AudioChunk, CaptureError, DeviceInfo, SourceStream, StreamGuard,
    CAPTURE_SAMPLE_RATE,
};
pub use clipboard::{Clipboard, ClipboardError};
pub use config::ConfigStore;
pub use credentials::{ApiKeySource, StaticKey};
pub use encoder::{EncodeError, EncoderNegotiator, PcmEncoder};
pub use transcriber::{Transcriber, TranscriptionError};
