//! Segment encoder port interface

use std::sync::Arc;

use thiserror::Error;

use crate::domain::transcription::AudioMimeType;

/// Encoding errors
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    #[error("Encoder construction failed: {0}")]
    Negotiation(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Container write failed: {0}")]
    Container(String),
}

/// Port for turning captured PCM samples into a transfer container
pub trait PcmEncoder: Send + Sync {
    /// MIME type of the produced container
    fn mime_type(&self) -> AudioMimeType;

    /// Encode mono i16 samples at the given rate
    fn encode(&self, samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, EncodeError>;
}

/// Per-session encoder negotiation.
///
/// Returns the preferred encoder when it can be constructed and the platform
/// fallback otherwise. The fallback is local and never surfaced as an error.
pub trait EncoderNegotiator: Send + Sync {
    fn negotiate(&self) -> Arc<dyn PcmEncoder>;
}
