//! Segment encoders
//!
//! FLAC is the preferred container (lossless and compact for speech); WAV is
//! the fallback when the FLAC encoder cannot be constructed. The fallback is
//! local to the session and never surfaced as an error.

pub mod flac;
pub mod wav;

pub use flac::FlacEncoder;
pub use wav::WavEncoder;

use std::sync::Arc;

use crate::application::ports::{EncoderNegotiator, PcmEncoder};

/// FLAC-preferred negotiation with WAV fallback
pub struct DefaultNegotiator;

impl DefaultNegotiator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DefaultNegotiator {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderNegotiator for DefaultNegotiator {
    fn negotiate(&self) -> Arc<dyn PcmEncoder> {
        match FlacEncoder::new() {
            Ok(encoder) => Arc::new(encoder),
            Err(error) => {
                tracing::debug!(%error, "FLAC encoder unavailable, falling back to WAV");
                Arc::new(WavEncoder::new())
            }
        }
    }
}
