//! Transcription port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::transcription::{AudioData, Instruction};

/// Transcription errors.
///
/// The fatal/transient split is the retry contract: fatal errors are certain
/// to recur and are never retried or queued, everything else is worth another
/// attempt.
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    #[error("Missing API key. Set GEMINI_API_KEY or run 'multi-scribe config set api_key <key>'")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Request rejected by the API: {0}")]
    InvalidRequest(String),

    #[error("Empty transcription response")]
    EmptyResponse,

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl TranscriptionError {
    /// Whether this failure is certain to recur on retry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey
                | Self::InvalidApiKey
                | Self::InvalidRequest(_)
                | Self::EmptyResponse
                | Self::ParseError(_)
        )
    }

    /// Whether this failure is likely to succeed on retry
    pub fn is_transient(&self) -> bool {
        !self.is_fatal()
    }
}

/// Port for audio transcription
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio payload to text.
    ///
    /// # Arguments
    /// * `audio` - The encoded audio segment
    /// * `instruction` - The instruction text sent with it
    ///
    /// # Returns
    /// The transcribed text or a classified error
    async fn transcribe(
        &self,
        audio: &AudioData,
        instruction: &Instruction,
    ) -> Result<String, TranscriptionError>;
}
