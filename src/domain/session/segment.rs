//! Segment entity

use chrono::{DateTime, Utc};

use super::source::SourceId;
use crate::domain::transcription::AudioData;

/// One finalized recording window from a single session.
///
/// Immutable once created; consumed exactly once by the transcription path
/// (or re-queued verbatim after a transient failure).
#[derive(Debug, Clone)]
pub struct Segment {
    source: SourceId,
    label: String,
    audio: AudioData,
    captured_at: DateTime<Utc>,
}

impl Segment {
    pub fn new(
        source: SourceId,
        label: impl Into<String>,
        audio: AudioData,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            label: label.into(),
            audio,
            captured_at,
        }
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn audio(&self) -> &AudioData {
        &self.audio
    }

    /// When the segment window closed
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}
