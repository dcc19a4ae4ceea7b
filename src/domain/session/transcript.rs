//! Assembled transcript

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::SourceId;

/// One successfully transcribed segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub source: SourceId,
    pub label: String,
}

/// Append-only transcript assembled from all sessions.
///
/// Entries are kept in result-arrival order, not audio-chronological order:
/// overlapping segments finish transcription asynchronously, so timestamps
/// may run out of sequence across sources.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable rendering, one entry per line
    pub fn to_plain_text(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            lines.push(format!(
                "[{}] {}: {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.label,
                entry.text
            ));
        }
        lines.join("\n")
    }
}
