//! Transcript file export

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::fs;

use crate::domain::session::TranscriptEntry;

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write transcript: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode transcript: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes `transcription-<timestamp>.{txt,json}` files into a directory.
pub struct TranscriptWriter {
    dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the human-readable rendering
    pub async fn write_text(&self, text: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.txt", Self::file_stem()));
        fs::write(&path, text).await?;
        Ok(path)
    }

    /// Write the structured entry list as pretty JSON
    pub async fn write_json(&self, entries: &[TranscriptEntry]) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.json", Self::file_stem()));
        let json = serde_json::to_vec_pretty(entries)?;
        fs::write(&path, json).await?;
        Ok(path)
    }

    /// Filesystem-safe timestamped name
    fn file_stem() -> String {
        format!("transcription-{}", Utc::now().format("%Y%m%dT%H%M%SZ"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SourceId;

    fn entry(text: &str) -> TranscriptEntry {
        TranscriptEntry {
            timestamp: Utc::now(),
            text: text.to_string(),
            source: SourceId::mic(),
            label: "Microphone".to_string(),
        }
    }

    #[tokio::test]
    async fn writes_text_file_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path());

        let path = writer.write_text("[12:00:00] Microphone: hi").await.unwrap();

        assert!(path.starts_with(dir.path()));
        assert!(path.file_name().unwrap().to_string_lossy().ends_with(".txt"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[12:00:00] Microphone: hi");
    }

    #[tokio::test]
    async fn json_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path());
        let entries = vec![entry("one"), entry("two")];

        let path = writer.write_json(&entries).await.unwrap();

        let written = std::fs::read(&path).unwrap();
        let restored: Vec<TranscriptEntry> = serde_json::from_slice(&written).unwrap();
        assert_eq!(restored, entries);
    }

    #[tokio::test]
    async fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("exports/today");
        let writer = TranscriptWriter::new(&nested);

        writer.write_text("x").await.unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn file_stem_is_filesystem_safe() {
        let stem = TranscriptWriter::file_stem();
        assert!(stem.starts_with("transcription-"));
        assert!(!stem.contains(':'));
    }
}
