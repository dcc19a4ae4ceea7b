//! Transcription instruction value object

/// Instruction sent alongside every audio segment
const DEFAULT_INSTRUCTION: &str =
    "Transcribe this audio to plain text. Respond with only the transcript.";

/// Value object for the instruction text sent with each segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    content: String,
}

impl Instruction {
    /// Use custom instruction text
    pub fn custom(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Get the instruction text
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            content: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}
