//! Credential port interface

use async_trait::async_trait;

/// Port for the transcription credential.
///
/// Read before each transcription attempt, so a key changed mid-recording
/// takes effect without a restart.
#[async_trait]
pub trait ApiKeySource: Send + Sync {
    /// The current API key, if one is configured
    async fn current(&self) -> Option<String>;
}

/// Fixed key, for tests and one-off invocations
pub struct StaticKey {
    key: String,
}

impl StaticKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl ApiKeySource for StaticKey {
    async fn current(&self) -> Option<String> {
        Some(self.key.clone())
    }
}
