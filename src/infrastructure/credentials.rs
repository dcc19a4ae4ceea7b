//! Credential adapter

use async_trait::async_trait;

use crate::application::ports::{ApiKeySource, ConfigStore};

/// Reads `GEMINI_API_KEY`, falling back to the config store, on every call.
///
/// Re-reading per attempt means a key saved mid-recording is picked up by
/// the next segment without a restart.
pub struct StoredKeySource<S: ConfigStore> {
    store: S,
}

impl<S: ConfigStore> StoredKeySource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ConfigStore> ApiKeySource for StoredKeySource<S> {
    async fn current(&self) -> Option<String> {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }

        self.store
            .load()
            .await
            .ok()
            .and_then(|config| config.api_key)
            .filter(|key| !key.is_empty())
    }
}
