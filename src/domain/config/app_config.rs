//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::{schedule, Duration};

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub interval: Option<String>,
    pub window: Option<String>,
    pub chunk: Option<String>,
    pub clipboard: Option<bool>,
    pub export_dir: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            model: Some("gemini-1.5-flash-latest".to_string()),
            interval: Some("30s".to_string()),
            window: Some("33s".to_string()),
            chunk: Some("3s".to_string()),
            clipboard: Some(false),
            export_dir: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            model: other.model.or(self.model),
            interval: other.interval.or(self.interval),
            window: other.window.or(self.window),
            chunk: other.chunk.or(self.chunk),
            clipboard: other.clipboard.or(self.clipboard),
            export_dir: other.export_dir.or(self.export_dir),
        }
    }

    /// Get interval as parsed Duration, or default if not set/invalid
    pub fn interval_or_default(&self) -> Duration {
        self.interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(schedule::DEFAULT_INTERVAL)
    }

    /// Get window as parsed Duration, or default if not set/invalid
    pub fn window_or_default(&self) -> Duration {
        self.window
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(schedule::DEFAULT_WINDOW)
    }

    /// Get chunk as parsed Duration, or default if not set/invalid
    pub fn chunk_or_default(&self) -> Duration {
        self.chunk
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(schedule::DEFAULT_CHUNK)
    }

    /// Get the model, or the default model if not set
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or("gemini-1.5-flash-latest")
    }

    /// Get clipboard setting, or false if not set
    pub fn clipboard_or_default(&self) -> bool {
        self.clipboard.unwrap_or(false)
    }
}
