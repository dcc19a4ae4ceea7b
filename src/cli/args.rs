//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::recording::Duration;

/// MultiScribe - multi-source audio transcription
#[derive(Parser, Debug)]
#[command(name = "multi-scribe")]
#[command(version = "0.1.0")]
#[command(about = "Record several audio sources at once and transcribe them live using Google Gemini")]
#[command(long_about = None)]
pub struct Cli {
    /// Record the default microphone
    #[arg(short = 'm', long)]
    pub mic: bool,

    /// Record a capture device by index (repeatable, see `multi-scribe devices`)
    #[arg(short = 'd', long = "device", value_name = "INDEX")]
    pub devices: Vec<usize>,

    /// Interval between segment starts (e.g., 30s, 1m)
    #[arg(long, value_name = "TIME")]
    pub interval: Option<String>,

    /// Length of each recorded segment; must exceed the interval
    #[arg(long, value_name = "TIME")]
    pub window: Option<String>,

    /// Gemini model to use
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Copy the final transcript to the clipboard
    #[arg(short = 'c', long)]
    pub clipboard: bool,

    /// Write transcription-<timestamp>.txt/.json into DIR on exit
    #[arg(short = 'o', long, value_name = "DIR")]
    pub export_dir: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List capture devices
    Devices,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed recording options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub mic: bool,
    pub devices: Vec<usize>,
    pub interval: Duration,
    pub window: Duration,
    pub chunk: Duration,
    pub model: Option<String>,
    pub clipboard: bool,
    pub export_dir: Option<String>,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_key",
    "model",
    "interval",
    "window",
    "chunk",
    "clipboard",
    "export_dir",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
