//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like cpal, the Gemini API, etc.

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod connectivity;
pub mod credentials;
pub mod encoding;
pub mod export;
pub mod transcription;

// Re-export adapters
pub use capture::CpalCapture;
pub use clipboard::ArboardClipboard;
pub use config::XdgConfigStore;
pub use connectivity::OnlineWatcher;
pub use credentials::StoredKeySource;
pub use encoding::{DefaultNegotiator, FlacEncoder, WavEncoder};
pub use export::TranscriptWriter;
pub use transcription::GeminiTranscriber;
