//! Application layer - the recording engine and its port interfaces

pub mod engine;
pub mod ports;
pub mod queue;
pub mod recorder;
pub mod retry;

// Re-export common types
pub use engine::{EngineConfig, EngineError, EngineEvent, RecordingEngine, SourceSpec};
pub use queue::PendingQueue;
pub use retry::{transcribe_with_retry, RetryPolicy, TranscribeOutcome};
