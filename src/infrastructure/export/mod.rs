//! Export adapters

pub mod file;

pub use file::{ExportError, TranscriptWriter};
