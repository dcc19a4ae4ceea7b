//! Session domain - sources, segments, and the assembled transcript

pub mod segment;
pub mod source;
pub mod transcript;

pub use segment::Segment;
pub use source::SourceId;
pub use transcript::{TranscriptEntry, TranscriptLog};
