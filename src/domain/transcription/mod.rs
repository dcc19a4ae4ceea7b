//! Transcription domain - audio payloads and the request instruction

pub mod audio_data;
pub mod instruction;

pub use audio_data::{AudioData, AudioMimeType};
pub use instruction::Instruction;
