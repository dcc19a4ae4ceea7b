//! FLAC encoder for Gemini API compatibility
//!
//! FLAC provides lossless compression, giving the API the highest quality
//! audio input while still being compressed (~40% of WAV size).

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use crate::application::ports::{EncodeError, PcmEncoder};
use crate::domain::transcription::AudioMimeType;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// FLAC segment encoder
pub struct FlacEncoder;

impl FlacEncoder {
    /// Create a FLAC encoder, verifying the encoder configuration up front
    pub fn new() -> Result<Self, EncodeError> {
        config::Encoder::default()
            .into_verified()
            .map_err(|(_, e)| EncodeError::Negotiation(format!("{:?}", e)))?;
        Ok(Self)
    }
}

impl PcmEncoder for FlacEncoder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Flac
    }

    fn encode(&self, samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        // flacenc uses i32 internally
        let samples_i32: Vec<i32> = samples.iter().map(|&s| s as i32).collect();

        let config = config::Encoder::default()
            .into_verified()
            .map_err(|(_, e)| EncodeError::Negotiation(format!("{:?}", e)))?;

        let source = MemSource::from_samples(
            &samples_i32,
            CHANNELS,
            BITS_PER_SAMPLE,
            sample_rate as usize,
        );

        let flac_stream =
            flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
                .map_err(|e| EncodeError::Encode(format!("{:?}", e)))?;

        let mut sink = ByteSink::new();
        flac_stream
            .write(&mut sink)
            .map_err(|e| EncodeError::Container(e.to_string()))?;

        Ok(sink.into_inner())
    }
}
