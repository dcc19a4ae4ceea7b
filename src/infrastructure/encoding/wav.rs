//! WAV fallback container

use std::io::Cursor;

use crate::application::ports::{EncodeError, PcmEncoder};
use crate::domain::transcription::AudioMimeType;

/// WAV segment encoder (uncompressed fallback)
pub struct WavEncoder;

impl WavEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WavEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PcmEncoder for WavEncoder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Wav
    }

    fn encode(&self, samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| EncodeError::Container(e.to_string()))?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| EncodeError::Encode(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| EncodeError::Container(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CAPTURE_SAMPLE_RATE;

    #[test]
    fn encode_produces_riff_header() {
        let encoder = WavEncoder::new();
        let samples = vec![0i16; 1600];

        let wav = encoder.encode(&samples, CAPTURE_SAMPLE_RATE).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header plus 2 bytes per sample
        assert_eq!(wav.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn mime_type_is_wav() {
        assert_eq!(WavEncoder::new().mime_type(), AudioMimeType::Wav);
    }
}
