//! WAV encoding of speech buffers and validation of converter output.

use crate::error::SpeechError;
use std::io::Cursor;
use voxcast_types::AudioBuffer;

/// Encodes a mono buffer as 32-bit float WAV.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>, SpeechError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)?;
        for &sample in buffer.samples() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(bytes)
}

/// Parses the header of a WAV byte stream.
pub fn inspect_wav(bytes: &[u8]) -> Result<hound::WavSpec, SpeechError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    Ok(reader.spec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_header_declares_buffer_rate() {
        let buffer = AudioBuffer::new(24_000, vec![0.0, 0.5, -0.5, 0.25]);
        let bytes = encode_wav(&buffer).unwrap();

        let spec = inspect_wav(&bytes).unwrap();
        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);

        let mut reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.0, 0.5, -0.5, 0.25]);
    }

    #[test]
    fn garbage_is_not_wav() {
        assert!(matches!(
            inspect_wav(b"definitely not a riff header"),
            Err(SpeechError::Wav(_))
        ));
    }
}
