//! PCM conversion and payload codecs for captured and played-back audio.

use crate::error::ProtocolError;
use base64::Engine;
use std::io::Cursor;

/// Converts a slice of f32 samples to a vector of i16 samples.
pub fn convert_f32_to_i16(pcm32: &[f32]) -> Vec<i16> {
    pcm32
        .iter()
        .map(|&sample| (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Encodes raw bytes as a base64 payload string.
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decodes a base64 payload string back to raw bytes.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, ProtocolError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

/// Assembles buffered PCM16 samples into a single in-memory WAV object at the
/// capture device's native sample rate and channel count.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_convert_f32_to_i16() {
        let input = vec![1.0f32, -1.0f32, 0.0f32, 0.5f32];
        let result = convert_f32_to_i16(&input);

        assert_eq!(result.len(), 4);
        assert_eq!(result[0], i16::MAX);
        // -1.0 * 32767 = -32767, not i16::MIN (-32768)
        assert_eq!(result[1], -32767);
        assert_eq!(result[2], 0);
        assert_eq!(result[3], (0.5 * i16::MAX as f32) as i16);

        // Out-of-range samples are clamped
        let result = convert_f32_to_i16(&[2.0f32, -2.0f32]);
        assert_eq!(result[0], i16::MAX);
        assert_eq!(result[1], i16::MIN);

        assert!(convert_f32_to_i16(&[]).is_empty());
    }

    #[test]
    fn test_convert_f32_to_i16_roundtrip_precision() {
        let original = vec![0.1f32, -0.7f32, 0.0f32, 0.99f32];
        let as_i16 = convert_f32_to_i16(&original);
        for (original, converted) in original.iter().zip(as_i16.iter()) {
            assert_abs_diff_eq!(*original, *converted as f32 / i16::MAX as f32, epsilon = 0.001);
        }
    }

    #[test]
    fn test_base64_codecs() {
        let bytes = vec![0u8, 1, 2, 254, 255];
        let encoded = encode_base64(&bytes);
        assert_eq!(decode_base64(&encoded).unwrap(), bytes);

        assert_eq!(encode_base64(&[]), "");
        assert!(decode_base64("").unwrap().is_empty());
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn test_encode_wav_preserves_samples() {
        let samples = vec![0i16, 1000, -1000, i16::MAX, i16::MIN];
        let bytes = encode_wav(&samples, 16_000, 1).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_encode_wav_empty_recording() {
        let bytes = encode_wav(&[], 44_100, 2).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 0);
        assert_eq!(reader.spec().channels, 2);
    }
}
