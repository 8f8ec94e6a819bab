//! 16-bit PCM sample conversion

use crate::error::{Result, WavError};

/// Convert little-endian signed 16-bit samples to `s / 32768.0`.
///
/// The output range is [-1.0, 32767/32768]; the scale is the two's-complement
/// one and must stay asymmetric.
pub fn bytes_to_samples(input: &[u8]) -> Result<Vec<f64>> {
    if input.len() % 2 != 0 {
        return Err(WavError::MisalignedData {
            len: input.len(),
            unit: 2,
        });
    }

    Ok(input
        .chunks_exact(2)
        .map(|pair| f64::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
        .collect())
}

/// Duration in seconds of a payload of `data_len` bytes
pub fn duration(data_len: usize, channels: u16, sample_rate: u32, bits_per_sample: u16) -> Result<f64> {
    if bits_per_sample != 16 {
        return Err(WavError::UnsupportedBitDepth(bits_per_sample));
    }
    if channels == 0 || sample_rate == 0 {
        return Err(WavError::InvalidParameters(format!(
            "no duration for {} channels at {} Hz",
            channels, sample_rate
        )));
    }
    let bytes_per_second = f64::from(channels) * 2.0 * f64::from(sample_rate);
    Ok(data_len as f64 / bytes_per_second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scaling_boundaries() {
        let samples = bytes_to_samples(&[0x00, 0x80, 0xFF, 0x7F, 0x00, 0x00]).unwrap();
        assert_eq!(samples[0], -1.0);
        assert_eq!(samples[1], 32767.0 / 32768.0);
        assert_eq!(samples[2], 0.0);
    }

    #[test]
    fn test_negative_one_lsb() {
        let samples = bytes_to_samples(&[0xFF, 0xFF]).unwrap();
        assert_relative_eq!(samples[0], -1.0 / 32768.0);
    }

    #[test]
    fn test_odd_length_is_misaligned() {
        let result = bytes_to_samples(&[0x01]);
        assert!(matches!(
            result,
            Err(WavError::MisalignedData { len: 1, unit: 2 })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(bytes_to_samples(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_duration_one_second_mono() {
        let seconds = duration(16000, 1, 8000, 16).unwrap();
        assert_relative_eq!(seconds, 1.0);
    }

    #[test]
    fn test_duration_stereo() {
        // 44100 Hz stereo, half a second
        let seconds = duration(88200, 2, 44100, 16).unwrap();
        assert_relative_eq!(seconds, 0.5);
    }

    #[test]
    fn test_duration_rejects_empty_format() {
        assert!(matches!(
            duration(100, 0, 8000, 16),
            Err(WavError::InvalidParameters(_))
        ));
        assert!(matches!(
            duration(0, 1, 0, 16),
            Err(WavError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_duration_rejects_other_depths() {
        assert!(matches!(
            duration(100, 1, 8000, 24),
            Err(WavError::UnsupportedBitDepth(24))
        ));
    }
}
