//! WAV container structures

use serde::{Deserialize, Serialize};

use crate::error::{Result, WavError};
use crate::samples;

/// RIFF chunk identifier
pub const RIFF_MAGIC: [u8; 4] = *b"RIFF";

/// RIFF form type for wave audio
pub const WAVE_TAG: [u8; 4] = *b"WAVE";

/// Format sub-chunk identifier
pub const FMT_ID: [u8; 4] = *b"fmt ";

/// Data sub-chunk identifier
pub const DATA_ID: [u8; 4] = *b"data";

/// Size of the canonical header written and expected by this crate
pub const HEADER_SIZE: usize = 44;

/// Size of the PCM format sub-chunk body
pub const FMT_CHUNK_SIZE: u32 = 16;

/// Linear PCM format code
pub const PCM_FORMAT: u16 = 1;

/// Canonical 44-byte RIFF/WAVE header (all fields little-endian on disk)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavHeader {
    /// "RIFF"
    pub chunk_id: [u8; 4],
    /// 36 + data length
    pub chunk_size: u32,
    /// "WAVE"
    pub format: [u8; 4],
    /// "fmt "
    pub subchunk1_id: [u8; 4],
    /// 16 for PCM
    pub subchunk1_size: u32,
    /// 1 for linear PCM
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    /// sample_rate * channels * bytes per sample
    pub byte_rate: u32,
    /// channels * bytes per sample
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// "data"
    pub subchunk2_id: [u8; 4],
    /// Length of the sample payload in bytes
    pub data_size: u32,
}

impl WavHeader {
    /// Build a PCM header for a payload of `data_size` bytes.
    ///
    /// Fails with `InvalidParameters` when a parameter is zero or a derived
    /// field does not fit its on-disk width.
    pub fn pcm(
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
        data_size: usize,
    ) -> Result<Self> {
        if sample_rate == 0 || channels == 0 || bits_per_sample == 0 {
            return Err(WavError::InvalidParameters(format!(
                "values must be greater than zero (sample_rate: {}, channels: {}, bits_per_sample: {})",
                sample_rate, channels, bits_per_sample
            )));
        }

        let bytes_per_sample = bits_per_sample / 8;
        let block_align = channels.checked_mul(bytes_per_sample).ok_or_else(|| {
            WavError::InvalidParameters(format!(
                "block align overflows u16 ({} channels x {} bytes)",
                channels, bytes_per_sample
            ))
        })?;
        let byte_rate = sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or_else(|| {
                WavError::InvalidParameters(format!(
                    "byte rate overflows u32 ({} Hz x {} bytes per frame)",
                    sample_rate, block_align
                ))
            })?;
        let data_size = u32::try_from(data_size)
            .ok()
            .filter(|size| size.checked_add(36).is_some())
            .ok_or_else(|| {
                WavError::InvalidParameters(format!(
                    "payload of {} bytes does not fit a RIFF chunk",
                    data_size
                ))
            })?;

        Ok(Self {
            chunk_id: RIFF_MAGIC,
            chunk_size: 36 + data_size,
            format: WAVE_TAG,
            subchunk1_id: FMT_ID,
            subchunk1_size: FMT_CHUNK_SIZE,
            audio_format: PCM_FORMAT,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            subchunk2_id: DATA_ID,
            data_size,
        })
    }

    /// Serialize to the 44-byte on-disk layout
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.chunk_id);
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.format);
        out[12..16].copy_from_slice(&self.subchunk1_id);
        out[16..20].copy_from_slice(&self.subchunk1_size.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(&self.subchunk2_id);
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }
}

/// A decoded (or freshly encoded) PCM container.
///
/// Immutable once built; the payload is exactly the bytes following the
/// 44-byte header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioContainer {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data: Vec<u8>,
}

impl AudioContainer {
    pub(crate) fn new(header: &WavHeader, data: Vec<u8>) -> Self {
        Self {
            audio_format: header.audio_format,
            channels: header.channels,
            sample_rate: header.sample_rate,
            bits_per_sample: header.bits_per_sample,
            data,
        }
    }

    pub fn audio_format(&self) -> u16 {
        self.audio_format
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Raw little-endian sample payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Playback length in seconds. Only 16-bit payloads are supported.
    pub fn duration(&self) -> Result<f64> {
        samples::duration(
            self.data.len(),
            self.channels,
            self.sample_rate,
            self.bits_per_sample,
        )
    }

    /// Normalized samples in [-1.0, 1.0). Only 16-bit payloads are supported.
    pub fn to_samples(&self) -> Result<Vec<f64>> {
        if self.bits_per_sample != 16 {
            return Err(WavError::UnsupportedBitDepth(self.bits_per_sample));
        }
        samples::bytes_to_samples(&self.data)
    }
}

/// Summary of a 16-bit WAV file as consumed by the ingestion pipeline
#[derive(Debug, Clone)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub data: Vec<u8>,
    /// Seconds
    pub duration: f64,
}

impl TryFrom<AudioContainer> for WavInfo {
    type Error = WavError;

    fn try_from(container: AudioContainer) -> Result<Self> {
        let duration = container.duration()?;
        Ok(Self {
            channels: container.channels(),
            sample_rate: container.sample_rate(),
            data: container.into_data(),
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_header_derived_fields() {
        let header = WavHeader::pcm(44100, 2, 16, 1000).unwrap();
        assert_eq!(header.chunk_size, 1036);
        assert_eq!(header.byte_rate, 44100 * 2 * 2);
        assert_eq!(header.block_align, 4);
        assert_eq!(header.data_size, 1000);
        assert_eq!(header.audio_format, PCM_FORMAT);
    }

    #[test]
    fn test_pcm_header_rejects_zero_values() {
        assert!(matches!(
            WavHeader::pcm(0, 1, 16, 0),
            Err(WavError::InvalidParameters(_))
        ));
        assert!(matches!(
            WavHeader::pcm(8000, 0, 16, 0),
            Err(WavError::InvalidParameters(_))
        ));
        assert!(matches!(
            WavHeader::pcm(8000, 1, 0, 0),
            Err(WavError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_pcm_header_rejects_byte_rate_overflow() {
        let result = WavHeader::pcm(u32::MAX, 2, 16, 0);
        assert!(matches!(result, Err(WavError::InvalidParameters(_))));
    }

    #[test]
    fn test_header_layout_offsets() {
        let bytes = WavHeader::pcm(8000, 1, 16, 16000).unwrap().to_bytes();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 16036);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 8000);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 16000);
        assert_eq!(u16::from_le_bytes([bytes[32], bytes[33]]), 2);
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 16000);
    }
}
