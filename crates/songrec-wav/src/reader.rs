//! WAV container reader

use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{Result, WavError};
use crate::format::{AudioContainer, WavHeader, WavInfo, HEADER_SIZE, PCM_FORMAT, RIFF_MAGIC, WAVE_TAG};

pub struct WavReader;

impl WavReader {
    /// Decode a container held in memory.
    ///
    /// Only the canonical 44-byte layout is understood: everything after the
    /// header is treated as the sample payload.
    pub fn decode(bytes: &[u8]) -> Result<AudioContainer> {
        if bytes.len() < HEADER_SIZE {
            return Err(WavError::TooSmall(bytes.len()));
        }

        let header = Self::read_header(&mut Cursor::new(&bytes[..HEADER_SIZE]))?;

        if header.chunk_id != RIFF_MAGIC || header.format != WAVE_TAG {
            return Err(WavError::BadMagic {
                riff: header.chunk_id,
                wave: header.format,
            });
        }
        if header.audio_format != PCM_FORMAT {
            return Err(WavError::UnsupportedFormat(header.audio_format));
        }

        Ok(AudioContainer::new(&header, bytes[HEADER_SIZE..].to_vec()))
    }

    /// Read and decode a container file
    pub fn read(path: &Path) -> Result<AudioContainer> {
        let bytes = std::fs::read(path)?;
        log::debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Self::decode(&bytes)
    }

    fn read_header<R: Read>(reader: &mut R) -> Result<WavHeader> {
        let chunk_id = Self::read_tag(reader)?;
        let chunk_size = Self::read_u32(reader)?;
        let format = Self::read_tag(reader)?;
        let subchunk1_id = Self::read_tag(reader)?;
        let subchunk1_size = Self::read_u32(reader)?;
        let audio_format = Self::read_u16(reader)?;
        let channels = Self::read_u16(reader)?;
        let sample_rate = Self::read_u32(reader)?;
        let byte_rate = Self::read_u32(reader)?;
        let block_align = Self::read_u16(reader)?;
        let bits_per_sample = Self::read_u16(reader)?;
        let subchunk2_id = Self::read_tag(reader)?;
        let data_size = Self::read_u32(reader)?;

        Ok(WavHeader {
            chunk_id,
            chunk_size,
            format,
            subchunk1_id,
            subchunk1_size,
            audio_format,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            subchunk2_id,
            data_size,
        })
    }

    fn read_tag<R: Read>(reader: &mut R) -> Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

/// Decode a container held in memory
pub fn decode(bytes: &[u8]) -> Result<AudioContainer> {
    WavReader::decode(bytes)
}

/// Read a 16-bit WAV file and compute its duration
pub fn read_wav_file(path: &Path) -> Result<WavInfo> {
    WavInfo::try_from(WavReader::read(path)?)
}
