//! WAV container writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, WavError};
use crate::format::{WavHeader, HEADER_SIZE};

/// Writes raw PCM payloads behind a canonical 44-byte header.
///
/// Parameters are validated when the writer is built; payload alignment is
/// validated per call. Either check fails before any byte reaches the sink.
#[derive(Debug, Clone, Copy)]
pub struct WavWriter {
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
}

impl WavWriter {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Result<Self> {
        // Derived-field overflow is checked again per payload in `encode`
        WavHeader::pcm(sample_rate, channels, bits_per_sample, 0)?;
        Ok(Self {
            sample_rate,
            channels,
            bits_per_sample,
        })
    }

    /// Encode a complete container into memory.
    ///
    /// The payload must be whole frames: a multiple of the block align, or
    /// of the channel count for sub-byte sample widths.
    pub fn encode(&self, samples: &[u8]) -> Result<Vec<u8>> {
        let unit = usize::from(self.channels) * usize::from(self.bits_per_sample / 8).max(1);
        if samples.len() % unit != 0 {
            return Err(WavError::MisalignedData {
                len: samples.len(),
                unit,
            });
        }

        let header = WavHeader::pcm(
            self.sample_rate,
            self.channels,
            self.bits_per_sample,
            samples.len(),
        )?;

        let mut out = Vec::with_capacity(HEADER_SIZE + samples.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(samples);
        Ok(out)
    }

    /// Encode and hand the whole container to `sink` in one write.
    ///
    /// If the write fails the sink may hold a partial container; the caller
    /// must discard it.
    pub fn write_to<W: Write>(&self, sink: &mut W, samples: &[u8]) -> Result<()> {
        let bytes = self.encode(samples)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    /// Write a container file. A partially written file is removed on error.
    pub fn write_file(&self, path: &Path, samples: &[u8]) -> Result<()> {
        let bytes = self.encode(samples)?;

        let written = File::create(path).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });

        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(path) {
                log::warn!(
                    "Failed to remove partial WAV file {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(WavError::Io(e));
        }

        log::debug!("Wrote {} ({} payload bytes)", path.display(), samples.len());
        Ok(())
    }
}

/// Encode `samples` as a PCM container
pub fn encode(samples: &[u8], sample_rate: u32, channels: u16, bits_per_sample: u16) -> Result<Vec<u8>> {
    WavWriter::new(sample_rate, channels, bits_per_sample)?.encode(samples)
}

/// Write `samples` to `path` as a PCM container
pub fn write_wav_file(
    path: &Path,
    samples: &[u8],
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Result<()> {
    WavWriter::new(sample_rate, channels, bits_per_sample)?.write_file(path, samples)
}
