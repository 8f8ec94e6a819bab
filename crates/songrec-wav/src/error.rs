//! Error types for container encoding and decoding

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WavError>;

/// Every variant except `Io` describes caller input and is recoverable.
#[derive(Error, Debug)]
pub enum WavError {
    /// Zero or out-of-range format parameters
    #[error("invalid WAV parameters: {0}")]
    InvalidParameters(String),

    /// Payload length is not a whole number of units
    #[error("misaligned sample data: {len} bytes is not a multiple of {unit}")]
    MisalignedData { len: usize, unit: usize },

    #[error("invalid WAV file size (too small): {0} bytes, need at least 44")]
    TooSmall(usize),

    /// RIFF magic or WAVE form tag missing
    #[error("invalid WAV header: expected RIFF/WAVE, found {riff:?}/{wave:?}")]
    BadMagic { riff: [u8; 4], wave: [u8; 4] },

    #[error("unsupported audio format code {0} (only linear PCM is supported)")]
    UnsupportedFormat(u16),

    #[error("unsupported bits per sample: {0} (only 16-bit is supported)")]
    UnsupportedBitDepth(u16),

    #[error("WAV I/O error: {0}")]
    Io(#[from] std::io::Error),
}
