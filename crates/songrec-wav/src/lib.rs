//! songrec WAV container library
//!
//! Exact read/write of the canonical 44-byte-header 16-bit PCM container and
//! conversion of its payload to normalized samples.

pub mod error;
pub mod format;
pub mod reader;
pub mod samples;
pub mod writer;

pub use error::{Result, WavError};
pub use format::{AudioContainer, WavHeader, WavInfo, HEADER_SIZE, PCM_FORMAT};
pub use reader::{decode, read_wav_file, WavReader};
pub use samples::bytes_to_samples;
pub use writer::{encode, write_wav_file, WavWriter};
