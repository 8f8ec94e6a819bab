//! songrec core
//!
//! Persistence side of the song recognizer: the fingerprint index that maps
//! spectral-hash addresses to (anchor time, song) couples, the song
//! registry, configuration, and the external audio converter.

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod index;
pub mod registry;
pub mod types;

pub use backend::open_store;
pub use config::{ConverterConfig, SongrecConfig, StorageBackend, StorageConfig};
pub use convert::Converter;
pub use error::{ConvertError, IndexError, RegistryError};
pub use index::FingerprintIndex;
pub use registry::{identity_key, split_identity_key, SongField, SongFilter, SongRegistry};
pub use types::{Couple, FingerprintAddress, Song, SongId};
