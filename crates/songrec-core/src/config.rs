//! Configuration for songrec
//!
//! TOML file selecting the document store backend and the external audio
//! converter:
//!
//! ```toml
//! [storage]
//! backend = "postgresql"
//!
//! [storage.postgresql]
//! host = "localhost"
//! database = "song_recognition"
//!
//! [converter]
//! program = "ffmpeg"
//! sample_rate = 44100
//! mono = true
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use songrec_db::DatabaseConfig;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SongrecConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// Storage backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub postgresql: DatabaseConfig,
}

/// Storage backend type
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process store, lost on exit
    Memory,
    Postgresql,
}

/// External resampling tool
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ConverterConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_mono")]
    pub mono: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            sample_rate: default_sample_rate(),
            mono: default_mono(),
        }
    }
}

fn default_program() -> String {
    "ffmpeg".to_string()
}
fn default_sample_rate() -> u32 {
    44100
}
fn default_mono() -> bool {
    true
}

impl SongrecConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse TOML config")
    }

    /// Get PostgreSQL connection string (password masked)
    pub fn connection_string(&self) -> Option<String> {
        match self.storage.backend {
            StorageBackend::Postgresql => Some(self.storage.postgresql.connection_string()),
            StorageBackend::Memory => None,
        }
    }

    /// Create a default in-memory configuration
    pub fn default_memory() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                postgresql: DatabaseConfig::default(),
            },
            converter: ConverterConfig::default(),
        }
    }

    /// Create a default PostgreSQL configuration
    pub fn default_postgresql() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Postgresql,
                postgresql: DatabaseConfig::default(),
            },
            converter: ConverterConfig::default(),
        }
    }
}
