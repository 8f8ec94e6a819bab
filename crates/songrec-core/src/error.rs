//! Error types for the fingerprint index, song registry and converter

use songrec_db::StoreError;
use thiserror::Error;

use crate::types::FingerprintAddress;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Writing one address failed; addresses written before it stay written
    #[error("error upserting fingerprints for address {address}: {source}")]
    Store {
        address: FingerprintAddress,
        #[source]
        source: StoreError,
    },

    #[error("error retrieving fingerprints for address {address}: {source}")]
    Fetch {
        address: FingerprintAddress,
        #[source]
        source: StoreError,
    },

    /// A stored bucket does not have the couple list shape
    #[error("fingerprint bucket for address {address} is corrupt: {reason}")]
    CorruptRecord {
        address: FingerprintAddress,
        reason: String,
    },

    #[error("error dropping fingerprint collection: {0}")]
    Drop(#[source] StoreError),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("song with external reference '{external_ref}' and identity '{identity_key}' already exists")]
    DuplicateSong {
        external_ref: String,
        identity_key: String,
    },

    /// Lookup on a field outside the allow-list
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid song: {0}")]
    InvalidSong(String),

    /// `record` is the stored `_id`, or the lookup when no `_id` is readable
    #[error("song record {record} is corrupt: {reason}")]
    CorruptRecord { record: String, reason: String },

    #[error("could not allocate an unused song ID after {0} attempts")]
    IdExhausted(usize),

    #[error("song registry error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
    },
}

impl RegistryError {
    pub(crate) fn corrupt(record: impl ToString, reason: impl ToString) -> Self {
        RegistryError::CorruptRecord {
            record: record.to_string(),
            reason: reason.to_string(),
        }
    }
}
