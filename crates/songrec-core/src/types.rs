//! Domain values shared by the index and the registry

use serde::{Deserialize, Serialize};
use songrec_db::CoupleDocument;

/// Opaque spectral-hash bucket key produced by the fingerprinting algorithm
pub type FingerprintAddress = u32;

pub type SongId = u32;

/// "Song `song_id` has a fingerprint here, `anchor_time_ms` into the track"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Couple {
    pub anchor_time_ms: u32,
    pub song_id: SongId,
}

impl Couple {
    pub fn new(anchor_time_ms: u32, song_id: SongId) -> Self {
        Self {
            anchor_time_ms,
            song_id,
        }
    }
}

impl From<CoupleDocument> for Couple {
    fn from(doc: CoupleDocument) -> Self {
        Self::new(doc.anchor_time_ms, doc.song_id)
    }
}

impl From<Couple> for CoupleDocument {
    fn from(couple: Couple) -> Self {
        CoupleDocument {
            anchor_time_ms: couple.anchor_time_ms,
            song_id: couple.song_id,
        }
    }
}

/// A registered song as returned by the lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub external_ref: String,
}
