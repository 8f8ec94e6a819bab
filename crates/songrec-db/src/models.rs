//! Typed document shapes for the `fingerprints` and `songs` collections
//!
//! Every document read from the store goes through [`decode`] into one of
//! these structs; a mismatch is reported instead of being cast around.

use bson::{Bson, Document};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const FINGERPRINTS_COLLECTION: &str = "fingerprints";
pub const SONGS_COLLECTION: &str = "songs";

pub const COUPLES_FIELD: &str = "couples";
pub const IDENTITY_KEY_FIELD: &str = "identityKey";
pub const EXTERNAL_REF_FIELD: &str = "externalRef";

/// Name of the unique index over (externalRef, identityKey)
pub const SONG_IDENTITY_INDEX: &str = "externalRef_identityKey";

/// One entry of a fingerprint bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoupleDocument {
    #[serde(rename = "anchorTimeMs")]
    pub anchor_time_ms: u32,
    #[serde(rename = "songID")]
    pub song_id: u32,
}

/// A fingerprint bucket keyed by its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintDocument {
    #[serde(rename = "_id")]
    pub address: u32,
    pub couples: Vec<CoupleDocument>,
}

/// A registered song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDocument {
    #[serde(rename = "_id")]
    pub song_id: u32,
    #[serde(rename = "identityKey")]
    pub identity_key: String,
    #[serde(rename = "externalRef")]
    pub external_ref: String,
}

/// Numeric keys are always stored as 64-bit integers
pub fn id_key(id: u32) -> Bson {
    Bson::Int64(i64::from(id))
}

/// Strongly-typed decode of a stored document
pub fn decode<T: DeserializeOwned>(document: Document) -> std::result::Result<T, bson::de::Error> {
    bson::from_document(document)
}

pub fn encode<T: Serialize>(value: &T) -> Result<Document> {
    Ok(bson::to_document(value)?)
}

/// Encode a value that serializes to an embedded document (array element)
pub fn encode_bson<T: Serialize>(value: &T) -> Result<Bson> {
    Ok(bson::to_bson(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_couple_field_names() {
        let encoded = encode(&CoupleDocument {
            anchor_time_ms: 1500,
            song_id: 42,
        })
        .unwrap();
        assert!(encoded.contains_key("anchorTimeMs"));
        assert!(encoded.contains_key("songID"));
    }

    #[test]
    fn test_decode_fingerprint_document() {
        let stored = doc! {
            "_id": 99i64,
            "couples": [
                { "anchorTimeMs": 10i64, "songID": 1i64 },
                { "anchorTimeMs": 20i32, "songID": 2i32 },
            ],
        };
        let decoded: FingerprintDocument = decode(stored).unwrap();
        assert_eq!(decoded.address, 99);
        assert_eq!(
            decoded.couples,
            vec![
                CoupleDocument { anchor_time_ms: 10, song_id: 1 },
                CoupleDocument { anchor_time_ms: 20, song_id: 2 },
            ]
        );
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let not_an_array = doc! { "_id": 1i64, "couples": "oops" };
        assert!(decode::<FingerprintDocument>(not_an_array).is_err());

        let missing_song = doc! { "_id": 1i64, "couples": [{ "anchorTimeMs": 5i64 }] };
        assert!(decode::<FingerprintDocument>(missing_song).is_err());

        let negative = doc! { "_id": 1i64, "couples": [{ "anchorTimeMs": -5i64, "songID": 1i64 }] };
        assert!(decode::<FingerprintDocument>(negative).is_err());
    }

    #[test]
    fn test_song_document_round_trip_shape() {
        let song = SongDocument {
            song_id: 7,
            identity_key: "Title\u{1f}Artist".to_string(),
            external_ref: "dQw4w9WgXcQ".to_string(),
        };
        let encoded = encode(&song).unwrap();
        assert!(encoded.contains_key("_id"));
        assert_eq!(encoded.get_str("externalRef").unwrap(), "dQw4w9WgXcQ");
        let decoded: SongDocument = decode(encoded).unwrap();
        assert_eq!(decoded, song);
    }
}
