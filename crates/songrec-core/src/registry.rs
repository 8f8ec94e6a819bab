//! Song registry
//!
//! Catalog of registered songs in the `songs` collection:
//!
//! ```text
//! { _id: <songID>, identityKey: "<title>\u{1F}<artist>", externalRef: "<ref>" }
//! ```
//!
//! Uniqueness of (externalRef, identityKey) is enforced by a unique index in
//! the store, not by a pre-check, so concurrent registrations of the same
//! song cannot both succeed.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use songrec_db::models::{
    self, SongDocument, EXTERNAL_REF_FIELD, IDENTITY_KEY_FIELD, SONGS_COLLECTION, SONG_IDENTITY_INDEX,
};
use songrec_db::{DocumentStore, Filter, StoreError, UniqueIndex, ID_FIELD};

use crate::error::RegistryError;
use crate::types::{Song, SongId};


/// ASCII unit separator between title and artist in an identity key
pub const SEPARATOR: char = '\u{1F}';

/// How many random IDs `register` draws before giving up
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Build the identity key of a song.
///
/// The key splits back into title and artist at the first separator, so a
/// title may not contain it. The artist may.
pub fn identity_key(title: &str, artist: &str) -> Result<String, RegistryError> {
    if title.contains(SEPARATOR) {
        return Err(RegistryError::InvalidSong(format!(
            "title {:?} contains the identity key separator",
            title
        )));
    }
    Ok(format!("{}{}{}", title, SEPARATOR, artist))
}

/// Recover (title, artist) from an identity key
pub fn split_identity_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(SEPARATOR)
}

/// Fields a song can be looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SongField {
    Id,
    ExternalRef,
    IdentityKey,
}

impl SongField {
    pub const ALL: [SongField; 3] = [SongField::Id, SongField::ExternalRef, SongField::IdentityKey];

    /// Stored field name
    pub fn as_str(self) -> &'static str {
        match self {
            SongField::Id => ID_FIELD,
            SongField::ExternalRef => EXTERNAL_REF_FIELD,
            SongField::IdentityKey => IDENTITY_KEY_FIELD,
        }
    }
}

impl fmt::Display for SongField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongField {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SongField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                RegistryError::InvalidFilter(format!(
                    "'{}' is not a lookup field (expected {}, {} or {})",
                    s, ID_FIELD, EXTERNAL_REF_FIELD, IDENTITY_KEY_FIELD
                ))
            })
    }
}

/// A lookup over one of the allowed fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongFilter {
    Id(SongId),
    ExternalRef(String),
    IdentityKey(String),
}

impl fmt::Display for SongFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SongFilter::Id(id) => write!(f, "{}={}", self.field(), id),
            SongFilter::ExternalRef(value) | SongFilter::IdentityKey(value) => {
                write!(f, "{}={:?}", self.field(), value)
            }
        }
    }
}

impl SongFilter {
    /// Parse a textual (field, value) pair; unknown fields fail closed
    pub fn parse(field: &str, value: &str) -> Result<Self, RegistryError> {
        match field.parse::<SongField>()? {
            SongField::Id => value.parse().map(SongFilter::Id).map_err(|e| {
                RegistryError::InvalidFilter(format!("'{}' is not a song ID: {}", value, e))
            }),
            SongField::ExternalRef => Ok(SongFilter::ExternalRef(value.to_string())),
            SongField::IdentityKey => Ok(SongFilter::IdentityKey(value.to_string())),
        }
    }

    pub fn field(&self) -> SongField {
        match self {
            SongFilter::Id(_) => SongField::Id,
            SongFilter::ExternalRef(_) => SongField::ExternalRef,
            SongFilter::IdentityKey(_) => SongField::IdentityKey,
        }
    }

    fn to_filter(&self) -> Filter {
        match self {
            SongFilter::Id(id) => Filter::id(models::id_key(*id)),
            SongFilter::ExternalRef(external_ref) => Filter::eq(EXTERNAL_REF_FIELD, external_ref.as_str()),
            SongFilter::IdentityKey(key) => Filter::eq(IDENTITY_KEY_FIELD, key.as_str()),
        }
    }
}

type IdGenerator = Box<dyn Fn() -> SongId + Send + Sync>;

pub struct SongRegistry {
    store: Arc<dyn DocumentStore>,
    next_id: IdGenerator,
}

impl SongRegistry {
    /// Registry drawing random song IDs
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_id_generator(store, rand::random::<SongId>)
    }

    /// Registry drawing song IDs from `next_id`; collisions are still retried
    pub fn with_id_generator(
        store: Arc<dyn DocumentStore>,
        next_id: impl Fn() -> SongId + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            next_id: Box::new(next_id),
        }
    }

    /// Register a song and return its new ID
    pub async fn register(&self, title: &str, artist: &str, external_ref: &str) -> Result<SongId, RegistryError> {
        let identity_key = identity_key(title, artist)?;

        self.store
            .create_unique_index(
                SONGS_COLLECTION,
                &UniqueIndex::new(SONG_IDENTITY_INDEX, &[EXTERNAL_REF_FIELD, IDENTITY_KEY_FIELD]),
            )
            .await?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let song_id = (self.next_id)();
            let document = models::encode(&SongDocument {
                song_id,
                identity_key: identity_key.clone(),
                external_ref: external_ref.to_string(),
            })?;

            match self.store.insert_one(SONGS_COLLECTION, document).await {
                Ok(()) => {
                    log::info!("Registered song {} ({} by {}, ref {})", song_id, title, artist, external_ref);
                    return Ok(song_id);
                }
                Err(StoreError::DuplicateKey { index, .. }) if index == ID_FIELD => {
                    log::warn!(
                        "Song ID {} already taken (attempt {}/{})",
                        song_id,
                        attempt,
                        MAX_ID_ATTEMPTS
                    );
                }
                Err(StoreError::DuplicateKey { .. }) => {
                    return Err(RegistryError::DuplicateSong {
                        external_ref: external_ref.to_string(),
                        identity_key,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RegistryError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    /// Look up one song; `Ok(None)` when nothing matches
    pub async fn get_song(&self, filter: &SongFilter) -> Result<Option<Song>, RegistryError> {
        let document = match self.store.find_one(SONGS_COLLECTION, &filter.to_filter()).await {
            Ok(Some(document)) => document,
            Ok(None) => return Ok(None),
            Err(StoreError::InvalidDocument { reason, .. }) => {
                return Err(RegistryError::corrupt(filter, reason));
            }
            Err(e) => return Err(e.into()),
        };

        let label = document
            .get(ID_FIELD)
            .map_or_else(|| "<no id>".to_string(), |id| id.to_string());
        let record: SongDocument =
            models::decode(document).map_err(|e| RegistryError::corrupt(&label, e))?;

        let (title, artist) = split_identity_key(&record.identity_key)
            .ok_or_else(|| RegistryError::corrupt(record.song_id, "identity key has no separator"))?;

        Ok(Some(Song {
            id: record.song_id,
            title: title.to_string(),
            artist: artist.to_string(),
            external_ref: record.external_ref,
        }))
    }

    pub async fn get_by_id(&self, song_id: SongId) -> Result<Option<Song>, RegistryError> {
        self.get_song(&SongFilter::Id(song_id)).await
    }

    pub async fn get_by_external_ref(&self, external_ref: &str) -> Result<Option<Song>, RegistryError> {
        self.get_song(&SongFilter::ExternalRef(external_ref.to_string())).await
    }

    pub async fn get_by_identity_key(&self, key: &str) -> Result<Option<Song>, RegistryError> {
        self.get_song(&SongFilter::IdentityKey(key.to_string())).await
    }

    /// Delete a song; deleting an unknown ID succeeds
    pub async fn delete_by_id(&self, song_id: SongId) -> Result<(), RegistryError> {
        let deleted = self
            .store
            .delete_one(SONGS_COLLECTION, &SongFilter::Id(song_id).to_filter())
            .await?;
        log::debug!("Deleted {} song(s) with ID {}", deleted, song_id);
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, RegistryError> {
        Ok(self.store.count(SONGS_COLLECTION).await?)
    }
}
