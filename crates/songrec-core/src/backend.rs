//! Construction of the configured document store

use std::sync::Arc;

use songrec_db::{DocumentStore, MemoryStore, PostgresStore, StoreError};

use crate::config::{StorageBackend, StorageConfig};

/// Open the store selected by `config`.
///
/// The PostgreSQL backend is checked once so that a wrong host or database
/// fails here instead of on the first query.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            log::info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgresql => {
            log::info!(
                "Connecting to PostgreSQL at {}",
                config.postgresql.connection_string()
            );
            let store = PostgresStore::connect(&config.postgresql).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SongrecConfig;
    use songrec_db::models::SONGS_COLLECTION;

    #[tokio::test]
    async fn test_open_memory_store() {
        let config = SongrecConfig::default_memory();
        let store = open_store(&config.storage).await.unwrap();
        assert_eq!(store.count(SONGS_COLLECTION).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_open_postgresql_store() {
        let config = SongrecConfig::default_postgresql();
        let store = open_store(&config.storage).await.unwrap();
        store.count(SONGS_COLLECTION).await.unwrap();
    }
}
