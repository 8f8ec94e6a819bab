//! songrec database layer
//!
//! Document store abstraction with PostgreSQL (JSONB) and in-memory
//! backends, plus the typed document shapes of the songrec collections.

pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

// Re-export commonly used types
pub use connection::{create_pool, test_connection, DatabaseConfig, DbPool};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use models::{CoupleDocument, FingerprintDocument, SongDocument};
pub use postgres::PostgresStore;
pub use store::{DocumentStore, Filter, UniqueIndex, ID_FIELD};
