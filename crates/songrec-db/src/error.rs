//! Document store errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("failed to acquire database connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A unique index (or the `_id` primary key) rejected a write
    #[error("duplicate key in '{collection}' (index '{index}')")]
    DuplicateKey { collection: String, index: String },

    #[error("failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    /// The stored document cannot be represented or mutated as requested
    #[error("invalid document in '{collection}': {reason}")]
    InvalidDocument { collection: String, reason: String },

    /// Collection, index or field name outside `[A-Za-z0-9_]`
    #[error("invalid name '{0}'")]
    InvalidName(String),
}
