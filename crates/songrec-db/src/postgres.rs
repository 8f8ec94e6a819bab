//! PostgreSQL document store
//!
//! Each collection is a table `(id JSONB PRIMARY KEY, doc JSONB NOT NULL)`.
//! The `_id` of a document lives in `id`; the remaining fields in `doc`.
//! Unique indexes are expression indexes over `doc ->> field`.

use async_trait::async_trait;
use bson::{Bson, Document};
use deadpool_postgres::{Object, Pool};
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;

use crate::connection::{create_pool, test_connection, DatabaseConfig};
use crate::error::{Result, StoreError};
use crate::store::{validate_name, DocumentStore, Filter, UniqueIndex, ID_FIELD};

type Params<'a> = [&'a (dyn ToSql + Sync)];

pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Build the pool from `config` and verify the server answers
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = create_pool(config)?;
        test_connection(&pool).await?;
        log::info!("Connected to {}", config.connection_string());
        Ok(Self { pool })
    }

    async fn create_table(&self, client: &Object, table: &str) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (id JSONB PRIMARY KEY, doc JSONB NOT NULL)",
            table
        );
        match client.batch_execute(&sql).await {
            Ok(()) => Ok(()),
            // Lost a creation race; the table exists now
            Err(e)
                if e.code() == Some(&SqlState::DUPLICATE_TABLE)
                    || e.code() == Some(&SqlState::UNIQUE_VIOLATION) =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run a write, creating the table first if the collection was never
    /// written or has been dropped
    async fn execute_write(
        &self,
        client: &Object,
        table: &str,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<u64> {
        match client.execute(sql, params).await {
            Err(e) if e.code() == Some(&SqlState::UNDEFINED_TABLE) => {
                log::debug!("Creating collection '{}'", table);
                self.create_table(client, table).await?;
                client
                    .execute(sql, params)
                    .await
                    .map_err(|e| write_error(table, e))
            }
            result => result.map_err(|e| write_error(table, e)),
        }
    }
}

/// Map a unique violation to `DuplicateKey`, naming the index the way the
/// memory store does (`_id` for the primary key)
fn write_error(table: &str, e: tokio_postgres::Error) -> StoreError {
    if e.code() != Some(&SqlState::UNIQUE_VIOLATION) {
        return e.into();
    }
    let constraint = e
        .as_db_error()
        .and_then(|db| db.constraint())
        .unwrap_or_default();
    let index = if constraint == format!("{}_pkey", table) {
        ID_FIELD.to_string()
    } else {
        constraint
            .strip_prefix(&format!("{}_", table))
            .unwrap_or(constraint)
            .to_string()
    };
    StoreError::DuplicateKey {
        collection: table.to_string(),
        index,
    }
}

fn is_undefined_table(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::UNDEFINED_TABLE)
}

fn to_json(value: Bson) -> Value {
    value.into_relaxed_extjson()
}

/// Rebuild a document from its stored `id` and `doc` columns
fn from_row(table: &str, id: Value, doc: Value) -> Result<Document> {
    let invalid = |reason: String| StoreError::InvalidDocument {
        collection: table.to_string(),
        reason,
    };
    let id = Bson::try_from(id).map_err(|e| invalid(e.to_string()))?;
    let mut document = match Bson::try_from(doc).map_err(|e| invalid(e.to_string()))? {
        Bson::Document(document) => document,
        other => return Err(invalid(format!("expected an object, found {:?}", other.element_type()))),
    };
    document.insert(ID_FIELD, id);
    Ok(document)
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn push_upsert(
        &self,
        collection: &str,
        id: Bson,
        field: &str,
        items: Vec<Bson>,
    ) -> Result<()> {
        let table = validate_name(collection)?;
        let field = validate_name(field)?;
        let client = self.pool.get().await?;

        let id = to_json(id);
        let items = Value::Array(items.into_iter().map(to_json).collect());

        // Single statement: the row lock taken by ON CONFLICT serializes
        // concurrent appends to the same id. An existing non-array field
        // fails the WHERE and leaves the row untouched.
        let sql = format!(
            "INSERT INTO \"{t}\" (id, doc) VALUES ($1, jsonb_build_object($2::text, $3::jsonb)) \
             ON CONFLICT (id) DO UPDATE SET doc = jsonb_set(\"{t}\".doc, ARRAY[$2::text], \
             COALESCE(\"{t}\".doc -> $2::text, '[]'::jsonb) || $3::jsonb) \
             WHERE jsonb_typeof(COALESCE(\"{t}\".doc -> $2::text, '[]'::jsonb)) = 'array'",
            t = table
        );
        let written = self
            .execute_write(&client, table, &sql, &[&id, &field, &items])
            .await?;
        if written == 0 {
            return Err(StoreError::InvalidDocument {
                collection: table.to_string(),
                reason: format!("field '{}' must be an array", field),
            });
        }
        Ok(())
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<()> {
        let table = validate_name(collection)?;
        let id = document
            .remove(ID_FIELD)
            .ok_or_else(|| StoreError::InvalidDocument {
                collection: table.to_string(),
                reason: format!("document has no '{}'", ID_FIELD),
            })?;
        let client = self.pool.get().await?;

        let id = to_json(id);
        let doc = to_json(Bson::Document(document));
        let sql = format!("INSERT INTO \"{}\" (id, doc) VALUES ($1, $2)", table);
        self.execute_write(&client, table, &sql, &[&id, &doc]).await?;
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let table = validate_name(collection)?;
        let client = self.pool.get().await?;

        let value = to_json(filter.value.clone());
        let result = if filter.is_id() {
            let sql = format!("SELECT id, doc FROM \"{}\" WHERE id = $1", table);
            client.query_opt(&sql, &[&value]).await
        } else {
            let field = validate_name(&filter.field)?;
            let sql = format!(
                "SELECT id, doc FROM \"{}\" WHERE doc -> $1::text = $2::jsonb LIMIT 1",
                table
            );
            client.query_opt(&sql, &[&field, &value]).await
        };

        match result {
            Ok(Some(row)) => from_row(table, row.get(0), row.get(1)).map(Some),
            Ok(None) => Ok(None),
            Err(e) if is_undefined_table(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let table = validate_name(collection)?;
        let client = self.pool.get().await?;

        let value = to_json(filter.value.clone());
        // ctid keeps this to a single row when the filter is not the key
        let result = if filter.is_id() {
            let sql = format!("DELETE FROM \"{}\" WHERE id = $1", table);
            client.execute(&sql, &[&value]).await
        } else {
            let field = validate_name(&filter.field)?;
            let sql = format!(
                "DELETE FROM \"{t}\" WHERE ctid IN \
                 (SELECT ctid FROM \"{t}\" WHERE doc -> $1::text = $2::jsonb LIMIT 1)",
                t = table
            );
            client.execute(&sql, &[&field, &value]).await
        };

        match result {
            Ok(deleted) => Ok(deleted),
            Err(e) if is_undefined_table(&e) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let table = validate_name(collection)?;
        let client = self.pool.get().await?;

        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table);
        match client.query_one(&sql, &[]).await {
            Ok(row) => {
                let count: i64 = row.get(0);
                Ok(count.max(0) as u64)
            }
            Err(e) if is_undefined_table(&e) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_unique_index(&self, collection: &str, index: &UniqueIndex) -> Result<()> {
        let table = validate_name(collection)?;
        let name = validate_name(&index.name)?;
        let columns = index
            .fields
            .iter()
            .map(|field| validate_name(field).map(|f| format!("(doc ->> '{}')", f)))
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        let client = self.pool.get().await?;
        self.create_table(&client, table).await?;

        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"{t}_{n}\" ON \"{t}\" ({c})",
            t = table,
            n = name,
            c = columns
        );
        match client.batch_execute(&sql).await {
            Ok(()) => Ok(()),
            Err(e)
                if e.code() == Some(&SqlState::DUPLICATE_TABLE)
                    || e.code() == Some(&SqlState::UNIQUE_VIOLATION) =>
            {
                // Index created concurrently by another caller
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        let table = validate_name(collection)?;
        let client = self.pool.get().await?;
        client
            .batch_execute(&format!("DROP TABLE IF EXISTS \"{}\"", table))
            .await?;
        Ok(())
    }
}
