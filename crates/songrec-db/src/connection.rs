//! Database connection management

use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use serde::{Deserialize, Serialize};
use tokio_postgres::NoTls;

use crate::error::{Result, StoreError};

pub type DbPool = Pool;

/// PostgreSQL connection parameters.
///
/// Passed explicitly to the store constructor; nothing is read from the
/// environment. Without credentials the connection is attempted
/// unauthenticated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            user: None,
            password: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    5432
}
fn default_database() -> String {
    "song_recognition".to_string()
}
fn default_max_connections() -> u32 {
    10
}

impl DatabaseConfig {
    /// Connection URL with the password masked, for diagnostics
    pub fn connection_string(&self) -> String {
        match &self.user {
            Some(user) => {
                let password = if self.password.is_some() { ":***" } else { "" };
                format!(
                    "postgresql://{}{}@{}:{}/{}",
                    user, password, self.host, self.port, self.database
                )
            }
            None => format!("postgresql://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

/// Create a PostgreSQL connection pool
pub fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.dbname = Some(config.database.clone());
    cfg.user = config.user.clone();
    cfg.password = config.password.clone();

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(config.max_connections.max(1) as usize));

    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

    Ok(pool)
}

/// Test database connection
pub async fn test_connection(pool: &DbPool) -> Result<()> {
    let client = pool.get().await?;
    let row = client.query_one("SELECT 1 as test", &[]).await?;
    let test: i32 = row.get(0);

    if test == 1 {
        Ok(())
    } else {
        Err(StoreError::Unavailable(format!(
            "connection check returned {}",
            test
        )))
    }
}
