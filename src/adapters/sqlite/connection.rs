//! Pool setup for the vector database.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to open {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to create database directory {0}: {1}")]
    Directory(PathBuf, #[source] std::io::Error),
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// Private to one connection, gone when the pool closes
    Memory,
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(3),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

/// Open a pool at `location`.
///
/// File databases run in WAL mode and are created along with their parent
/// directory. Memory databases use exactly one connection that never
/// expires, otherwise each new connection would see an empty schema.
pub async fn connect(location: &DatabaseLocation, config: &PoolConfig) -> Result<SqlitePool, ConnectionError> {
    let (options, pool_options) = match location {
        DatabaseLocation::File(path) => {
            create_parent_dir(path)?;
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(config.busy_timeout);
            let pool_options = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout);
            (options, pool_options)
        }
        DatabaseLocation::Memory => {
            let options = SqliteConnectOptions::new().in_memory(true);
            let pool_options = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            (options, pool_options)
        }
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(|source| ConnectionError::Open {
            location: location.to_string(),
            source,
        })
}

fn create_parent_dir(path: &Path) -> Result<(), ConnectionError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| ConnectionError::Directory(parent.to_path_buf(), e)),
        _ => Ok(()),
    }
}
