//! SQLite adapters.

pub mod connection;
pub mod migrations;
pub mod vector_index;

pub use connection::{connect, ConnectionError, DatabaseLocation, PoolConfig};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use vector_index::SqliteVectorIndex;

use std::path::Path;

use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open the database at `path` and bring its schema up to date.
pub async fn initialize_database(path: &Path) -> Result<SqlitePool, DatabaseError> {
    open_migrated(&DatabaseLocation::File(path.to_path_buf())).await
}

/// In-memory database with all migrations applied.
pub async fn create_migrated_memory_pool() -> Result<SqlitePool, DatabaseError> {
    open_migrated(&DatabaseLocation::Memory).await
}

async fn open_migrated(location: &DatabaseLocation) -> Result<SqlitePool, DatabaseError> {
    let pool = connect(location, &PoolConfig::default()).await?;
    Migrator::new(pool.clone()).run(&all_embedded_migrations()).await?;
    Ok(pool)
}
