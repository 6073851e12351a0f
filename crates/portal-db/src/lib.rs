//! # portal-db
//!
//! Storage layer for the study portal.
//!
//! This crate provides:
//! - Connection pool management
//! - The PostgreSQL document store for note records
//! - The filesystem object store for uploaded files
//! - In-memory stores behind the `memory` feature
//!
//! ## Example
//!
//! ```rust,ignore
//! use portal_db::{Database, NoteRecordRepository, NoteStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/portal").await?;
//!     let pending = db.notes.list_by_status(NoteStatus::Pending, 50, 0).await?;
//!     println!("{} notes waiting for review", pending.len());
//!     Ok(())
//! }
//! ```
pub mod file_storage;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod notes;
pub mod pool;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use portal_core::*;

pub use file_storage::{FilesystemBackend, WRITE_CHUNK_BYTES};
#[cfg(any(test, feature = "memory"))]
pub use memory::{InMemoryNoteRepository, InMemoryObjectStore};
pub use notes::PgNoteRecordRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Combined database context.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note record repository.
    pub notes: PgNoteRecordRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRecordRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
