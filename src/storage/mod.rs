/// Flow Storage Layer
///
/// Named flow documents are persisted as opaque text by a storage backend.
/// The session only ever needs four calls, captured by `FlowStore`:
/// - `list`: names of every stored flow
/// - `read`: raw document text, failing if absent or unreadable
/// - `write`: replace the whole document
/// - `delete`: remove the document (absent is not an error)

// One JSON file per flow in a directory
pub mod files;

// SQLite persistence with sqlx
pub mod sqlite;

// Process-local map, used by tests and the `memory` setting
pub mod memory;

pub use files::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{StorageConfig, StoreKind};
use anyhow::Result;
use std::future::Future;

/// `read` of a flow that is not stored
///
/// Backends return it inside their `anyhow::Error` so callers can tell a
/// missing flow apart from an unreadable one.
#[derive(Debug, thiserror::Error)]
#[error("flow not found: {0}")]
pub struct FlowNotFound(pub String);

/// Storage backend contract for named flow documents
pub trait FlowStore: Send + Sync + 'static {
    fn list(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn read(&self, name: &str) -> impl Future<Output = Result<String>> + Send;

    fn write(&self, name: &str, text: &str) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Backend chosen at startup from `StorageConfig`
#[derive(Debug, Clone)]
pub enum FlowBackend {
    Files(FileStore),
    Sqlite(SqliteStore),
    Memory(MemoryStore),
}

impl FlowBackend {
    /// Open the configured backend, creating directories and schema as needed
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let backend = match config.kind {
            StoreKind::Files => FlowBackend::Files(FileStore::new(&config.flows_dir)),
            StoreKind::Sqlite => FlowBackend::Sqlite(SqliteStore::open(&config.database_path).await?),
            StoreKind::Memory => FlowBackend::Memory(MemoryStore::new()),
        };
        tracing::info!("Using {:?} flow storage", config.kind);
        Ok(backend)
    }
}

impl FlowStore for FlowBackend {
    async fn list(&self) -> Result<Vec<String>> {
        match self {
            FlowBackend::Files(store) => store.list().await,
            FlowBackend::Sqlite(store) => store.list().await,
            FlowBackend::Memory(store) => store.list().await,
        }
    }

    async fn read(&self, name: &str) -> Result<String> {
        match self {
            FlowBackend::Files(store) => store.read(name).await,
            FlowBackend::Sqlite(store) => store.read(name).await,
            FlowBackend::Memory(store) => store.read(name).await,
        }
    }

    async fn write(&self, name: &str, text: &str) -> Result<()> {
        match self {
            FlowBackend::Files(store) => store.write(name, text).await,
            FlowBackend::Sqlite(store) => store.write(name, text).await,
            FlowBackend::Memory(store) => store.write(name, text).await,
        }
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match self {
            FlowBackend::Files(store) => store.delete(name).await,
            FlowBackend::Sqlite(store) => store.delete(name).await,
            FlowBackend::Memory(store) => store.delete(name).await,
        }
    }
}
