/// SQLite persistence for flow documents
///
/// All flows share one `flows` table keyed by name. The document text is
/// stored as-is; decoding stays with the session so a malformed row is
/// reported the same way as a malformed file.

use crate::storage::{FlowNotFound, FlowStore};
use anyhow::{anyhow, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Row,
};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// SQLite connection pool for the flows database
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file and its schema
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow!("Failed to create database directory '{}': {}", parent.display(), e)
            })?;
        }

        tracing::info!("Opening flow database: {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the flows table; safe to call repeatedly
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flows (
                name TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl FlowStore for SqliteStore {
    async fn list(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM flows ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn read(&self, name: &str) -> Result<String> {
        let row = sqlx::query("SELECT document FROM flows WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.get("document")),
            None => Err(FlowNotFound(name.to_string()).into()),
        }
    }

    /// Insert or overwrite; `updated_at` tracks the latest write
    async fn write(&self, name: &str, text: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flows (name, document, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(name) DO UPDATE SET
                document = excluded.document,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(name)
        .bind(text)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM flows WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("Delete of absent flow '{}' ignored", name);
        }
        Ok(())
    }
}
