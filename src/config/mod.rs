/// Configuration management for the flowtool backend
///
/// Handles server binding, storage backend selection, and autosave timing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Storage backend configuration
    pub storage: StorageConfig,
    /// Autosave configuration
    pub autosave: AutosaveConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Which storage backend holds the named flow documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// One `<name>.json` file per flow in `flows_dir`
    Files,
    /// A single SQLite database at `database_path`
    Sqlite,
    /// Process memory only, lost on exit
    Memory,
}

impl StoreKind {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => StoreKind::Sqlite,
            "memory" => StoreKind::Memory,
            _ => StoreKind::Files,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend
    pub kind: StoreKind,
    /// Directory for the file backend (default: ".flowtool")
    pub flows_dir: String,
    /// Database file for the SQLite backend (default: ".flowtool/flows.db")
    pub database_path: String,
}

/// Autosave configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Debounce window in milliseconds; each mutation restarts it
    pub debounce_ms: u64,
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR overrides
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("FLOWTOOL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("FLOWTOOL_PORT")
                    .unwrap_or_else(|_| "3004".to_string())
                    .parse()
                    .unwrap_or(3004),
            },
            storage: StorageConfig {
                kind: std::env::var("FLOWTOOL_STORE")
                    .map(|v| StoreKind::from_env_value(&v))
                    .unwrap_or(StoreKind::Files),
                flows_dir: std::env::var("FLOWTOOL_DIR")
                    .unwrap_or_else(|_| ".flowtool".to_string()),
                database_path: std::env::var("FLOWTOOL_DATABASE")
                    .unwrap_or_else(|_| ".flowtool/flows.db".to_string()),
            },
            autosave: AutosaveConfig {
                debounce_ms: std::env::var("FLOWTOOL_AUTOSAVE_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(500),
            },
        }
    }
}
