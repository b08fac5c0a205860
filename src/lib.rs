/// flowtool: process and module flow editor backend
///
/// This library provides the flow document model, automatic layout, pluggable
/// flow storage and the editing session that ties them together behind an
/// HTTP API.

// Core configuration and setup
pub mod config;

// Flow document model - types, parsing, IDs, status and editing
pub mod flow;

// Automatic layout - layered process graph and module grid
pub mod layout;

// Flow storage backends - files, SQLite and memory
pub mod storage;

// Document session - current flow, load/create/delete and debounced autosave
pub mod session;

// HTTP API layer - REST endpoints over the session
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use flow::{FlowDocument, FlowEditor};
pub use server::start_server;
pub use session::FlowSession;
pub use storage::{FlowBackend, FlowStore};
