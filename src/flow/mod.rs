/// Flow Document Layer
///
/// This module holds the flow document model and every operation on it:
/// - Type definitions (FlowDocument, Node, Edge, SubModule)
/// - Lenient parsing, including the legacy flat shape
/// - Session-scoped ID allocators
/// - Module status aggregation and the sub-module link index
/// - The editor that applies client mutations

// Core document type definitions
pub mod types;

// Text <-> document conversion with backward compatibility
pub mod parser;

// Prefix-numbered ID allocators, resynced on load
pub mod ids;

// Computed module status
pub mod status;

// Sub-module index and module catalog queries
pub mod index;

// Mutation operations over one open document
pub mod editor;

// Re-export commonly used types
pub use editor::{Connection, EdgePatch, EditError, FlowEditor, NodePatch, SubModulePatch};
pub use index::{LinkedSubModule, ModuleView, SubModuleIndex};
pub use parser::{parse_flow_document, to_document_text, DocumentError};
pub use types::{Edge, FlowDocument, Node, NodeKind, Position, Side, Status, SubModule, View};
