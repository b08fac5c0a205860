/// Backward-compatible flow document parser
///
/// Accepts both the current `{process, modules}` shape and the legacy
/// single-graph `{nodes, edges}` shape, defaulting any missing collection to
/// empty. Decoding is all-or-nothing: a document either parses completely or
/// fails with `DocumentError`, leaving the caller's state untouched.

use crate::flow::types::{Edge, FlowDocument, ModuleGraph, Node, ProcessGraph};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// The stored text could not be turned into a flow document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is unreadable: {0}")]
    Unreadable(#[from] serde_json::Error),
    #[error("document is unreadable: top-level value is not an object")]
    NotAnObject,
}

/// Parse raw document text into a `FlowDocument`
pub fn parse_flow_document(raw: &str) -> Result<FlowDocument, DocumentError> {
    let value: Value = serde_json::from_str(raw)?;
    let root = value.as_object().ok_or(DocumentError::NotAnObject)?;

    let mut document = if root.contains_key("nodes") && !root.contains_key("process") {
        tracing::debug!("Lifting legacy single-graph document into process graph");
        FlowDocument {
            process: ProcessGraph {
                nodes: list_field(root.get("nodes"))?,
                edges: list_field(root.get("edges"))?,
            },
            modules: ModuleGraph::default(),
        }
    } else {
        let process = root.get("process");
        let modules = root.get("modules");
        FlowDocument {
            process: ProcessGraph {
                nodes: list_field(process.and_then(|p| p.get("nodes")))?,
                edges: list_field(process.and_then(|p| p.get("edges")))?,
            },
            modules: ModuleGraph {
                nodes: list_field(modules.and_then(|m| m.get("nodes")))?,
            },
        }
    };

    drop_dangling_edges(&mut document.process);
    normalize_categories(&mut document.modules.nodes);

    Ok(document)
}

/// Serialize a document to the stored text form
pub fn to_document_text(document: &FlowDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string(document)
}

/// Missing and `null` collections read as empty
fn list_field<T: DeserializeOwned>(value: Option<&Value>) -> Result<Vec<T>, DocumentError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => Ok(Vec::<T>::deserialize(v)?),
    }
}

fn drop_dangling_edges(process: &mut ProcessGraph) {
    let node_ids: HashSet<&str> = process.nodes.iter().map(|n| n.id.as_str()).collect();
    let before = process.edges.len();
    let edges: Vec<Edge> = process
        .edges
        .drain(..)
        .filter(|e| node_ids.contains(e.source.as_str()) && node_ids.contains(e.target.as_str()))
        .collect();
    process.edges = edges;

    let dropped = before - process.edges.len();
    if dropped > 0 {
        tracing::warn!("Dropped {} edge(s) referencing missing nodes", dropped);
    }
}

fn normalize_categories(modules: &mut [Node]) {
    for node in modules {
        node.data.category = node
            .data
            .category
            .take()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
    }
}
