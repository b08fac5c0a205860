/// Core flow document type definitions
///
/// Defines the process graph (situation/action/decision/end nodes joined by
/// status-colored edges) and the module catalog (module nodes owning ordered
/// sub-modules). These types are serialized/deserialized from JSON and keep
/// any fields they do not model so a load/save cycle never drops data written
/// by the rendering client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A complete saved flow: one process graph plus one module graph
///
/// Serialized shape: `{ "process": { "nodes": [...], "edges": [...] }, "modules": { "nodes": [...] } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    /// Situation/action/decision/end nodes and the edges between them
    #[serde(default)]
    pub process: ProcessGraph,
    /// Module nodes (no edges)
    #[serde(default)]
    pub modules: ModuleGraph,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl FlowDocument {
    /// Iterate over the union of process and module nodes
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.process.nodes.iter().chain(self.modules.nodes.iter())
    }

    /// Iterate over every sub-module in the module graph, in document order
    pub fn all_submodules(&self) -> impl Iterator<Item = &SubModule> {
        self.modules.nodes.iter().flat_map(|n| n.submodules().iter())
    }

    pub fn is_empty(&self) -> bool {
        self.process.nodes.is_empty() && self.process.edges.is_empty() && self.modules.nodes.is_empty()
    }
}

/// Which of the two graphs an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Process,
    Modules,
}

/// Implementation status shared by process nodes, edges, sub-modules and modules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    New,
    Implemented,
    Deprecated,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::New => "new",
            Status::Implemented => "implemented",
            Status::Deprecated => "deprecated",
        })
    }
}

/// Node type tag
///
/// Unknown tags written by other clients are kept verbatim in `Other` so they
/// survive a round trip; they cannot be created through the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    #[default]
    Situation,
    Action,
    Decision,
    End,
    Module,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Situation => "situation",
            NodeKind::Action => "action",
            NodeKind::Decision => "decision",
            NodeKind::End => "end",
            NodeKind::Module => "module",
            NodeKind::Other(tag) => tag,
        }
    }

    /// The graph nodes of this kind live in
    pub fn view(&self) -> View {
        match self {
            NodeKind::Module => View::Modules,
            _ => View::Process,
        }
    }

    /// Kinds whose data is a single editable `label`
    pub fn is_label_only(&self) -> bool {
        matches!(self, NodeKind::Situation | NodeKind::Decision | NodeKind::End)
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "situation" => NodeKind::Situation,
            "action" => NodeKind::Action,
            "decision" => NodeKind::Decision,
            "end" => NodeKind::End,
            "module" => NodeKind::Module,
            _ => NodeKind::Other(tag),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node's top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single node in either graph
///
/// `id` and `kind` are fixed at creation; `position` is rewritten by layout or
/// manual moves; `data` is edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique across both graphs (e.g., "node-12")
    pub id: String,
    /// Node type; a missing tag reads as a situation
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
    /// Client-side fields (measured size, selection flags, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create a node with the kind's default data
    ///
    /// Returns `None` for `NodeKind::Other`, which has no known shape.
    pub fn new(id: String, kind: NodeKind, position: Position) -> Option<Self> {
        let data = NodeData::default_for(&kind)?;
        Some(Self {
            id,
            kind,
            position,
            data,
            extra: Map::new(),
        })
    }

    /// Sub-modules owned by a module node; empty for every other kind
    pub fn submodules(&self) -> &[SubModule] {
        self.data.submodules.as_deref().unwrap_or(&[])
    }
}

/// Union of the per-kind node payloads
///
/// - situation / decision / end: `label`, `status`
/// - action: `description`, `subModuleId`, `status`
/// - module: `label`, `description`, `category`, `status` (deprecated override only), `submodules`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Module grouping; absent means uncategorized, never an empty string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Weak link from an action node to a sub-module by ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_module_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodules: Option<Vec<SubModule>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeData {
    /// Data a freshly dropped node of `kind` starts with
    pub fn default_for(kind: &NodeKind) -> Option<Self> {
        let data = match kind {
            NodeKind::Situation => Self::labelled("New situation"),
            NodeKind::Decision => Self::labelled("New decision"),
            NodeKind::End => Self::labelled("End"),
            NodeKind::Action => Self {
                description: Some(String::new()),
                ..Self::default()
            },
            NodeKind::Module => Self {
                label: Some("New module".to_string()),
                description: Some(String::new()),
                submodules: Some(Vec::new()),
                ..Self::default()
            },
            NodeKind::Other(_) => return None,
        };
        Some(data)
    }

    fn labelled(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::default()
        }
    }
}

/// A unit of work owned by exactly one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubModule {
    /// Unique across the whole module graph (e.g., "sm-3")
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl SubModule {
    pub fn new(id: String) -> Self {
        Self {
            id,
            label: "New sub-module".to_string(),
            description: String::new(),
            steps: Vec::new(),
            status: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status.unwrap_or_default()
    }
}

/// Side of a node an edge attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Directed, labeled connection between two process nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    /// Source node ID
    pub source: String,
    /// Target node ID
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Connection identifier in the form the canvas client generates:
    /// `xy-edge__{source}{sourceHandle}-{target}{targetHandle}`
    pub fn connection_id(
        source: &str,
        source_handle: Option<Side>,
        target: &str,
        target_handle: Option<Side>,
    ) -> String {
        format!(
            "xy-edge__{}{}-{}{}",
            source,
            source_handle.map(|s| s.as_str()).unwrap_or(""),
            target,
            target_handle.map(|s| s.as_str()).unwrap_or(""),
        )
    }

    pub fn status(&self) -> Status {
        self.data.as_ref().and_then(|d| d.status).unwrap_or_default()
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
