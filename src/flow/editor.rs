/// Document editor: every mutation the canvas client can make
///
/// The editor owns one `FlowDocument` and the ID allocators scoped to it.
/// Entities are created with the next allocator value, mutated in place by
/// ID, and deleted by filtering them out of their owning sequence.

use crate::flow::ids::IdAllocators;
use crate::flow::index::SubModuleIndex;
use crate::flow::types::{
    Edge, EdgeData, FlowDocument, Node, NodeKind, Position, Side, Status, SubModule, View,
};
use crate::layout::{self, FlowDirection};
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Why an edit was rejected; the document is unchanged whenever one is returned
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditError {
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("edge not found: {0}")]
    EdgeNotFound(String),
    #[error("sub-module not found: {0}")]
    SubModuleNotFound(String),
    #[error("cannot {operation} on {kind} node {id}")]
    WrongKind {
        id: String,
        kind: NodeKind,
        operation: &'static str,
    },
    #[error("node type '{0}' cannot be created")]
    UnsupportedKind(String),
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("step must not be empty")]
    EmptyStep,
    #[error("sub-module {id} has no step {index}")]
    StepOutOfRange { id: String, index: usize },
    #[error("no {0} identifiers left")]
    IdsExhausted(&'static str),
}

/// A new connection drawn between two process nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<Side>,
    #[serde(default)]
    pub target_handle: Option<Side>,
}

/// Field-level node update; only present fields are applied
///
/// `sub_module_id` of `""` clears an action's link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub deprecated: Option<bool>,
    #[serde(default)]
    pub sub_module_id: Option<String>,
}

/// Edge update; `label` of `""` clears the label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubModulePatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default)]
pub struct FlowEditor {
    document: FlowDocument,
    ids: IdAllocators,
}

impl FlowEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a loaded document and resynchronize the allocators
    pub fn from_document(document: FlowDocument) -> Self {
        let mut editor = Self::default();
        editor.replace(document);
        editor
    }

    pub fn document(&self) -> &FlowDocument {
        &self.document
    }

    pub fn ids(&self) -> &IdAllocators {
        &self.ids
    }

    /// Swap in a whole document at once (load)
    pub fn replace(&mut self, document: FlowDocument) {
        self.ids.resync_from(&document);
        self.document = document;
    }

    /// Empty document with both allocators back at zero (create / discard)
    pub fn reset(&mut self) {
        self.document = FlowDocument::default();
        self.ids.reset();
    }

    pub fn submodule_index(&self) -> SubModuleIndex {
        SubModuleIndex::build(&self.document.modules.nodes)
    }

    // ----- nodes -----

    /// Drop a new node of `kind` at `position`
    ///
    /// Module nodes go to the module graph, every other kind to the process graph.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> Result<Node, EditError> {
        if let NodeKind::Other(tag) = &kind {
            return Err(EditError::UnsupportedKind(tag.clone()));
        }
        let id = self.ids.nodes.allocate().ok_or(EditError::IdsExhausted("node"))?;
        let node = Node::new(id, kind, position)
            .ok_or_else(|| EditError::UnsupportedKind(String::new()))?;

        match node.kind.view() {
            View::Process => self.document.process.nodes.push(node.clone()),
            View::Modules => self.document.modules.nodes.push(node.clone()),
        }
        Ok(node)
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), EditError> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    /// Apply a field-level update atomically
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<Node, EditError> {
        let mut node = self.node(id)?.clone();

        if let Some(label) = patch.label {
            set_label(&mut node, &label)?;
        }
        if let Some(description) = patch.description {
            set_description(&mut node, description)?;
        }
        if let Some(category) = patch.category {
            require_kind(&node, NodeKind::Module, "set category")?;
            let trimmed = category.trim();
            node.data.category = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(status) = patch.status {
            if node.kind == NodeKind::Module {
                return Err(wrong_kind(&node, "set status"));
            }
            node.data.status = Some(status);
        }
        if let Some(deprecated) = patch.deprecated {
            require_kind(&node, NodeKind::Module, "toggle deprecated")?;
            node.data.status = deprecated.then_some(Status::Deprecated);
        }
        if let Some(link) = patch.sub_module_id {
            require_kind(&node, NodeKind::Action, "link a sub-module")?;
            node.data.sub_module_id = if link.is_empty() {
                None
            } else if self.submodule_index().contains(&link) {
                Some(link)
            } else {
                return Err(EditError::SubModuleNotFound(link));
            };
        }

        *self.node_mut(id)? = node.clone();
        Ok(node)
    }

    /// Remove a node and every edge touching it
    pub fn delete_node(&mut self, id: &str) -> Result<Node, EditError> {
        if let Some(pos) = self.document.process.nodes.iter().position(|n| n.id == id) {
            let node = self.document.process.nodes.remove(pos);
            self.document.process.edges.retain(|e| !e.touches(id));
            return Ok(node);
        }
        if let Some(pos) = self.document.modules.nodes.iter().position(|n| n.id == id) {
            return Ok(self.document.modules.nodes.remove(pos));
        }
        Err(EditError::NodeNotFound(id.to_string()))
    }

    // ----- edges -----

    /// Connect two process nodes; an identical existing connection is kept as is
    pub fn connect(&mut self, connection: Connection) -> Result<Edge, EditError> {
        for endpoint in [&connection.source, &connection.target] {
            if !self.document.process.nodes.iter().any(|n| &n.id == endpoint) {
                return Err(EditError::NodeNotFound(endpoint.clone()));
            }
        }

        let existing = self.document.process.edges.iter().find(|e| {
            e.source == connection.source
                && e.target == connection.target
                && e.source_handle == connection.source_handle
                && e.target_handle == connection.target_handle
        });
        if let Some(edge) = existing {
            return Ok(edge.clone());
        }

        let edge = Edge {
            id: Edge::connection_id(
                &connection.source,
                connection.source_handle,
                &connection.target,
                connection.target_handle,
            ),
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            label: None,
            data: None,
            extra: Map::new(),
        };
        self.document.process.edges.push(edge.clone());
        Ok(edge)
    }

    pub fn update_edge(&mut self, id: &str, patch: EdgePatch) -> Result<Edge, EditError> {
        let edge = self
            .document
            .process
            .edges
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EditError::EdgeNotFound(id.to_string()))?;

        if let Some(label) = patch.label {
            edge.label = (!label.is_empty()).then_some(label);
        }
        if let Some(status) = patch.status {
            edge.data.get_or_insert_with(EdgeData::default).status = Some(status);
        }
        Ok(edge.clone())
    }

    pub fn delete_edge(&mut self, id: &str) -> Result<Edge, EditError> {
        let pos = self
            .document
            .process
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EditError::EdgeNotFound(id.to_string()))?;
        Ok(self.document.process.edges.remove(pos))
    }

    // ----- sub-modules -----

    pub fn add_submodule(&mut self, module_id: &str) -> Result<SubModule, EditError> {
        let module = self.node(module_id)?;
        require_kind(module, NodeKind::Module, "add a sub-module")?;

        let id = self
            .ids
            .submodules
            .allocate()
            .ok_or(EditError::IdsExhausted("sub-module"))?;
        let submodule = SubModule::new(id);
        self.node_mut(module_id)?
            .data
            .submodules
            .get_or_insert_with(Vec::new)
            .push(submodule.clone());
        Ok(submodule)
    }

    pub fn update_submodule(
        &mut self,
        id: &str,
        patch: SubModulePatch,
    ) -> Result<SubModule, EditError> {
        let label = match patch.label.as_deref().map(str::trim) {
            Some("") => return Err(EditError::EmptyLabel),
            other => other.map(str::to_string),
        };

        let submodule = self.submodule_mut(id)?;
        if let Some(label) = label {
            submodule.label = label;
        }
        if let Some(description) = patch.description {
            submodule.description = description.trim().to_string();
        }
        if let Some(status) = patch.status {
            submodule.status = Some(status);
        }
        Ok(submodule.clone())
    }

    pub fn delete_submodule(&mut self, id: &str) -> Result<SubModule, EditError> {
        for module in &mut self.document.modules.nodes {
            if let Some(submodules) = module.data.submodules.as_mut() {
                if let Some(pos) = submodules.iter().position(|sm| sm.id == id) {
                    return Ok(submodules.remove(pos));
                }
            }
        }
        Err(EditError::SubModuleNotFound(id.to_string()))
    }

    pub fn add_step(&mut self, id: &str, text: &str) -> Result<SubModule, EditError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EditError::EmptyStep);
        }
        let submodule = self.submodule_mut(id)?;
        submodule.steps.push(text.to_string());
        Ok(submodule.clone())
    }

    /// Rewrite step `index`; an empty value removes the step
    pub fn update_step(&mut self, id: &str, index: usize, text: &str) -> Result<SubModule, EditError> {
        let submodule = self.submodule_mut(id)?;
        if index >= submodule.steps.len() {
            return Err(EditError::StepOutOfRange {
                id: id.to_string(),
                index,
            });
        }

        let text = text.trim();
        if text.is_empty() {
            submodule.steps.remove(index);
        } else {
            submodule.steps[index] = text.to_string();
        }
        Ok(submodule.clone())
    }

    // ----- layout -----

    /// Re-position every node of one graph
    ///
    /// Returns the detected flow direction for the process graph, `None` for
    /// the module grid.
    pub fn arrange(&mut self, view: View) -> Option<FlowDirection> {
        match view {
            View::Process => Some(layout::arrange_process(
                &mut self.document.process.nodes,
                &self.document.process.edges,
            )),
            View::Modules => {
                layout::arrange_grid(&mut self.document.modules.nodes);
                None
            }
        }
    }

    // ----- lookup -----

    fn node(&self, id: &str) -> Result<&Node, EditError> {
        self.document
            .all_nodes()
            .find(|n| n.id == id)
            .ok_or_else(|| EditError::NodeNotFound(id.to_string()))
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, EditError> {
        self.document
            .process
            .nodes
            .iter_mut()
            .chain(self.document.modules.nodes.iter_mut())
            .find(|n| n.id == id)
            .ok_or_else(|| EditError::NodeNotFound(id.to_string()))
    }

    fn submodule_mut(&mut self, id: &str) -> Result<&mut SubModule, EditError> {
        self.document
            .modules
            .nodes
            .iter_mut()
            .filter_map(|n| n.data.submodules.as_mut())
            .flat_map(|sms| sms.iter_mut())
            .find(|sm| sm.id == id)
            .ok_or_else(|| EditError::SubModuleNotFound(id.to_string()))
    }
}

fn wrong_kind(node: &Node, operation: &'static str) -> EditError {
    EditError::WrongKind {
        id: node.id.clone(),
        kind: node.kind.clone(),
        operation,
    }
}

fn require_kind(node: &Node, kind: NodeKind, operation: &'static str) -> Result<(), EditError> {
    if node.kind == kind {
        Ok(())
    } else {
        Err(wrong_kind(node, operation))
    }
}

fn set_label(node: &mut Node, label: &str) -> Result<(), EditError> {
    if !(node.kind.is_label_only() || node.kind == NodeKind::Module) {
        return Err(wrong_kind(node, "set label"));
    }
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(EditError::EmptyLabel);
    }
    node.data.label = Some(trimmed.to_string());
    Ok(())
}

fn set_description(node: &mut Node, description: String) -> Result<(), EditError> {
    match node.kind {
        NodeKind::Action => node.data.description = Some(description),
        NodeKind::Module => node.data.description = Some(description.trim().to_string()),
        _ => return Err(wrong_kind(node, "set description")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: f64, y: f64) -> Position {
        Position::new(x, y)
    }

    fn connect(editor: &mut FlowEditor, source: &str, target: &str) -> Edge {
        editor
            .connect(Connection {
                source: source.into(),
                target: target.into(),
                source_handle: Some(Side::Bottom),
                target_handle: Some(Side::Top),
            })
            .unwrap()
    }

    #[test]
    fn nodes_share_one_counter_across_graphs() {
        let mut editor = FlowEditor::new();
        let a = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap();
        let m = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap();
        let b = editor.add_node(NodeKind::Action, pos(0.0, 0.0)).unwrap();

        assert_eq!((a.id.as_str(), m.id.as_str(), b.id.as_str()), ("node-1", "node-2", "node-3"));
        assert_eq!(editor.document().process.nodes.len(), 2);
        assert_eq!(editor.document().modules.nodes.len(), 1);
        assert_eq!(a.data.label.as_deref(), Some("New situation"));
    }

    #[test]
    fn unknown_kinds_cannot_be_created() {
        let mut editor = FlowEditor::new();
        let err = editor
            .add_node(NodeKind::Other("note".into()), pos(0.0, 0.0))
            .unwrap_err();
        assert_eq!(err, EditError::UnsupportedKind("note".into()));
        assert_eq!(editor.ids().nodes.watermark(), 0);
    }

    #[test]
    fn ids_continue_after_loaded_watermark() {
        let mut document = FlowDocument::default();
        document
            .process
            .nodes
            .push(Node::new("node-41".into(), NodeKind::End, pos(0.0, 0.0)).unwrap());
        let mut editor = FlowEditor::from_document(document);

        let node = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap();
        assert_eq!(node.id, "node-42");
    }

    #[test]
    fn maximal_loaded_id_rejects_new_nodes_without_panicking() {
        let mut document = FlowDocument::default();
        document.process.nodes.push(
            Node::new("node-18446744073709551615".into(), NodeKind::End, pos(0.0, 0.0)).unwrap(),
        );
        let mut editor = FlowEditor::from_document(document);

        let err = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap_err();
        assert_eq!(err, EditError::IdsExhausted("node"));
        assert_eq!(editor.document().process.nodes.len(), 1);
    }

    #[test]
    fn labels_are_trimmed_and_never_empty() {
        let mut editor = FlowEditor::new();
        let id = editor.add_node(NodeKind::Decision, pos(0.0, 0.0)).unwrap().id;

        let node = editor
            .update_node(&id, NodePatch { label: Some("  Paid?  ".into()), ..Default::default() })
            .unwrap();
        assert_eq!(node.data.label.as_deref(), Some("Paid?"));

        let err = editor
            .update_node(&id, NodePatch { label: Some("   ".into()), ..Default::default() })
            .unwrap_err();
        assert_eq!(err, EditError::EmptyLabel);
        assert_eq!(editor.document().process.nodes[0].data.label.as_deref(), Some("Paid?"));
    }

    #[test]
    fn action_description_is_kept_verbatim() {
        let mut editor = FlowEditor::new();
        let id = editor.add_node(NodeKind::Action, pos(0.0, 0.0)).unwrap().id;
        let text = "- first\n  - nested \n";
        let node = editor
            .update_node(&id, NodePatch { description: Some(text.into()), ..Default::default() })
            .unwrap();
        assert_eq!(node.data.description.as_deref(), Some(text));
    }

    #[test]
    fn rejected_patch_changes_nothing() {
        let mut editor = FlowEditor::new();
        let id = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap().id;
        let err = editor
            .update_node(
                &id,
                NodePatch {
                    label: Some("Renamed".into()),
                    category: Some("core".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, EditError::WrongKind { .. }));
        assert_eq!(
            editor.document().process.nodes[0].data.label.as_deref(),
            Some("New situation")
        );
    }

    #[test]
    fn module_category_and_deprecated_override() {
        let mut editor = FlowEditor::new();
        let id = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;

        let node = editor
            .update_node(&id, NodePatch { category: Some(" billing ".into()), ..Default::default() })
            .unwrap();
        assert_eq!(node.data.category.as_deref(), Some("billing"));

        let node = editor
            .update_node(&id, NodePatch { category: Some("  ".into()), ..Default::default() })
            .unwrap();
        assert_eq!(node.data.category, None);

        let node = editor
            .update_node(&id, NodePatch { deprecated: Some(true), ..Default::default() })
            .unwrap();
        assert_eq!(node.effective_status(), Status::Deprecated);

        let node = editor
            .update_node(&id, NodePatch { deprecated: Some(false), ..Default::default() })
            .unwrap();
        assert_eq!(node.data.status, None);

        let err = editor
            .update_node(&id, NodePatch { status: Some(Status::Implemented), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, EditError::WrongKind { .. }));
    }

    #[test]
    fn deleting_a_node_removes_its_edges() {
        let mut editor = FlowEditor::new();
        let a = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap().id;
        let b = editor.add_node(NodeKind::Action, pos(0.0, 0.0)).unwrap().id;
        let c = editor.add_node(NodeKind::End, pos(0.0, 0.0)).unwrap().id;
        connect(&mut editor, &a, &b);
        connect(&mut editor, &b, &c);
        connect(&mut editor, &a, &c);

        editor.delete_node(&b).unwrap();
        let edges = &editor.document().process.edges;
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].source.as_str(), edges[0].target.as_str()), (a.as_str(), c.as_str()));
        assert_eq!(editor.delete_node(&b), Err(EditError::NodeNotFound(b)));
    }

    #[test]
    fn duplicate_connection_is_not_added_twice() {
        let mut editor = FlowEditor::new();
        let a = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap().id;
        let b = editor.add_node(NodeKind::End, pos(0.0, 0.0)).unwrap().id;

        let first = connect(&mut editor, &a, &b);
        let second = connect(&mut editor, &a, &b);
        assert_eq!(first.id, "xy-edge__node-1bottom-node-2top");
        assert_eq!(first, second);
        assert_eq!(editor.document().process.edges.len(), 1);
    }

    #[test]
    fn connection_requires_process_endpoints() {
        let mut editor = FlowEditor::new();
        let a = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap().id;
        let m = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;
        let err = editor
            .connect(Connection {
                source: a,
                target: m.clone(),
                source_handle: None,
                target_handle: None,
            })
            .unwrap_err();
        assert_eq!(err, EditError::NodeNotFound(m));
    }

    #[test]
    fn edge_label_and_status() {
        let mut editor = FlowEditor::new();
        let a = editor.add_node(NodeKind::Decision, pos(0.0, 0.0)).unwrap().id;
        let b = editor.add_node(NodeKind::End, pos(0.0, 0.0)).unwrap().id;
        let id = connect(&mut editor, &a, &b).id;

        let edge = editor
            .update_edge(&id, EdgePatch { label: Some("yes".into()), status: Some(Status::Implemented) })
            .unwrap();
        assert_eq!(edge.label.as_deref(), Some("yes"));
        assert_eq!(edge.status(), Status::Implemented);

        let edge = editor
            .update_edge(&id, EdgePatch { label: Some(String::new()), status: None })
            .unwrap();
        assert_eq!(edge.label, None);
        assert_eq!(edge.status(), Status::Implemented);

        editor.delete_edge(&id).unwrap();
        assert!(editor.document().process.edges.is_empty());
    }

    #[test]
    fn submodule_ids_are_global_across_modules() {
        let mut editor = FlowEditor::new();
        let m1 = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;
        let m2 = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;

        assert_eq!(editor.add_submodule(&m1).unwrap().id, "sm-1");
        assert_eq!(editor.add_submodule(&m2).unwrap().id, "sm-2");
        assert_eq!(editor.add_submodule(&m1).unwrap().id, "sm-3");

        let situation = editor.add_node(NodeKind::Situation, pos(0.0, 0.0)).unwrap().id;
        assert!(matches!(
            editor.add_submodule(&situation),
            Err(EditError::WrongKind { .. })
        ));
    }

    #[test]
    fn submodule_steps_edit_and_remove() {
        let mut editor = FlowEditor::new();
        let m = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;
        let sm = editor.add_submodule(&m).unwrap().id;

        editor.add_step(&sm, " design schema ").unwrap();
        editor.add_step(&sm, "write migration").unwrap();
        assert_eq!(editor.add_step(&sm, "  "), Err(EditError::EmptyStep));

        let updated = editor.update_step(&sm, 1, " run migration ").unwrap();
        assert_eq!(updated.steps, ["design schema", "run migration"]);

        let updated = editor.update_step(&sm, 0, "").unwrap();
        assert_eq!(updated.steps, ["run migration"]);

        assert_eq!(
            editor.update_step(&sm, 5, "x"),
            Err(EditError::StepOutOfRange { id: sm.clone(), index: 5 })
        );
    }

    #[test]
    fn submodule_patch_trims_and_sets_status() {
        let mut editor = FlowEditor::new();
        let m = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;
        let sm = editor.add_submodule(&m).unwrap().id;

        let updated = editor
            .update_submodule(
                &sm,
                SubModulePatch {
                    label: Some(" Invoices ".into()),
                    description: Some(" monthly run ".into()),
                    status: Some(Status::Implemented),
                },
            )
            .unwrap();
        assert_eq!(updated.label, "Invoices");
        assert_eq!(updated.description, "monthly run");
        assert_eq!(updated.status(), Status::Implemented);

        let err = editor
            .update_submodule(&sm, SubModulePatch { label: Some(" ".into()), ..Default::default() })
            .unwrap_err();
        assert_eq!(err, EditError::EmptyLabel);
    }

    #[test]
    fn action_link_survives_submodule_deletion_as_dangling() {
        let mut editor = FlowEditor::new();
        let m = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;
        let sm = editor.add_submodule(&m).unwrap().id;
        let action = editor.add_node(NodeKind::Action, pos(0.0, 0.0)).unwrap().id;

        editor
            .update_node(&action, NodePatch { sub_module_id: Some(sm.clone()), ..Default::default() })
            .unwrap();
        assert!(editor.submodule_index().resolve(Some(&sm)).is_some());

        editor.delete_submodule(&sm).unwrap();
        let link = editor.document().process.nodes[0].data.sub_module_id.clone();
        assert_eq!(link.as_deref(), Some(sm.as_str()));
        assert!(editor.submodule_index().resolve(link.as_deref()).is_none());
    }

    #[test]
    fn linking_requires_existing_submodule_and_empty_clears() {
        let mut editor = FlowEditor::new();
        let action = editor.add_node(NodeKind::Action, pos(0.0, 0.0)).unwrap().id;
        let err = editor
            .update_node(&action, NodePatch { sub_module_id: Some("sm-9".into()), ..Default::default() })
            .unwrap_err();
        assert_eq!(err, EditError::SubModuleNotFound("sm-9".into()));

        let node = editor
            .update_node(&action, NodePatch { sub_module_id: Some(String::new()), ..Default::default() })
            .unwrap();
        assert_eq!(node.data.sub_module_id, None);
    }

    #[test]
    fn reset_clears_document_and_counters() {
        let mut editor = FlowEditor::new();
        let m = editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id;
        editor.add_submodule(&m).unwrap();

        editor.reset();
        assert!(editor.document().is_empty());
        assert_eq!(editor.add_node(NodeKind::Module, pos(0.0, 0.0)).unwrap().id, "node-1");
        assert_eq!(editor.add_submodule("node-1").unwrap().id, "sm-1");
    }

    #[test]
    fn arrange_modules_tiles_grid() {
        let mut editor = FlowEditor::new();
        for _ in 0..4 {
            editor.add_node(NodeKind::Module, pos(13.0, 7.0)).unwrap();
        }
        assert_eq!(editor.arrange(View::Modules), None);
        let positions: Vec<Position> =
            editor.document().modules.nodes.iter().map(|n| n.position).collect();
        assert_eq!(
            positions,
            [pos(0.0, 0.0), pos(400.0, 0.0), pos(800.0, 0.0), pos(0.0, 320.0)]
        );
    }
}
