/// Effective status derivation
///
/// A module's status is computed from its sub-modules on every read and never
/// stored; only the manual deprecated override is persisted.

use crate::flow::types::{Node, NodeData, NodeKind, Status};

/// Status of a module computed from its own override and its sub-modules
///
/// - deprecated override wins
/// - no sub-modules reads as new
/// - every sub-module implemented reads as implemented
/// - anything else reads as new
pub fn module_status(data: &NodeData) -> Status {
    if data.status == Some(Status::Deprecated) {
        return Status::Deprecated;
    }
    match data.submodules.as_deref() {
        None | Some([]) => Status::New,
        Some(submodules) if submodules.iter().all(|sm| sm.status() == Status::Implemented) => {
            Status::Implemented
        }
        Some(_) => Status::New,
    }
}

impl Node {
    /// Status as displayed: computed for modules, stored for everything else
    pub fn effective_status(&self) -> Status {
        match self.kind {
            NodeKind::Module => module_status(&self.data),
            _ => self.data.status.unwrap_or_default(),
        }
    }
}
