/// Sub-module lookup index and module catalog queries
///
/// Action nodes reference sub-modules by ID only. The index maps each ID to
/// the sub-module and its owning module so a link can be resolved without
/// holding a reference into the module graph; a deleted target simply
/// resolves to `None`.

use crate::flow::types::{Node, Status, SubModule};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// A sub-module paired with its parent module
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedSubModule {
    #[serde(flatten)]
    pub submodule: SubModule,
    pub module_id: String,
    pub module_label: String,
}

/// Snapshot of every sub-module in a module graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubModuleIndex {
    entries: Vec<LinkedSubModule>,
    by_id: HashMap<String, usize>,
}

impl SubModuleIndex {
    /// Build the index from the module graph, in module then sub-module order
    pub fn build(modules: &[Node]) -> Self {
        let entries: Vec<LinkedSubModule> = modules
            .iter()
            .flat_map(|module| {
                let module_label = module.data.label.clone().unwrap_or_default();
                module.submodules().iter().map(move |sm| LinkedSubModule {
                    submodule: sm.clone(),
                    module_id: module.id.clone(),
                    module_label: module_label.clone(),
                })
            })
            .collect();

        let mut by_id = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            by_id.entry(entry.submodule.id.clone()).or_insert(i);
        }

        Self { entries, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&LinkedSubModule> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// Resolve an action node's link; absent or dangling IDs resolve to `None`
    pub fn resolve(&self, link: Option<&str>) -> Option<&LinkedSubModule> {
        link.and_then(|id| self.get(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn entries(&self) -> &[LinkedSubModule] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sorted, de-duplicated module categories
pub fn module_categories(modules: &[Node]) -> Vec<String> {
    modules
        .iter()
        .filter_map(|n| n.data.category.as_deref())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Modules shown for a category tab; `None` shows all
pub fn filter_by_category<'a>(modules: &'a [Node], category: Option<&str>) -> Vec<&'a Node> {
    modules
        .iter()
        .filter(|n| match category {
            None => true,
            Some(c) => n.data.category.as_deref() == Some(c),
        })
        .collect()
}

/// A module node with its computed status, as the module view presents it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView<'a> {
    #[serde(flatten)]
    pub node: &'a Node,
    pub computed_status: Status,
}

impl<'a> From<&'a Node> for ModuleView<'a> {
    fn from(node: &'a Node) -> Self {
        Self {
            node,
            computed_status: node.effective_status(),
        }
    }
}
