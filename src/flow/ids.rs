/// Identifier allocation for nodes and sub-modules
///
/// IDs are `prefix + n` with a monotonically increasing `n`. Allocators are
/// owned by the editing session (one pair per open document), resynchronized
/// from loaded data and reset when a document is created or discarded.

use crate::flow::types::FlowDocument;

pub const NODE_ID_PREFIX: &str = "node-";
pub const SUBMODULE_ID_PREFIX: &str = "sm-";

/// Monotonic counter producing `"{prefix}{n}"` identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    prefix: &'static str,
    last: u64,
}

impl IdAllocator {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, last: 0 }
    }

    /// Allocate the next identifier
    ///
    /// Returns `None` once the counter is exhausted, which only happens when a
    /// loaded document already carries the largest representable suffix.
    pub fn allocate(&mut self) -> Option<String> {
        self.last = self.last.checked_add(1)?;
        Some(format!("{}{}", self.prefix, self.last))
    }

    /// Highest suffix handed out or observed so far
    pub fn watermark(&self) -> u64 {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }

    /// Set the watermark to the largest numeric suffix among `ids`
    ///
    /// IDs without this allocator's prefix, or whose suffix is not a plain
    /// unsigned integer, are ignored. The watermark is replaced, not merged,
    /// so loading a smaller document after a larger one starts from the
    /// loaded data.
    pub fn resync<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.last = ids
            .into_iter()
            .filter_map(|id| self.suffix_of(id))
            .max()
            .unwrap_or(0);
    }

    fn suffix_of(&self, id: &str) -> Option<u64> {
        let digits = id.strip_prefix(self.prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// The two allocators a document session needs
///
/// Process and module nodes share the node counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocators {
    pub nodes: IdAllocator,
    pub submodules: IdAllocator,
}

impl Default for IdAllocators {
    fn default() -> Self {
        Self {
            nodes: IdAllocator::new(NODE_ID_PREFIX),
            submodules: IdAllocator::new(SUBMODULE_ID_PREFIX),
        }
    }
}

impl IdAllocators {
    /// Resynchronize both counters from a loaded document
    pub fn resync_from(&mut self, document: &FlowDocument) {
        self.nodes.resync(document.all_nodes().map(|n| n.id.as_str()));
        self.submodules
            .resync(document.all_submodules().map(|sm| sm.id.as_str()));
        tracing::debug!(
            "Resynchronized ID allocators: node watermark {}, sub-module watermark {}",
            self.nodes.watermark(),
            self.submodules.watermark()
        );
    }

    pub fn reset(&mut self) {
        self.nodes.reset();
        self.submodules.reset();
    }
}
