/// In-memory flow storage
///
/// Nothing survives the process. Clones share the same map.

use crate::storage::{FlowNotFound, FlowStore};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    flows: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, mainly for tests
    pub fn with_flows<I, K, V>(flows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = flows
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            flows: Arc::new(RwLock::new(map)),
        }
    }
}

impl FlowStore for MemoryStore {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.flows.read().await.keys().cloned().collect())
    }

    async fn read(&self, name: &str) -> Result<String> {
        self.flows
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| FlowNotFound(name.to_string()).into())
    }

    async fn write(&self, name: &str, text: &str) -> Result<()> {
        self.flows
            .write()
            .await
            .insert(name.to_string(), text.to_string());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.flows.write().await.remove(name);
        Ok(())
    }
}
