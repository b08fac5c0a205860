/// Document Session Layer
///
/// Bridges the in-memory editor and a storage backend:
/// - one current flow at a time, loaded, created or deleted by name
/// - every edit goes through the editor and is then observed by autosave
/// - the flow list and the sub-module index are published through ArcSwap
///   so readers never wait on the editor lock
///
/// Storage failures never corrupt the open document. A failed load leaves the
/// previous state untouched; failed writes and deletes are logged and
/// otherwise ignored.

// Debounced save scheduling with the skip-next guard
pub mod autosave;

pub use autosave::{Autosave, SaveOutcome};

use crate::flow::{
    parse_flow_document, to_document_text, DocumentError, EditError, FlowDocument, FlowEditor,
    SubModuleIndex, View,
};
use crate::layout::FlowDirection;
use crate::storage::{FlowNotFound, FlowStore};
use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("flow '{name}' is unreadable: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: DocumentError,
    },
    #[error("flow '{0}' not found")]
    NotFound(String),
    #[error("failed to read flow '{name}': {source:#}")]
    Storage {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("no flow is open")]
    NoCurrentFlow,
    #[error("invalid flow name '{0}'")]
    InvalidName(String),
    #[error("flow '{0}' already exists")]
    FlowExists(String),
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Normalize a user-entered flow name: trim, lowercase, and map anything
/// outside `[a-z0-9_-]` to `-`
pub fn sanitize_flow_name(requested: &str) -> Result<String, SessionError> {
    let name: String = requested
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .collect();

    if name.is_empty() {
        return Err(SessionError::InvalidName(requested.to_string()));
    }
    Ok(name)
}

/// Snapshot of the open flow
#[derive(Debug, Clone, Serialize)]
pub struct OpenDocument {
    pub name: Option<String>,
    pub document: FlowDocument,
}

/// Current flow plus the latest autosave outcome
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub current_flow: Option<String>,
    pub save_pending: bool,
    pub last_save: Option<SaveOutcome>,
}

#[derive(Debug)]
struct SessionState<S: FlowStore> {
    editor: FlowEditor,
    current: Option<String>,
    autosave: Autosave<S>,
}

impl<S: FlowStore> SessionState<S> {
    /// Install a whole document without scheduling a save for it
    ///
    /// A save still scheduled for the outgoing flow is written first, under
    /// that flow's own name.
    async fn replace(&mut self, name: Option<String>, document: Option<FlowDocument>) {
        self.autosave.flush().await;
        match document {
            Some(document) => self.editor.replace(document),
            None => self.editor.reset(),
        }
        self.current = name;
        self.autosave.skip_next();
        self.autosave
            .observe(self.current.as_deref(), self.editor.document());
    }
}

pub struct FlowSession<S: FlowStore> {
    store: Arc<S>,
    state: Mutex<SessionState<S>>,
    flows: ArcSwap<Vec<String>>,
    submodules: ArcSwap<SubModuleIndex>,
}

impl<S: FlowStore> FlowSession<S> {
    pub fn new(store: Arc<S>, debounce: Duration) -> Self {
        let autosave = Autosave::new(Arc::clone(&store), debounce);
        Self {
            store,
            state: Mutex::new(SessionState {
                editor: FlowEditor::new(),
                current: None,
                autosave,
            }),
            flows: ArcSwap::new(Arc::new(Vec::new())),
            submodules: ArcSwap::new(Arc::new(SubModuleIndex::default())),
        }
    }

    /// Re-read the flow list; a failing backend lists as empty
    pub async fn refresh_list(&self) -> Arc<Vec<String>> {
        let names = match self.store.list().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("Failed to list flows: {:#}", e);
                Vec::new()
            }
        };
        let names = Arc::new(names);
        self.flows.store(Arc::clone(&names));
        names
    }

    /// Last published flow list
    pub fn flows(&self) -> Arc<Vec<String>> {
        self.flows.load_full()
    }

    /// Read, decode and install `name` as the current flow
    ///
    /// Nothing changes unless both the read and the decode succeed. Saves of
    /// the open flow are written out first, so reopening it reads them back.
    pub async fn load_flow(&self, name: &str) -> Result<OpenDocument, SessionError> {
        let mut state = self.state.lock().await;
        state.autosave.flush().await;

        let raw = self
            .store
            .read(name)
            .await
            .map_err(|source| {
                if source.is::<FlowNotFound>() {
                    SessionError::NotFound(name.to_string())
                } else {
                    SessionError::Storage {
                        name: name.to_string(),
                        source,
                    }
                }
            })?;
        let document = parse_flow_document(&raw).map_err(|source| SessionError::Unreadable {
            name: name.to_string(),
            source,
        })?;

        state.replace(Some(name.to_string()), Some(document)).await;
        self.publish_index(&state.editor);

        tracing::info!(
            "Opened flow '{}' ({} process node(s), {} module(s))",
            name,
            state.editor.document().process.nodes.len(),
            state.editor.document().modules.nodes.len()
        );
        Ok(OpenDocument {
            name: state.current.clone(),
            document: state.editor.document().clone(),
        })
    }

    /// Create an empty flow under the sanitized name and make it current
    ///
    /// The initial write is best-effort; the flow stays open even if it fails.
    pub async fn create_flow(&self, requested: &str) -> Result<String, SessionError> {
        let name = sanitize_flow_name(requested)?;
        if self.refresh_list().await.contains(&name) {
            return Err(SessionError::FlowExists(name));
        }

        match to_document_text(&FlowDocument::default()) {
            Ok(text) => {
                if let Err(e) = self.store.write(&name, &text).await {
                    tracing::warn!("Failed to write new flow '{}': {:#}", name, e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize empty flow: {}", e),
        }

        {
            let mut state = self.state.lock().await;
            state.replace(Some(name.clone()), None).await;
            self.publish_index(&state.editor);
        }
        self.refresh_list().await;

        tracing::info!("Created flow '{}'", name);
        Ok(name)
    }

    /// Delete `name`; if it is the current flow the session is cleared
    ///
    /// Pending saves of the deleted flow are dropped and writes already under
    /// way finish before the delete, so the flow is never written back.
    pub async fn delete_flow(&self, name: &str) {
        {
            let mut state = self.state.lock().await;
            let closing = state.current.as_deref() == Some(name);
            if closing {
                state.autosave.discard().await;
            }

            if let Err(e) = self.store.delete(name).await {
                tracing::warn!("Failed to delete flow '{}': {:#}", name, e);
            }

            if closing {
                state.replace(None, None).await;
                self.publish_index(&state.editor);
            }
        }
        self.refresh_list().await;

        tracing::info!("Deleted flow '{}'", name);
    }

    pub async fn document(&self) -> OpenDocument {
        let state = self.state.lock().await;
        OpenDocument {
            name: state.current.clone(),
            document: state.editor.document().clone(),
        }
    }

    pub async fn current_flow(&self) -> Option<String> {
        self.state.lock().await.current.clone()
    }

    /// Run one edit against the open flow and schedule its autosave
    ///
    /// A rejected edit leaves the document unchanged and schedules nothing.
    pub async fn edit<T, F>(&self, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut FlowEditor) -> Result<T, EditError>,
    {
        let mut state = self.state.lock().await;
        if state.current.is_none() {
            return Err(SessionError::NoCurrentFlow);
        }

        let value = f(&mut state.editor)?;

        let SessionState {
            editor,
            current,
            autosave,
        } = &mut *state;
        autosave.observe(current.as_deref(), editor.document());
        self.publish_index(editor);

        Ok(value)
    }

    /// Read-only access to the open document
    pub async fn inspect<T>(&self, f: impl FnOnce(&FlowEditor) -> T) -> T {
        let state = self.state.lock().await;
        f(&state.editor)
    }

    pub async fn arrange(&self, view: View) -> Result<Option<FlowDirection>, SessionError> {
        self.edit(|editor| Ok(editor.arrange(view))).await
    }

    /// Sub-module index of the open document, rebuilt after every commit
    pub fn submodule_index(&self) -> Arc<SubModuleIndex> {
        self.submodules.load_full()
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state.lock().await;
        SessionStatus {
            current_flow: state.current.clone(),
            save_pending: state.autosave.is_pending(),
            last_save: state.autosave.last_outcome(),
        }
    }

    /// Write any scheduled save now (graceful shutdown)
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.autosave.flush().await;
        tracing::info!("Session closed");
    }

    fn publish_index(&self, editor: &FlowEditor) {
        self.submodules.store(Arc::new(editor.submodule_index()));
    }
}
