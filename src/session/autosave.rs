/// Debounced autosave
///
/// Every committed mutation is observed once. Observing supersedes the
/// scheduled save (if its timer has not fired yet) and schedules a new one
/// that fires after the debounce window, so only the last mutation of a burst
/// reaches storage. A programmatic replace (load, create, delete) raises the
/// skip flag first; the next observation consumes it and schedules nothing.
///
/// Once a timer fires its write always runs to completion. Writes are
/// serialized in the order their timers fired, so a slow store never lets an
/// older document land after a newer one.
///
/// Save failures are logged and recorded in the last outcome; they are never
/// retried. The next mutation simply schedules another save.

use crate::flow::{to_document_text, FlowDocument};
use crate::storage::FlowStore;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Result of the latest save attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub flow: String,
    pub at: DateTime<Utc>,
    /// `None` when the write succeeded
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A scheduled save
///
/// `claimed` is taken exactly once: by the timer when it fires, or by
/// `cancel`/`flush` before that. Only the timer's claim leads to a write from
/// the spawned task.
#[derive(Debug)]
struct PendingSave {
    flow: String,
    text: String,
    claimed: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl PendingSave {
    /// Take the save away from its timer; false if the timer already fired
    fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct Autosave<S: FlowStore> {
    store: Arc<S>,
    debounce: Duration,
    skip_next: bool,
    pending: Option<PendingSave>,
    /// Writes that already started and were superseded; never aborted
    in_flight: Vec<JoinHandle<()>>,
    /// Held for the duration of every write
    write_lock: Arc<Mutex<()>>,
    last: Arc<ArcSwapOption<SaveOutcome>>,
}

impl<S: FlowStore> Autosave<S> {
    pub fn new(store: Arc<S>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            skip_next: false,
            pending: None,
            in_flight: Vec::new(),
            write_lock: Arc::new(Mutex::new(())),
            last: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Suppress the save for the next observed commit only
    pub fn skip_next(&mut self) {
        self.skip_next = true;
    }

    /// Observe one committed change to `document`
    ///
    /// Without a current flow there is nowhere to save; the skip flag is still
    /// consumed.
    pub fn observe(&mut self, flow: Option<&str>, document: &FlowDocument) {
        self.cancel();

        if std::mem::take(&mut self.skip_next) {
            tracing::debug!("Autosave skipped after programmatic replace");
            return;
        }
        let Some(flow) = flow else {
            return;
        };

        let text = match to_document_text(document) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to serialize flow '{}' for autosave: {}", flow, e);
                self.record(flow, Some(e.to_string()));
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let last = Arc::clone(&self.last);
        let write_lock = Arc::clone(&self.write_lock);
        let claimed = Arc::new(AtomicBool::new(false));
        let debounce = self.debounce;
        let (name, body, timer_claim) = (flow.to_string(), text.clone(), Arc::clone(&claimed));
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if timer_claim.swap(true, Ordering::SeqCst) {
                return;
            }
            let _guard = write_lock.lock().await;
            let outcome = write_now(store.as_ref(), &name, &body).await;
            last.store(Some(Arc::new(outcome)));
        });

        self.pending = Some(PendingSave {
            flow: flow.to_string(),
            text,
            claimed,
            handle,
        });
    }

    /// Drop the scheduled save if its timer has not fired yet
    ///
    /// A save whose write already began is left to finish in the background.
    pub fn cancel(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.claim() {
            pending.handle.abort();
        } else {
            self.in_flight.retain(|handle| !handle.is_finished());
            self.in_flight.push(pending.handle);
        }
    }

    /// Whether a save is scheduled or still being written
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
            || self.in_flight.iter().any(|handle| !handle.is_finished())
    }

    /// Write a still-scheduled save immediately instead of waiting for the
    /// timer, and wait for every write already under way
    pub async fn flush(&mut self) {
        let pending = self.pending.take();
        self.settle().await;

        let Some(pending) = pending else {
            return;
        };
        if !pending.claim() {
            join(pending.handle).await;
            return;
        }
        pending.handle.abort();
        let _guard = self.write_lock.lock().await;
        let outcome = write_now(self.store.as_ref(), &pending.flow, &pending.text).await;
        self.last.store(Some(Arc::new(outcome)));
    }

    /// Drop the scheduled save and wait for writes already under way
    ///
    /// Used before the current flow is deleted so no save can recreate it.
    pub async fn discard(&mut self) {
        self.cancel();
        self.settle().await;
    }

    pub fn last_outcome(&self) -> Option<SaveOutcome> {
        self.last.load_full().map(|outcome| outcome.as_ref().clone())
    }

    async fn settle(&mut self) {
        for handle in std::mem::take(&mut self.in_flight) {
            join(handle).await;
        }
    }

    fn record(&self, flow: &str, error: Option<String>) {
        self.last.store(Some(Arc::new(SaveOutcome {
            flow: flow.to_string(),
            at: Utc::now(),
            error,
        })));
    }
}

impl<S: FlowStore> Drop for Autosave<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn join(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        if e.is_panic() {
            tracing::error!("Autosave task panicked: {}", e);
        }
    }
}

async fn write_now<S: FlowStore>(store: &S, flow: &str, text: &str) -> SaveOutcome {
    let error = match store.write(flow, text).await {
        Ok(()) => {
            tracing::debug!("Autosaved flow '{}'", flow);
            None
        }
        Err(e) => {
            tracing::warn!("Autosave of flow '{}' failed: {:#}", flow, e);
            Some(format!("{:#}", e))
        }
    };
    SaveOutcome {
        flow: flow.to_string(),
        at: Utc::now(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowEditor;
    use crate::flow::{NodeKind, Position};
    use crate::storage::MemoryStore;
    use anyhow::Result;
    use std::sync::atomic::AtomicUsize;

    const WINDOW: Duration = Duration::from_millis(500);

    /// Memory store whose writes take `delay` to complete
    #[derive(Debug, Default)]
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    impl SlowStore {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn counts(&self) -> (usize, usize) {
            (
                self.started.load(Ordering::SeqCst),
                self.finished.load(Ordering::SeqCst),
            )
        }
    }

    impl FlowStore for SlowStore {
        async fn list(&self) -> Result<Vec<String>> {
            self.inner.list().await
        }

        async fn read(&self, name: &str) -> Result<String> {
            self.inner.read(name).await
        }

        async fn write(&self, name: &str, text: &str) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.inner.write(name, text).await?;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.inner.delete(name).await
        }
    }

    fn document_with(labels: usize) -> FlowDocument {
        let mut editor = FlowEditor::new();
        for _ in 0..labels {
            editor
                .add_node(NodeKind::Situation, Position::default())
                .unwrap();
        }
        editor.document().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_writes_only_the_last_state() {
        let store = Arc::new(MemoryStore::new());
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        for n in 1..=3 {
            autosave.observe(Some("burst"), &document_with(n));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(store.read("burst").await.is_err());

        tokio::time::sleep(WINDOW).await;
        let saved = crate::flow::parse_flow_document(&store.read("burst").await.unwrap()).unwrap();
        assert_eq!(saved.process.nodes.len(), 3);
        assert!(autosave.last_outcome().unwrap().succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn skip_flag_is_consumed_once() {
        let store = Arc::new(MemoryStore::new());
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        autosave.skip_next();
        autosave.observe(Some("quiet"), &document_with(1));
        assert!(!autosave.is_pending());
        tokio::time::sleep(WINDOW * 2).await;
        assert!(store.list().await.unwrap().is_empty());

        autosave.observe(Some("quiet"), &document_with(2));
        assert!(autosave.is_pending());
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(store.list().await.unwrap(), ["quiet"]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_before_the_timer_drops_the_old_save() {
        let store = Arc::new(MemoryStore::new());
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        autosave.observe(Some("old"), &document_with(1));
        autosave.skip_next();
        autosave.observe(Some("new"), &FlowDocument::default());
        tokio::time::sleep(WINDOW * 2).await;

        assert!(store.list().await.unwrap().is_empty());
        assert!(autosave.last_outcome().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn no_current_flow_saves_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        autosave.observe(None, &document_with(1));
        tokio::time::sleep(WINDOW * 2).await;
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_pending_save_immediately() {
        let store = Arc::new(MemoryStore::new());
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        autosave.observe(Some("late"), &document_with(2));
        autosave.flush().await;

        assert_eq!(store.list().await.unwrap(), ["late"]);
        assert!(!autosave.is_pending());
        assert_eq!(autosave.last_outcome().unwrap().flow, "late");
    }

    #[tokio::test(start_paused = true)]
    async fn write_under_way_survives_a_newer_edit() {
        let store = Arc::new(SlowStore::with_delay(Duration::from_millis(300)));
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        autosave.observe(Some("slow"), &document_with(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.counts(), (1, 0));

        autosave.observe(Some("slow"), &document_with(2));
        assert!(autosave.is_pending());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.counts(), (1, 1));

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(store.counts(), (2, 2));
        assert!(!autosave.is_pending());
        let saved = crate::flow::parse_flow_document(&store.inner.read("slow").await.unwrap()).unwrap();
        assert_eq!(saved.process.nodes.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_waits_for_a_write_under_way() {
        let store = Arc::new(SlowStore::with_delay(Duration::from_millis(300)));
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        autosave.observe(Some("slow"), &document_with(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        autosave.flush().await;

        assert_eq!(store.counts(), (1, 1));
        assert!(!autosave.is_pending());
        assert!(autosave.last_outcome().unwrap().succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn discard_drops_scheduled_save_but_finishes_started_one() {
        let store = Arc::new(SlowStore::with_delay(Duration::from_millis(300)));
        let mut autosave = Autosave::new(Arc::clone(&store), WINDOW);

        autosave.observe(Some("slow"), &document_with(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        autosave.observe(Some("slow"), &document_with(2));
        autosave.discard().await;

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(store.counts(), (1, 1));
        let saved = crate::flow::parse_flow_document(&store.inner.read("slow").await.unwrap()).unwrap();
        assert_eq!(saved.process.nodes.len(), 1);
    }
}
