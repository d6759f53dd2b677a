//! Reconciliation controller: the orchestrator of the synchronization
//! engine.
//!
//! [`SyncController`] sequences the three flows that make collaborative
//! editing of the single flowchart safe:
//!
//! 1. **Load on start**: fetch the remote snapshot (or fall back to the
//!    built-in default graph), and only then open the live-update
//!    subscription, so an early spurious notification cannot race the
//!    initial load.
//! 2. **Debounced save on change** (editor role only): every store
//!    mutation marks the document dirty and re-arms a single-slot timer;
//!    on expiry, if still dirty, the current snapshot is saved. Mutations
//!    inside the window coalesce into one save carrying the final state.
//! 3. **Merge on remote update**: every delivery replaces the store
//!    wholesale, last-remote-write-wins. Unsaved local edits can be lost;
//!    the controller surfaces that through a
//!    [`SyncEvent::Remote`](crate::events::SyncEvent) event instead of
//!    hiding it.
//!
//! A monotonically increasing save-attempt sequence guards against stale
//! results: once a newer attempt has been dispatched, the outcome of an
//! older in-flight save is silently discarded and can never move the
//! status backward.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flowsync::config::SyncConfig;
//! use flowsync::controller::SyncController;
//! use flowsync::gateway::InMemoryGateway;
//! use flowsync::live::ChannelListener;
//! use flowsync::model::{EventDetails, Position};
//! use flowsync::role::SharedRole;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Arc::new(InMemoryGateway::new());
//! let hub = Arc::new(ChannelListener::new());
//! let role = Arc::new(SharedRole::editor());
//!
//! let mut controller = SyncController::start(
//!     gateway,
//!     hub,
//!     role,
//!     SyncConfig::default(),
//! )
//! .await?;
//!
//! controller.add_event(
//!     Position::new(250.0, 250.0),
//!     EventDetails::new(1969, "First crewed Moon landing"),
//! )?;
//! // After the debounce window elapses, exactly one save fires.
//! # Ok(())
//! # }
//! ```

mod debounce;

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::StreamExt;
use miette::Diagnostic;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::SyncConfig;
use crate::events::{EventBus, SyncEvent};
use crate::gateway::{GatewayError, PersistenceGateway};
use crate::live::{LiveUpdateError, LiveUpdates, UnsubscribeGuard};
use crate::model::{
    EventDetails, FlowEdge, NodePatch, Position, Snapshot, default_flowchart,
};
use crate::role::RoleSignal;
use crate::session::{DraftUpdate, EditDraft, EditSession, Selection, SessionError};
use crate::store::{FlowchartStore, StoreError};
use crate::types::{EdgeId, FlowchartKey, NodeId, Phase, SaveStatus};

use debounce::DebounceSlot;

/// Errors surfaced by controller operations.
///
/// Structural and validation failures pass through from the store and
/// session; `Load`/`Subscribe` can only occur during startup.
#[derive(Debug, Error, Diagnostic)]
pub enum ControllerError {
    #[error("initial load failed: {0}")]
    #[diagnostic(
        code(flowsync::controller::load),
        help("Transient backend failure; retry startup.")
    )]
    Load(#[source] GatewayError),

    #[error("live-update subscription failed: {0}")]
    #[diagnostic(code(flowsync::controller::subscribe))]
    Subscribe(#[source] LiveUpdateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),
}

/// State shared between the controller, its debounce timers, and the
/// read-path task. The mutex is never held across a suspension point.
struct Core {
    store: FlowchartStore,
    session: EditSession,
    status: SaveStatus,
    /// Store revision covered by the last applied save or remote overwrite.
    saved_revision: u64,
    /// Monotonic count of dispatched save attempts; only the result of the
    /// newest attempt may be applied.
    save_seq: u64,
}

impl Core {
    fn is_dirty(&self) -> bool {
        self.store.revision() > self.saved_revision
    }
}

/// Orchestrates load-on-start, debounced save-on-change, and
/// merge-on-remote-update for the single fixed-key flowchart.
pub struct SyncController {
    core: Arc<Mutex<Core>>,
    gateway: Arc<dyn PersistenceGateway>,
    role: Arc<dyn RoleSignal>,
    config: SyncConfig,
    emitter: flume::Sender<SyncEvent>,
    bus: EventBus,
    graph_slot: DebounceSlot,
    label_slot: DebounceSlot,
    live_guard: Option<UnsubscribeGuard>,
    read_task: Option<JoinHandle<()>>,
    phase: Phase,
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("key", &self.config.key)
            .field("phase", &self.phase)
            .finish()
    }
}

impl SyncController {
    /// Start a controller with the default event bus (stdout sink).
    pub async fn start(
        gateway: Arc<dyn PersistenceGateway>,
        listener: Arc<dyn LiveUpdates>,
        role: Arc<dyn RoleSignal>,
        config: SyncConfig,
    ) -> Result<Self, ControllerError> {
        Self::start_with_bus(gateway, listener, role, config, EventBus::default(), true).await
    }

    /// Start a controller with a custom event bus.
    ///
    /// Runs the full startup sequence: load the remote snapshot (falling
    /// back to the built-in default graph on absence), then open the
    /// live-update subscription and enable the write path. Returns in
    /// [`Phase::Ready`].
    #[instrument(skip_all, fields(key = %config.key), err)]
    pub async fn start_with_bus(
        gateway: Arc<dyn PersistenceGateway>,
        listener: Arc<dyn LiveUpdates>,
        role: Arc<dyn RoleSignal>,
        config: SyncConfig,
        bus: EventBus,
        start_listener: bool,
    ) -> Result<Self, ControllerError> {
        if start_listener {
            bus.listen_for_events();
        }
        let emitter = bus.get_sender();

        tracing::info!(key = %config.key, "loading flowchart");
        let loaded = gateway.load(&config.key).await.map_err(ControllerError::Load)?;
        let store = match loaded {
            Some(snapshot) => match FlowchartStore::from_snapshot(snapshot) {
                Ok(store) => store,
                Err(e) => {
                    // Structural violations are non-fatal to the process:
                    // keep the built-in default and surface the rejection.
                    tracing::warn!(error = %e, "stored snapshot rejected; using default graph");
                    emit(
                        &emitter,
                        SyncEvent::diagnostic("load", format!("stored snapshot rejected: {e}")),
                    );
                    default_store()
                }
            },
            None => {
                tracing::info!(key = %config.key, "no stored snapshot; using default graph");
                default_store()
            }
        };

        let session = EditSession::new(config.year_bounds());
        let saved_revision = store.revision();
        let core = Arc::new(Mutex::new(Core {
            store,
            session,
            status: SaveStatus::Idle,
            saved_revision,
            save_seq: 0,
        }));

        // Subscribe only after the initial load has landed so an early
        // delivery cannot race it.
        let subscription = listener.subscribe().map_err(ControllerError::Subscribe)?;
        let (receiver, live_guard) = subscription.into_parts();
        let read_task = {
            let core = Arc::clone(&core);
            let emitter = emitter.clone();
            tokio::spawn(async move {
                let mut deliveries = receiver.into_stream();
                while let Some(snapshot) = deliveries.next().await {
                    Self::apply_remote(&core, &emitter, snapshot);
                }
            })
        };

        tracing::info!(key = %config.key, "sync controller ready");
        Ok(Self {
            core,
            gateway,
            role,
            config,
            emitter,
            bus,
            graph_slot: DebounceSlot::idle(),
            label_slot: DebounceSlot::idle(),
            live_guard: Some(live_guard),
            read_task: Some(read_task),
            phase: Phase::Ready,
        })
    }

    /* ---------- observers ---------- */

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.lock_core().status
    }

    /// True when local mutations exist that no applied save has covered.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.lock_core().is_dirty()
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.lock_core().store.snapshot()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock_core().store.revision()
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.lock_core().session.selection().clone()
    }

    #[must_use]
    pub fn draft(&self) -> Option<EditDraft> {
        self.lock_core().session.draft().cloned()
    }

    /* ---------- graph mutations (write path triggers) ---------- */

    /// Create a new event node at `position` with a generated id.
    pub fn add_event(
        &mut self,
        position: Position,
        event: EventDetails,
    ) -> Result<NodeId, ControllerError> {
        self.config.year_bounds().check(event.year)?;
        let id = NodeId::generate();
        {
            let mut core = self.lock_core();
            core.store
                .add_node(crate::model::FlowNode::new(id.clone(), position, event))?;
        }
        tracing::debug!(node = %id, "event added");
        self.after_local_mutation();
        Ok(id)
    }

    /// Delete an event node, cascading removal of every edge referencing
    /// it. Returns whether anything changed.
    pub fn remove_event(&mut self, id: &NodeId) -> Result<bool, ControllerError> {
        let changed = {
            let mut core = self.lock_core();
            let changed = core.store.remove_node(id).is_some();
            if changed {
                core.session.forget_node(id);
            }
            changed
        };
        if changed {
            tracing::debug!(node = %id, "event removed");
            self.after_local_mutation();
        }
        Ok(changed)
    }

    /// Connect two existing events with a generated edge id.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId, ControllerError> {
        let id = EdgeId::generate();
        {
            let mut core = self.lock_core();
            core.store
                .add_edge(FlowEdge::new(id.clone(), source, target))?;
        }
        tracing::debug!(edge = %id, "events connected");
        self.after_local_mutation();
        Ok(id)
    }

    /// Add a fully specified edge.
    pub fn add_edge(&mut self, edge: FlowEdge) -> Result<(), ControllerError> {
        {
            let mut core = self.lock_core();
            core.store.add_edge(edge)?;
        }
        self.after_local_mutation();
        Ok(())
    }

    /// Remove an edge. Returns whether anything changed.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<bool, ControllerError> {
        let changed = {
            let mut core = self.lock_core();
            core.store.remove_edge(id).is_some()
        };
        if changed {
            self.after_local_mutation();
        }
        Ok(changed)
    }

    /// Reposition an event (drag end).
    pub fn move_event(&mut self, id: &NodeId, position: Position) -> Result<(), ControllerError> {
        let changed = {
            let mut core = self.lock_core();
            core.store
                .update_node(id, NodePatch::new().with_position(position))?
                .is_some()
        };
        if changed {
            self.after_local_mutation();
        }
        Ok(())
    }

    /// Merge a field patch into an event.
    pub fn update_event(&mut self, id: &NodeId, patch: NodePatch) -> Result<(), ControllerError> {
        if let Some(year) = patch.year {
            self.config.year_bounds().check(year)?;
        }
        let changed = {
            let mut core = self.lock_core();
            core.store.update_node(id, patch)?.is_some()
        };
        if changed {
            self.after_local_mutation();
        }
        Ok(())
    }

    /* ---------- edit session ---------- */

    pub fn select_node(&mut self, id: NodeId) {
        self.lock_core().session.select_node(id);
    }

    pub fn select_edge(&mut self, id: EdgeId) {
        self.lock_core().session.select_edge(id);
    }

    pub fn clear_selection(&mut self) {
        self.lock_core().session.clear_selection();
    }

    /// Begin editing an event, capturing its fields as the draft baseline.
    pub fn begin_edit(&mut self, id: &NodeId) -> Result<(), ControllerError> {
        let mut core = self.lock_core();
        let Core { store, session, .. } = &mut *core;
        session.begin_edit(store, id)?;
        Ok(())
    }

    /// Apply a partial update to the active draft and (for editors) re-arm
    /// the draft autosave timer.
    pub fn update_draft(&mut self, update: DraftUpdate) -> Result<(), ControllerError> {
        self.lock_core().session.update_draft(update)?;
        if self.role.is_editor() {
            self.arm_label_autosave();
        }
        Ok(())
    }

    /// Explicitly commit the active draft into the store.
    pub fn commit_edit(&mut self) -> Result<(), ControllerError> {
        self.label_slot.cancel();
        let changed = {
            let mut core = self.lock_core();
            let Core { store, session, .. } = &mut *core;
            session.commit(store)?.is_some()
        };
        if changed {
            self.after_local_mutation();
        }
        Ok(())
    }

    /// Discard the active draft without touching the store.
    pub fn cancel_edit(&mut self) {
        self.label_slot.cancel();
        self.lock_core().session.cancel();
    }

    /* ---------- write path ---------- */

    /// Notify the controller that the role signal changed.
    ///
    /// An editor dropping to viewer cancels pending debounce timers
    /// without forcing a final save; the timers also re-check the role at
    /// fire time, so this call is an optimization, not a correctness
    /// requirement.
    pub fn role_changed(&mut self) {
        if !self.role.is_editor() {
            tracing::debug!("write path disabled; cancelling pending timers");
            self.graph_slot.cancel();
            self.label_slot.cancel();
        }
    }

    /// Explicit retry trigger: commit any outstanding draft and save now,
    /// skipping the debounce window. No-op for viewers or clean documents.
    pub async fn flush(&mut self) {
        if !self.role.is_editor() {
            return;
        }
        self.graph_slot.cancel();
        self.label_slot.cancel();
        {
            let mut core = self.lock_core();
            let Core { store, session, .. } = &mut *core;
            if let Err(e) = session.commit(store) {
                emit(
                    &self.emitter,
                    SyncEvent::diagnostic("flush", format!("draft commit failed: {e}")),
                );
            }
        }
        Self::dispatch_save(
            Arc::clone(&self.core),
            Arc::clone(&self.gateway),
            self.config.key.clone(),
            self.emitter.clone(),
        )
        .await;
    }

    /// Tear the controller down.
    ///
    /// Cancels pending timers without flushing (unless
    /// [`SyncConfig::flush_on_teardown`] is set), unsubscribes from live
    /// updates exactly once, and stops the event bus listener.
    pub async fn shutdown(mut self) {
        self.graph_slot.cancel();
        self.label_slot.cancel();
        if self.config.flush_on_teardown {
            self.flush().await;
        }
        if let Some(mut guard) = self.live_guard.take() {
            guard.unsubscribe();
        }
        if let Some(task) = self.read_task.take() {
            task.abort();
        }
        emit(
            &self.emitter,
            SyncEvent::diagnostic("lifecycle", "sync controller shut down"),
        );
        self.bus.stop_listener().await;
        tracing::info!(key = %self.config.key, "sync controller shut down");
    }

    fn after_local_mutation(&mut self) {
        // The write path is gated on the continuously re-evaluated role:
        // viewers mutate locally but never persist.
        if !self.role.is_editor() {
            return;
        }
        self.arm_graph_save();
    }

    fn arm_graph_save(&mut self) {
        let core = Arc::clone(&self.core);
        let gateway = Arc::clone(&self.gateway);
        let role = Arc::clone(&self.role);
        let key = self.config.key.clone();
        let emitter = self.emitter.clone();
        self.graph_slot.arm(self.config.graph_debounce, async move {
            if !role.is_editor() {
                return;
            }
            Self::dispatch_save(core, gateway, key, emitter).await;
        });
    }

    fn arm_label_autosave(&mut self) {
        let core = Arc::clone(&self.core);
        let gateway = Arc::clone(&self.gateway);
        let role = Arc::clone(&self.role);
        let key = self.config.key.clone();
        let emitter = self.emitter.clone();
        self.label_slot.arm(self.config.label_debounce, async move {
            if !role.is_editor() {
                return;
            }
            {
                let mut guard = core.lock().expect("core poisoned");
                let Core { store, session, .. } = &mut *guard;
                if let Err(e) = session.commit(store) {
                    emit(
                        &emitter,
                        SyncEvent::diagnostic("autosave", format!("draft commit failed: {e}")),
                    );
                    return;
                }
            }
            Self::dispatch_save(core, gateway, key, emitter).await;
        });
    }

    /// Dispatch one save attempt for the current snapshot.
    ///
    /// The snapshot and attempt number are captured under the lock at fire
    /// time; a clean document short-circuits. The result is applied only
    /// if no newer attempt has been dispatched meanwhile.
    async fn dispatch_save(
        core: Arc<Mutex<Core>>,
        gateway: Arc<dyn PersistenceGateway>,
        key: FlowchartKey,
        emitter: flume::Sender<SyncEvent>,
    ) {
        let (snapshot, revision, attempt) = {
            let mut guard = core.lock().expect("core poisoned");
            if !guard.is_dirty() {
                return;
            }
            guard.save_seq += 1;
            guard.status = SaveStatus::Saving;
            let attempt = guard.save_seq;
            emit(&emitter, SyncEvent::status(SaveStatus::Saving, attempt));
            (guard.store.snapshot(), guard.store.revision(), attempt)
        };

        tracing::debug!(%key, attempt, revision, "saving flowchart");
        let result = gateway.save(&key, &snapshot).await;

        let mut guard = core.lock().expect("core poisoned");
        if attempt != guard.save_seq {
            // Superseded by a newer attempt; its result owns the status.
            tracing::trace!(attempt, newest = guard.save_seq, "stale save result discarded");
            return;
        }
        match result {
            Ok(()) => {
                guard.saved_revision = guard.saved_revision.max(revision);
                guard.status = SaveStatus::Saved;
                emit(&emitter, SyncEvent::status(SaveStatus::Saved, attempt));
                tracing::debug!(%key, attempt, "flowchart saved");
            }
            Err(e) => {
                // Dirty stays set; the next mutation or an explicit flush
                // retries.
                guard.status = SaveStatus::Error;
                emit(&emitter, SyncEvent::status(SaveStatus::Error, attempt));
                tracing::warn!(%key, attempt, error = %e, "flowchart save failed");
            }
        }
    }

    /// Read path: apply one remote delivery as an unconditional overwrite.
    fn apply_remote(core: &Arc<Mutex<Core>>, emitter: &flume::Sender<SyncEvent>, snapshot: Snapshot) {
        let mut guard = core.lock().expect("core poisoned");
        let had_unsaved = guard.is_dirty();
        match guard.store.replace_all(snapshot.nodes, snapshot.edges) {
            Ok(change) => {
                // The delivered snapshot is authoritative: the document is
                // clean from here, and any pending timer that fires later
                // observes nothing to save.
                guard.saved_revision = change.revision;
                if had_unsaved {
                    tracing::warn!("remote overwrite discarded unsaved local edits");
                }
                emit(emitter, SyncEvent::remote_overwrite(had_unsaved));
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote snapshot rejected");
                emit(
                    emitter,
                    SyncEvent::diagnostic("remote", format!("snapshot rejected: {e}")),
                );
            }
        }
    }

    fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().expect("core poisoned")
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        if let Some(task) = self.read_task.take() {
            task.abort();
        }
    }
}

fn default_store() -> FlowchartStore {
    FlowchartStore::from_snapshot(default_flowchart())
        .expect("default flowchart is structurally valid")
}

fn emit(emitter: &flume::Sender<SyncEvent>, event: SyncEvent) {
    if emitter.send(event).is_err() {
        tracing::debug!("event bus unavailable; event dropped");
    }
}
