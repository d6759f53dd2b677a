//! # Flowsync: Collaborative Flowchart Synchronization Engine
//!
//! Flowsync reconciles local, in-progress edits of a single directed graph
//! of timestamped events against a remotely persisted, multi-writer copy
//! of the same graph, under a write-debounce policy and a live-update
//! subscription.
//!
//! ## Core Concepts
//!
//! - **Store**: in-memory authoritative node/edge sets with structural
//!   invariants enforced at the boundary
//! - **Session**: transient selection and field drafts, decoupled from the
//!   committed graph until commit
//! - **Gateway**: asynchronous load/save of whole-document snapshots,
//!   keyed by an injected identifier
//! - **Live updates**: full-snapshot deliveries whenever any writer saves
//! - **Controller**: the orchestrator; load on start, debounced role-gated
//!   saves, unconditional remote overwrites, stale-result guarding
//!
//! ## Quick Start
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
//! let mut controller =
//!     SyncController::start(gateway, hub.clone(), role, SyncConfig::default()).await?;
//!
//! let id = controller.add_event(
//!     Position::new(100.0, 50.0),
//!     EventDetails::new(1903, "First powered flight").with_country("United States"),
//! )?;
//! controller.begin_edit(&id)?;
//! controller.update_draft(
//!     flowsync::session::DraftUpdate::new().with_body("First sustained powered flight"),
//! )?;
//! // The draft auto-commits and saves after the quiet period; remote
//! // deliveries from other writers overwrite the local graph at any time.
//! controller.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Conflict Policy
//!
//! The engine is deliberately last-writer-wins in both directions: local
//! mutations coalesce into one debounced save of the final state, and each
//! remote delivery replaces the local graph wholesale. Unsaved local edits
//! can be lost to a remote overwrite; that risk is surfaced through the
//! event stream ([`events::SyncEvent`]) rather than masked.
//!
//! ## Module Guide
//!
//! - [`types`] - Identifiers, roles, and status enums
//! - [`model`] - Node/edge shapes and whole-document snapshots
//! - [`store`] - Authoritative in-memory graph with change notifications
//! - [`session`] - Selection and draft lifecycle with year validation
//! - [`gateway`] - Persistence contract, serde shapes, in-memory backend
//! - [`live`] - Live-update subscription contract and in-process hub
//! - [`controller`] - The reconciliation state machine
//! - [`events`] - Structured observability stream with pluggable sinks
//! - [`config`] - Policy knobs (debounce windows, year bounds, key)
//! - [`role`] - The externally supplied write-gating predicate

pub mod config;
pub mod controller;
pub mod events;
pub mod gateway;
#[cfg(feature = "sqlite")]
pub mod gateway_sqlite;
pub mod live;
pub mod model;
pub mod role;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use config::SyncConfig;
pub use controller::{ControllerError, SyncController};
pub use gateway::{GatewayError, InMemoryGateway, PersistenceGateway};
#[cfg(feature = "sqlite")]
pub use gateway_sqlite::SqliteGateway;
pub use live::{ChannelListener, LiveUpdateError, LiveUpdates, Subscription};
pub use model::{EventDetails, FlowEdge, FlowNode, NodePatch, Position, Snapshot};
pub use role::{RoleSignal, SharedRole};
pub use session::{DraftUpdate, EditSession, SessionError};
pub use store::{FlowchartStore, StoreChange, StoreError};
pub use types::{EdgeId, FlowchartKey, NodeId, Phase, Role, SaveStatus};
