//! Structured event stream for synchronization observability.
//!
//! The reconciliation controller narrates its externally relevant moments
//! (save status transitions, remote overwrites, lifecycle diagnostics) as
//! [`SyncEvent`]s emitted to an [`EventBus`]. The bus broadcasts to
//! pluggable [`EventSink`]s: stdout for development, an in-memory sink for
//! tests, or a channel sink for streaming to a UI.
//!
//! A viewer session never dispatches saves, so it never produces status
//! events; the presentation layer can subscribe without filtering by role.

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, RemoteEvent, StatusEvent, SyncEvent};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
