//! Live-update subscription contract.
//!
//! The remote store notifies all connected processes whenever the record
//! for the flowchart key changes, regardless of origin, including the
//! echo of this process's own just-completed save. Each delivery carries a
//! full authoritative [`Snapshot`], never a diff; ordering across writers
//! is at-least-once and not strictly happens-before.
//!
//! [`ChannelListener`] is the in-process hub implementation used by tests,
//! the demo, and embeddings that broker their own change feed. Real
//! transports implement [`LiveUpdates`] the same way: hand out a
//! [`Subscription`] whose detach action tears down the underlying channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use miette::Diagnostic;
use thiserror::Error;

use crate::model::Snapshot;

#[derive(Debug, Error, Diagnostic)]
pub enum LiveUpdateError {
    #[error("live-update channel closed")]
    #[diagnostic(code(flowsync::live::closed))]
    Closed,

    #[error("backend error: {message}")]
    #[diagnostic(code(flowsync::live::backend))]
    Backend { message: String },
}

/// Source of asynchronous "someone else saved" notifications.
pub trait LiveUpdates: Send + Sync + std::fmt::Debug {
    fn subscribe(&self) -> Result<Subscription, LiveUpdateError>;
}

/// Detach action for a subscription. Idempotent: the underlying teardown
/// runs exactly once no matter how often it is invoked; dropping the guard
/// is a backstop for the same action.
pub struct UnsubscribeGuard {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl UnsubscribeGuard {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for UnsubscribeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsubscribeGuard")
            .field("detached", &self.detach.is_none())
            .finish()
    }
}

/// Active subscription yielding full snapshots.
#[derive(Debug)]
pub struct Subscription {
    receiver: flume::Receiver<Snapshot>,
    guard: UnsubscribeGuard,
}

impl Subscription {
    pub fn new(receiver: flume::Receiver<Snapshot>, detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            receiver,
            guard: UnsubscribeGuard::new(detach),
        }
    }

    /// Next delivery, or `None` once the channel is detached or closed.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.receiver.recv_async().await.ok()
    }

    pub fn unsubscribe(&mut self) {
        self.guard.unsubscribe();
    }

    /// Split into the raw receiver and the detach guard so a consumer task
    /// can own one while teardown logic owns the other.
    #[must_use]
    pub fn into_parts(self) -> (flume::Receiver<Snapshot>, UnsubscribeGuard) {
        (self.receiver, self.guard)
    }
}

/// In-process live-update hub.
///
/// `publish` broadcasts a snapshot to every active subscriber; detached or
/// dropped subscribers are pruned on the next broadcast.
#[derive(Clone, Default)]
pub struct ChannelListener {
    subscribers: Arc<Mutex<Vec<(u64, flume::Sender<Snapshot>)>>>,
    next_id: Arc<AtomicU64>,
}

impl ChannelListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a snapshot to every active subscriber.
    pub fn publish(&self, snapshot: Snapshot) {
        self.subscribers
            .lock()
            .expect("subscribers poisoned")
            .retain(|(_, tx)| tx.send(snapshot.clone()).is_ok());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("subscribers poisoned").len()
    }
}

impl std::fmt::Debug for ChannelListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelListener")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LiveUpdates for ChannelListener {
    fn subscribe(&self) -> Result<Subscription, LiveUpdateError> {
        let (tx, rx) = flume::unbounded();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers
            .lock()
            .expect("subscribers poisoned")
            .push((id, tx));

        let subscribers = Arc::clone(&self.subscribers);
        Ok(Subscription::new(rx, move || {
            subscribers
                .lock()
                .expect("subscribers poisoned")
                .retain(|(sub_id, _)| *sub_id != id);
        }))
    }
}
