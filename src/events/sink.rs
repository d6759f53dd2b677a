use std::io::{self, Result as IoResult, Stdout, Write};
use std::sync::{Arc, Mutex};

use super::event::SyncEvent;

/// Abstraction over an output target that consumes full SyncEvent objects.
pub trait EventSink: Send + Sync {
    /// Handle a structured event. The sink decides how to serialize it.
    fn handle(&mut self, event: &SyncEvent) -> IoResult<()>;
}

/// Stdout sink for development and demos.
pub struct StdOutSink {
    handle: Stdout,
}

impl Default for StdOutSink {
    fn default() -> Self {
        Self {
            handle: io::stdout(),
        }
    }
}

impl EventSink for StdOutSink {
    fn handle(&mut self, event: &SyncEvent) -> IoResult<()> {
        writeln!(self.handle, "{event}")?;
        self.handle.flush()
    }
}

/// In-memory sink for testing and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<SyncEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SyncEvent> {
        self.entries.lock().expect("entries poisoned").clone()
    }

    pub fn clear(&self) {
        self.entries.lock().expect("entries poisoned").clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &SyncEvent) -> IoResult<()> {
        self.entries
            .lock()
            .expect("entries poisoned")
            .push(event.clone());
        Ok(())
    }
}

/// Channel-based sink for streaming to async consumers (e.g. a UI).
pub struct ChannelSink {
    tx: flume::Sender<SyncEvent>,
}

impl ChannelSink {
    pub fn new(tx: flume::Sender<SyncEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &SyncEvent) -> IoResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
