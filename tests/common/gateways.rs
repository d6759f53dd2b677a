use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flowsync::gateway::{GatewayError, PersistenceGateway};
use flowsync::model::Snapshot;
use flowsync::types::FlowchartKey;

#[derive(Default)]
struct RecorderState {
    saves: Vec<Snapshot>,
    fail_next: usize,
    save_delay: Duration,
    load_response: Option<Snapshot>,
}

/// Test gateway that records every save and can inject transient failures
/// and artificial latency.
#[derive(Clone, Default)]
pub struct RecordingGateway {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose initial `load` returns the given snapshot.
    pub fn with_stored(snapshot: Snapshot) -> Self {
        let gateway = Self::new();
        gateway.state.lock().unwrap().load_response = Some(snapshot);
        gateway
    }

    pub fn saves(&self) -> Vec<Snapshot> {
        self.state.lock().unwrap().saves.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().saves.len()
    }

    /// Make the next `n` save attempts fail with a backend error.
    pub fn fail_next_saves(&self, n: usize) {
        self.state.lock().unwrap().fail_next = n;
    }

    /// Delay each save by `delay` (observed under paused tokio time).
    pub fn set_save_delay(&self, delay: Duration) {
        self.state.lock().unwrap().save_delay = delay;
    }
}

impl std::fmt::Debug for RecordingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingGateway")
            .field("saves", &self.save_count())
            .finish()
    }
}

#[async_trait]
impl PersistenceGateway for RecordingGateway {
    async fn load(&self, _key: &FlowchartKey) -> Result<Option<Snapshot>, GatewayError> {
        Ok(self.state.lock().unwrap().load_response.clone())
    }

    async fn save(&self, _key: &FlowchartKey, snapshot: &Snapshot) -> Result<(), GatewayError> {
        let delay = self.state.lock().unwrap().save_delay;
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(GatewayError::backend("injected failure"));
        }
        state.saves.push(snapshot.clone());
        Ok(())
    }
}

/// Gateway whose `load` always fails, for startup error coverage.
#[derive(Clone, Debug, Default)]
pub struct FailingLoadGateway;

#[async_trait]
impl PersistenceGateway for FailingLoadGateway {
    async fn load(&self, _key: &FlowchartKey) -> Result<Option<Snapshot>, GatewayError> {
        Err(GatewayError::backend("load unavailable"))
    }

    async fn save(&self, _key: &FlowchartKey, _snapshot: &Snapshot) -> Result<(), GatewayError> {
        Err(GatewayError::backend("save unavailable"))
    }
}
