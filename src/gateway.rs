/*!
Persistence gateway contract and serde-friendly persisted shapes.

The gateway abstracts the remote store behind two asynchronous operations:
load the last snapshot for a key, and replace it wholesale. Both may
complete out of program order relative to user actions; callers must not
assume completion before the next local mutation. The gateway itself never
retries; retry/backoff policy belongs to the reconciliation controller.

Design Goals:
- Explicit serde structs decoupled from in-memory representations, with
  conversion logic localized in From / TryFrom impls so backend code stays
  lean and declarative.
- Forward compatibility: unknown or absent optional fields round-trip via
  serde defaults.

The persisted record is a full-document replace: node set, edge set, and a
last-modified timestamp. No versioning, no diffs.
*/

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EventDetails, FlowEdge, FlowNode, Position, Snapshot};
use crate::types::{EdgeId, FlowchartKey, NodeId};
use crate::utils::json_ext::JsonSerializable;

/// Transient, recoverable persistence failures.
///
/// These surface as a status indicator on the controller, never as errors
/// thrown at mutation call sites.
#[derive(Debug, Error, Diagnostic)]
pub enum GatewayError {
    #[error("backend error: {message}")]
    #[diagnostic(
        code(flowsync::gateway::backend),
        help("Transient I/O or network failure; the controller will retry on the next trigger.")
    )]
    Backend { message: String },

    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(flowsync::gateway::serde),
        help("Ensure the stored JSON matches the persisted flowchart shape.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Blanket JSON round-trip support for all serde-capable types using
/// GatewayError.
impl<T> JsonSerializable<GatewayError> for T
where
    T: serde::Serialize + for<'de> serde::de::DeserializeOwned,
{
    fn to_json_string(&self) -> Result<String, GatewayError> {
        serde_json::to_string(self).map_err(|e| GatewayError::Serde { source: e })
    }

    fn from_json_str(s: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(s).map_err(|e| GatewayError::Serde { source: e })
    }
}

/// Abstract interface to load/save the whole graph snapshot against a
/// remote store keyed by an injected identifier.
#[async_trait]
pub trait PersistenceGateway: Send + Sync + std::fmt::Debug {
    /// Last stored snapshot for the key, or `Ok(None)` when no snapshot
    /// exists yet (first run): explicit absence, not an error.
    async fn load(&self, key: &FlowchartKey) -> Result<Option<Snapshot>, GatewayError>;

    /// Replace the stored snapshot wholesale.
    async fn save(&self, key: &FlowchartKey, snapshot: &Snapshot) -> Result<(), GatewayError>;
}

/* ---------- Persisted shapes ---------- */

/// Persisted form of a single node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub year: i32,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Persisted form of a single edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub animated: bool,
}

/// Complete persisted shape of one flowchart record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedFlowchart {
    #[serde(default)]
    pub nodes: Vec<PersistedNode>,
    #[serde(default)]
    pub edges: Vec<PersistedEdge>,
    /// RFC3339 string form of the last save time (keeps chrono out of the
    /// serialized shape).
    pub updated_at: String,
}

/* ---------- Snapshot <-> Persisted conversions ---------- */

impl From<&FlowNode> for PersistedNode {
    fn from(n: &FlowNode) -> Self {
        PersistedNode {
            id: n.id.to_string(),
            x: n.position.x,
            y: n.position.y,
            year: n.event.year,
            body: n.event.body.clone(),
            country: n.event.country.clone(),
        }
    }
}

impl From<PersistedNode> for FlowNode {
    fn from(p: PersistedNode) -> Self {
        FlowNode {
            id: NodeId::new(p.id),
            position: Position::new(p.x, p.y),
            event: EventDetails {
                year: p.year,
                body: p.body,
                country: p.country,
            },
        }
    }
}

impl From<&FlowEdge> for PersistedEdge {
    fn from(e: &FlowEdge) -> Self {
        PersistedEdge {
            id: e.id.to_string(),
            source: e.source.to_string(),
            target: e.target.to_string(),
            animated: e.animated,
        }
    }
}

impl From<PersistedEdge> for FlowEdge {
    fn from(p: PersistedEdge) -> Self {
        FlowEdge {
            id: EdgeId::new(p.id),
            source: NodeId::new(p.source),
            target: NodeId::new(p.target),
            animated: p.animated,
        }
    }
}

impl From<&Snapshot> for PersistedFlowchart {
    fn from(s: &Snapshot) -> Self {
        PersistedFlowchart {
            nodes: s.nodes.iter().map(PersistedNode::from).collect(),
            edges: s.edges.iter().map(PersistedEdge::from).collect(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }
}

impl TryFrom<PersistedFlowchart> for Snapshot {
    type Error = GatewayError;

    fn try_from(p: PersistedFlowchart) -> Result<Self, GatewayError> {
        Ok(Snapshot::new(
            p.nodes.into_iter().map(FlowNode::from).collect(),
            p.edges.into_iter().map(FlowEdge::from).collect(),
        ))
    }
}

/* ---------- In-memory backend ---------- */

/// Volatile gateway for tests and development.
///
/// Keyed by [`FlowchartKey`] like a real backend, so multi-document use is
/// exercised even in memory.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    records: Arc<Mutex<FxHashMap<String, PersistedFlowchart>>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (one per key).
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.lock().expect("records poisoned").len()
    }

    /// Raw persisted record for a key, if any.
    #[must_use]
    pub fn record(&self, key: &FlowchartKey) -> Option<PersistedFlowchart> {
        self.records
            .lock()
            .expect("records poisoned")
            .get(key.as_str())
            .cloned()
    }
}

impl std::fmt::Debug for InMemoryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryGateway")
            .field("records", &self.record_count())
            .finish()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn load(&self, key: &FlowchartKey) -> Result<Option<Snapshot>, GatewayError> {
        let record = self
            .records
            .lock()
            .expect("records poisoned")
            .get(key.as_str())
            .cloned();
        record.map(Snapshot::try_from).transpose()
    }

    async fn save(&self, key: &FlowchartKey, snapshot: &Snapshot) -> Result<(), GatewayError> {
        self.records
            .lock()
            .expect("records poisoned")
            .insert(key.as_str().to_string(), PersistedFlowchart::from(snapshot));
        Ok(())
    }
}
