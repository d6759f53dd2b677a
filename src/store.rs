//! In-memory authoritative graph state.
//!
//! [`FlowchartStore`] owns the committed node and edge sets for the current
//! process and is the single place where the structural invariant is
//! enforced: every edge's `source`/`target` must reference a node currently
//! present in the store. Violations are rejected synchronously and never
//! corrupt stored state partially; operations are all-or-nothing.
//!
//! Every successful state-changing mutation bumps a monotonically
//! increasing revision and broadcasts a [`StoreChange`] (old graph, new
//! graph) to subscribers. The reconciliation controller consumes the change
//! returned by each mutation synchronously; [`FlowchartStore::subscribe`]
//! exists for additional observers such as the presentation layer.
//!
//! # Examples
//!
//! ```rust
//! use flowsync::model::{EventDetails, FlowEdge, FlowNode, Position};
//! use flowsync::store::FlowchartStore;
//! use flowsync::types::{EdgeId, NodeId};
//!
//! let mut store = FlowchartStore::new();
//! store
//!     .add_node(FlowNode::new(
//!         NodeId::new("a"),
//!         Position::new(0.0, 0.0),
//!         EventDetails::new(1900, "a"),
//!     ))
//!     .unwrap();
//! store
//!     .add_node(FlowNode::new(
//!         NodeId::new("b"),
//!         Position::new(0.0, 100.0),
//!         EventDetails::new(1920, "b"),
//!     ))
//!     .unwrap();
//! store
//!     .add_edge(FlowEdge::new(
//!         EdgeId::new("a-b"),
//!         NodeId::new("a"),
//!         NodeId::new("b"),
//!     ))
//!     .unwrap();
//!
//! // Removing a node cascades to every edge referencing it.
//! store.remove_node(&NodeId::new("a"));
//! assert_eq!(store.edge_count(), 0);
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::model::{FlowEdge, FlowNode, NodePatch, Snapshot};
use crate::types::{EdgeId, NodeId};

/// Structural violations rejected at the store boundary.
///
/// All variants are fatal to the attempted operation but never to the
/// process: the store keeps its prior state untouched.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("id already exists: {id}")]
    #[diagnostic(
        code(flowsync::store::duplicate_id),
        help("Node and edge ids are never reused; mint a fresh id instead.")
    )]
    DuplicateId { id: String },

    #[error("node not found: {id}")]
    #[diagnostic(code(flowsync::store::not_found))]
    NotFound { id: NodeId },

    #[error("edge {edge} references missing node {missing}")]
    #[diagnostic(
        code(flowsync::store::dangling_endpoint),
        help("Both endpoints must exist in the store before an edge can be added.")
    )]
    DanglingEndpoint { edge: EdgeId, missing: NodeId },

    #[error("invalid snapshot: edge {edge} references missing node {missing}")]
    #[diagnostic(
        code(flowsync::store::invalid_snapshot),
        help("The incoming snapshot was rejected whole; prior state is unchanged.")
    )]
    InvalidSnapshot { edge: EdgeId, missing: NodeId },
}

/// Change notification emitted on every successful mutation.
#[derive(Clone, Debug)]
pub struct StoreChange {
    /// Graph state immediately before the mutation.
    pub before: Snapshot,
    /// Graph state immediately after the mutation.
    pub after: Snapshot,
    /// Store revision after the mutation.
    pub revision: u64,
}

/// In-memory authoritative representation of the flowchart.
#[derive(Debug, Default)]
pub struct FlowchartStore {
    nodes: FxHashMap<NodeId, FlowNode>,
    edges: FxHashMap<EdgeId, FlowEdge>,
    revision: u64,
    watchers: Vec<flume::Sender<StoreChange>>,
}

impl FlowchartStore {
    /// Create an empty store at revision 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from a snapshot.
    ///
    /// The snapshot is validated like [`replace_all`](Self::replace_all);
    /// the resulting store is clean at revision 0.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let (nodes, edges) = Self::validate_snapshot(snapshot.nodes, snapshot.edges)?;
        Ok(Self {
            nodes,
            edges,
            revision: 0,
            watchers: Vec::new(),
        })
    }

    /// Monotonically increasing revision, bumped on every successful
    /// state-changing mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&FlowNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&FlowEdge> {
        self.edges.get(id)
    }

    /// Full copy of the current graph in id-sorted order.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.nodes.values().cloned().collect(),
            self.edges.values().cloned().collect(),
        )
    }

    /// Subscribe to change notifications.
    ///
    /// Each subscriber receives every [`StoreChange`] emitted after the
    /// call; disconnected subscribers are pruned on the next broadcast.
    pub fn subscribe(&mut self) -> flume::Receiver<StoreChange> {
        let (tx, rx) = flume::unbounded();
        self.watchers.push(tx);
        rx
    }

    /// Add a node. Fails with [`StoreError::DuplicateId`] if the id exists.
    pub fn add_node(&mut self, node: FlowNode) -> Result<StoreChange, StoreError> {
        if self.nodes.contains_key(&node.id) {
            return Err(StoreError::DuplicateId {
                id: node.id.to_string(),
            });
        }
        let before = self.snapshot();
        self.nodes.insert(node.id.clone(), node);
        Ok(self.commit(before))
    }

    /// Remove a node and cascade removal of every edge referencing it.
    ///
    /// Absent id is a no-op (`None`), not an error.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<StoreChange> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        let before = self.snapshot();
        self.nodes.remove(id);
        self.edges.retain(|_, e| &e.source != id && &e.target != id);
        Some(self.commit(before))
    }

    /// Add an edge between two existing nodes.
    pub fn add_edge(&mut self, edge: FlowEdge) -> Result<StoreChange, StoreError> {
        if self.edges.contains_key(&edge.id) {
            return Err(StoreError::DuplicateId {
                id: edge.id.to_string(),
            });
        }
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(StoreError::DanglingEndpoint {
                    edge: edge.id.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        let before = self.snapshot();
        self.edges.insert(edge.id.clone(), edge);
        Ok(self.commit(before))
    }

    /// Remove an edge. Absent id is a no-op (`None`), not an error.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<StoreChange> {
        if !self.edges.contains_key(id) {
            return None;
        }
        let before = self.snapshot();
        self.edges.remove(id);
        Some(self.commit(before))
    }

    /// Merge a [`NodePatch`] into an existing node's position and event.
    ///
    /// Fails with [`StoreError::NotFound`] if the node is absent. A patch
    /// that changes nothing returns `Ok(None)` without bumping the revision,
    /// which keeps repeated identical auto-commits idempotent.
    pub fn update_node(
        &mut self,
        id: &NodeId,
        patch: NodePatch,
    ) -> Result<Option<StoreChange>, StoreError> {
        let Some(node) = self.nodes.get(id) else {
            return Err(StoreError::NotFound { id: id.clone() });
        };
        let mut updated = node.clone();
        if let Some(position) = patch.position {
            updated.position = position;
        }
        if let Some(year) = patch.year {
            updated.event.year = year;
        }
        if let Some(body) = patch.body {
            updated.event.body = body;
        }
        if let Some(country) = patch.country {
            updated.event.country = country;
        }
        if &updated == node {
            return Ok(None);
        }
        let before = self.snapshot();
        self.nodes.insert(id.clone(), updated);
        Ok(Some(self.commit(before)))
    }

    /// Atomically swap the entire graph.
    ///
    /// Used for load-on-start and remote overwrites. The incoming set is
    /// validated first; on [`StoreError::InvalidSnapshot`] the prior state
    /// is left untouched.
    pub fn replace_all(
        &mut self,
        nodes: Vec<FlowNode>,
        edges: Vec<FlowEdge>,
    ) -> Result<StoreChange, StoreError> {
        let (nodes, edges) = Self::validate_snapshot(nodes, edges)?;
        let before = self.snapshot();
        self.nodes = nodes;
        self.edges = edges;
        Ok(self.commit(before))
    }

    fn validate_snapshot(
        nodes: Vec<FlowNode>,
        edges: Vec<FlowEdge>,
    ) -> Result<(FxHashMap<NodeId, FlowNode>, FxHashMap<EdgeId, FlowEdge>), StoreError> {
        let mut node_map = FxHashMap::default();
        for node in nodes {
            let id = node.id.clone();
            if node_map.insert(id.clone(), node).is_some() {
                return Err(StoreError::DuplicateId { id: id.to_string() });
            }
        }
        let mut edge_map = FxHashMap::default();
        for edge in edges {
            for endpoint in [&edge.source, &edge.target] {
                if !node_map.contains_key(endpoint) {
                    return Err(StoreError::InvalidSnapshot {
                        edge: edge.id.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            let id = edge.id.clone();
            if edge_map.insert(id.clone(), edge).is_some() {
                return Err(StoreError::DuplicateId { id: id.to_string() });
            }
        }
        Ok((node_map, edge_map))
    }

    fn commit(&mut self, before: Snapshot) -> StoreChange {
        self.revision += 1;
        let change = StoreChange {
            before,
            after: self.snapshot(),
            revision: self.revision,
        };
        self.watchers.retain(|tx| tx.send(change.clone()).is_ok());
        change
    }
}
