//! Data model for the flowchart document.
//!
//! A flowchart is a directed graph of timestamped, annotated events. This
//! module defines the node/edge shapes, the whole-document [`Snapshot`]
//! exchanged with persistence and live-update channels, and the pure
//! display-time helpers that keep interpretation out of the stored model.
//!
//! # Examples
//!
//! ```rust
//! use flowsync::model::{EventDetails, FlowEdge, FlowNode, Position, Snapshot};
//! use flowsync::types::{EdgeId, NodeId};
//!
//! let a = FlowNode::new(
//!     NodeId::new("a"),
//!     Position { x: 100.0, y: 50.0 },
//!     EventDetails::new(1900, "Turn of the century"),
//! );
//! let b = FlowNode::new(
//!     NodeId::new("b"),
//!     Position { x: 100.0, y: 150.0 },
//!     EventDetails::new(1920, "Twenty years on"),
//! );
//! let edge = FlowEdge::new(EdgeId::new("a-b"), NodeId::new("a"), NodeId::new("b"));
//!
//! let snapshot = Snapshot::new(vec![a, b], vec![edge]);
//! assert!(snapshot.dangling_endpoint().is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{EdgeId, NodeId};

/// Free-form 2-D coordinate of a node on the canvas.
///
/// Unbounded in both axes; mutated by drag operations in the presentation
/// layer and stored verbatim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The annotated, timestamped payload of a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Year the event occurred. Validated against the configured bounds by
    /// the edit session; the model itself stores whatever it is given.
    pub year: i32,
    /// Free-form rich text. Stored and transmitted verbatim; sanitization,
    /// if any, is a rendering-layer concern.
    pub body: String,
    /// Present-or-absent country tag. Absence means the display layer may
    /// inherit a value from an ancestor node; the model never copies one in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl EventDetails {
    pub fn new(year: i32, body: impl Into<String>) -> Self {
        Self {
            year,
            body: body.into(),
            country: None,
        }
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// A single event node in the flowchart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: NodeId,
    pub position: Position,
    pub event: EventDetails,
}

impl FlowNode {
    pub fn new(id: NodeId, position: Position, event: EventDetails) -> Self {
        Self {
            id,
            position,
            event,
        }
    }
}

/// A directed edge between two event nodes.
///
/// Edges carry no payload beyond their endpoints and a display-only
/// `animated` flag that the core logic ignores. Self-loops are permitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub animated: bool,
}

impl FlowEdge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            animated: false,
        }
    }

    #[must_use]
    pub fn animated(mut self) -> Self {
        self.animated = true;
        self
    }
}

/// Partial update applied to a node's `position` and `event` fields.
///
/// Every field is optional; absent fields leave the node untouched. The
/// `country` field is doubly optional so "clear the country" (`Some(None)`)
/// is distinguishable from "leave it alone" (`None`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePatch {
    pub position: Option<Position>,
    pub year: Option<i32>,
    pub body: Option<String>,
    pub country: Option<Option<String>>,
}

impl NodePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = Some(country);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.year.is_none()
            && self.body.is_none()
            && self.country.is_none()
    }
}

/// Full serialized copy of the flowchart's node and edge sets at one
/// instant.
///
/// Snapshots are the unit of exchange with the persistence gateway and the
/// live-update channel: every save is a full-document replace and every
/// delivery is a full authoritative replacement, never a diff. Nodes and
/// edges are kept in id-sorted order so equal graphs compare equal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl Snapshot {
    /// Build a snapshot, normalizing node and edge order by id.
    pub fn new(mut nodes: Vec<FlowNode>, mut edges: Vec<FlowEdge>) -> Self {
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        Self { nodes, edges }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&FlowEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// First edge endpoint that references a node absent from the node set,
    /// or `None` when the edge-endpoint invariant holds.
    #[must_use]
    pub fn dangling_endpoint(&self) -> Option<(&EdgeId, &NodeId)> {
        let ids: rustc_hash::FxHashSet<&NodeId> = self.nodes.iter().map(|n| &n.id).collect();
        for edge in &self.edges {
            if !ids.contains(&edge.source) {
                return Some((&edge.id, &edge.source));
            }
            if !ids.contains(&edge.target) {
                return Some((&edge.id, &edge.target));
            }
        }
        None
    }
}

/// Resolve the country to display for `node`, inheriting from the nearest
/// ancestor that carries one when the node itself does not.
///
/// `ancestors` is ordered nearest-first. This is a pure display-time
/// interpretation consumed only by presentation; the stored model remains
/// exactly present-or-absent.
#[must_use]
pub fn resolve_display_country<'a>(
    node: &'a FlowNode,
    ancestors: &[&'a FlowNode],
) -> Option<&'a str> {
    node.event
        .country
        .as_deref()
        .or_else(|| ancestors.iter().find_map(|a| a.event.country.as_deref()))
}

/// Built-in seed graph used when no remote snapshot exists yet.
///
/// Five sample events chained in chronological order, starting at the
/// domain floor year.
#[must_use]
pub fn default_flowchart() -> Snapshot {
    let nodes = vec![
        FlowNode::new(
            NodeId::new("1"),
            Position::new(100.0, 50.0),
            EventDetails::new(1878, "First commercial telephone exchange opens")
                .with_country("United States"),
        ),
        FlowNode::new(
            NodeId::new("2"),
            Position::new(100.0, 150.0),
            EventDetails::new(1903, "First powered flight").with_country("United States"),
        ),
        FlowNode::new(
            NodeId::new("3"),
            Position::new(300.0, 150.0),
            EventDetails::new(1928, "Penicillin discovered").with_country("United Kingdom"),
        ),
        FlowNode::new(
            NodeId::new("4"),
            Position::new(200.0, 250.0),
            EventDetails::new(1957, "First artificial satellite launched"),
        ),
        FlowNode::new(
            NodeId::new("5"),
            Position::new(200.0, 350.0),
            EventDetails::new(1989, "World Wide Web proposed"),
        ),
    ];
    let edges = vec![
        FlowEdge::new(EdgeId::new("e1-2"), NodeId::new("1"), NodeId::new("2")).animated(),
        FlowEdge::new(EdgeId::new("e2-3"), NodeId::new("2"), NodeId::new("3")).animated(),
        FlowEdge::new(EdgeId::new("e3-4"), NodeId::new("3"), NodeId::new("4")).animated(),
        FlowEdge::new(EdgeId::new("e4-5"), NodeId::new("4"), NodeId::new("5")).animated(),
    ];
    Snapshot::new(nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_orders_by_id() {
        let snapshot = Snapshot::new(
            vec![
                FlowNode::new(
                    NodeId::new("b"),
                    Position::default(),
                    EventDetails::new(1900, ""),
                ),
                FlowNode::new(
                    NodeId::new("a"),
                    Position::default(),
                    EventDetails::new(1901, ""),
                ),
            ],
            vec![],
        );
        assert_eq!(snapshot.nodes[0].id, NodeId::new("a"));
        assert_eq!(snapshot.nodes[1].id, NodeId::new("b"));
    }

    #[test]
    fn dangling_endpoint_reports_missing_target() {
        let snapshot = Snapshot::new(
            vec![FlowNode::new(
                NodeId::new("a"),
                Position::default(),
                EventDetails::new(1900, ""),
            )],
            vec![FlowEdge::new(
                EdgeId::new("e"),
                NodeId::new("a"),
                NodeId::new("ghost"),
            )],
        );
        let (edge, missing) = snapshot.dangling_endpoint().unwrap();
        assert_eq!(edge, &EdgeId::new("e"));
        assert_eq!(missing, &NodeId::new("ghost"));
    }

    #[test]
    fn country_inherits_from_nearest_ancestor() {
        let child = FlowNode::new(
            NodeId::new("c"),
            Position::default(),
            EventDetails::new(1950, "child"),
        );
        let near = FlowNode::new(
            NodeId::new("n"),
            Position::default(),
            EventDetails::new(1940, "near").with_country("France"),
        );
        let far = FlowNode::new(
            NodeId::new("f"),
            Position::default(),
            EventDetails::new(1930, "far").with_country("Japan"),
        );
        assert_eq!(
            resolve_display_country(&child, &[&near, &far]),
            Some("France")
        );
        assert_eq!(resolve_display_country(&near, &[&far]), Some("France"));
        assert_eq!(resolve_display_country(&child, &[]), None);
    }

    #[test]
    fn default_flowchart_is_structurally_valid() {
        let snapshot = default_flowchart();
        assert_eq!(snapshot.nodes.len(), 5);
        assert_eq!(snapshot.edges.len(), 4);
        assert!(snapshot.dangling_endpoint().is_none());
        assert!(snapshot.nodes.iter().all(|n| n.event.year >= 1878));
    }
}
