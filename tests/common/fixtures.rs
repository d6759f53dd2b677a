use flowsync::model::{EventDetails, FlowEdge, FlowNode, Position, Snapshot};
use flowsync::store::FlowchartStore;
use flowsync::types::{EdgeId, NodeId};

pub fn node(id: &str, year: i32) -> FlowNode {
    FlowNode::new(
        NodeId::new(id),
        Position::new(0.0, 0.0),
        EventDetails::new(year, format!("event {id}")),
    )
}

pub fn edge(id: &str, source: &str, target: &str) -> FlowEdge {
    FlowEdge::new(EdgeId::new(id), NodeId::new(source), NodeId::new(target))
}

/// Two nodes `a@1900` and `b@1920` joined by `a -> b`.
pub fn two_node_snapshot() -> Snapshot {
    Snapshot::new(
        vec![node("a", 1900), node("b", 1920)],
        vec![edge("a-b", "a", "b")],
    )
}

pub fn two_node_store() -> FlowchartStore {
    FlowchartStore::from_snapshot(two_node_snapshot()).unwrap()
}
