#[macro_use]
extern crate proptest;

use proptest::prelude::{Strategy, any, prop};

use flowsync::model::{EventDetails, FlowEdge, FlowNode, NodePatch, Position};
use flowsync::store::FlowchartStore;
use flowsync::types::{EdgeId, NodeId};

// Generators shared by the store property tests

/// Small id pool so operations frequently collide on the same ids,
/// exercising duplicate/absent paths as well as the happy path.
fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e][0-9]").unwrap()
}

#[derive(Clone, Debug)]
enum Op {
    AddNode { id: String, year: i32 },
    RemoveNode { id: String },
    AddEdge { id: String, source: String, target: String },
    RemoveEdge { id: String },
    UpdateNode { id: String, year: i32 },
    ReplaceAll { node_ids: Vec<String> },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (id_strategy(), 1878i32..2100).prop_map(|(id, year)| Op::AddNode { id, year }),
        id_strategy().prop_map(|id| Op::RemoveNode { id }),
        (id_strategy(), id_strategy(), id_strategy())
            .prop_map(|(id, source, target)| Op::AddEdge { id, source, target }),
        id_strategy().prop_map(|id| Op::RemoveEdge { id }),
        (id_strategy(), 1878i32..2100).prop_map(|(id, year)| Op::UpdateNode { id, year }),
        prop::collection::vec(id_strategy(), 0..4).prop_map(|node_ids| Op::ReplaceAll { node_ids }),
    ]
}

fn apply(store: &mut FlowchartStore, op: Op) {
    match op {
        Op::AddNode { id, year } => {
            let _ = store.add_node(FlowNode::new(
                NodeId::new(id),
                Position::default(),
                EventDetails::new(year, "generated"),
            ));
        }
        Op::RemoveNode { id } => {
            let _ = store.remove_node(&NodeId::new(id));
        }
        Op::AddEdge { id, source, target } => {
            let _ = store.add_edge(FlowEdge::new(
                EdgeId::new(id),
                NodeId::new(source),
                NodeId::new(target),
            ));
        }
        Op::RemoveEdge { id } => {
            let _ = store.remove_edge(&EdgeId::new(id));
        }
        Op::UpdateNode { id, year } => {
            let _ = store.update_node(&NodeId::new(id), NodePatch::new().with_year(year));
        }
        Op::ReplaceAll { node_ids } => {
            let mut nodes: Vec<FlowNode> = node_ids
                .into_iter()
                .map(|id| {
                    FlowNode::new(
                        NodeId::new(id),
                        Position::default(),
                        EventDetails::new(1900, "replacement"),
                    )
                })
                .collect();
            nodes.sort_by(|a, b| a.id.cmp(&b.id));
            nodes.dedup_by(|a, b| a.id == b.id);
            let _ = store.replace_all(nodes, vec![]);
        }
    }
}

proptest! {
    /// The edge-endpoint invariant holds after every operation in any
    /// sequence, accepted or rejected.
    #[test]
    fn prop_endpoint_invariant_holds_after_every_op(
        ops in prop::collection::vec(op_strategy(), 1..64),
    ) {
        let mut store = FlowchartStore::new();
        for op in ops {
            apply(&mut store, op);
            let snapshot = store.snapshot();
            prop_assert!(
                snapshot.dangling_endpoint().is_none(),
                "dangling endpoint after mutation: {:?}",
                snapshot.dangling_endpoint()
            );
        }
    }

    /// Removing a node leaves no edge referencing it.
    #[test]
    fn prop_remove_node_leaves_no_references(
        ops in prop::collection::vec(op_strategy(), 1..32),
        victim in id_strategy(),
    ) {
        let mut store = FlowchartStore::new();
        for op in ops {
            apply(&mut store, op);
        }
        let victim = NodeId::new(victim);
        store.remove_node(&victim);
        let snapshot = store.snapshot();
        prop_assert!(snapshot.edges.iter().all(|e| e.source != victim && e.target != victim));
    }

    /// Revision only moves forward, and only on accepted mutations.
    #[test]
    fn prop_revision_is_monotonic(
        ops in prop::collection::vec(op_strategy(), 1..64),
    ) {
        let mut store = FlowchartStore::new();
        let mut last = store.revision();
        for op in ops {
            apply(&mut store, op);
            prop_assert!(store.revision() >= last);
            last = store.revision();
        }
    }

    /// Snapshot round-trips through `from_snapshot` unchanged.
    #[test]
    fn prop_snapshot_round_trips(
        ops in prop::collection::vec(op_strategy(), 1..32),
        _seed in any::<u8>(),
    ) {
        let mut store = FlowchartStore::new();
        for op in ops {
            apply(&mut store, op);
        }
        let snapshot = store.snapshot();
        let restored = FlowchartStore::from_snapshot(snapshot.clone()).unwrap();
        prop_assert_eq!(restored.snapshot(), snapshot);
    }
}
