mod common;

use common::*;
use flowsync::model::{NodePatch, Position};
use flowsync::store::{FlowchartStore, StoreError};
use flowsync::types::{EdgeId, NodeId};

#[test]
fn add_node_rejects_duplicate_id() {
    let mut store = FlowchartStore::new();
    store.add_node(node("a", 1900)).unwrap();
    let err = store.add_node(node("a", 1950)).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId { .. }));
    assert_eq!(store.node_count(), 1);
    // The original node is untouched.
    assert_eq!(store.node(&NodeId::new("a")).unwrap().event.year, 1900);
}

#[test]
fn add_edge_rejects_dangling_endpoints() {
    let mut store = FlowchartStore::new();
    store.add_node(node("a", 1900)).unwrap();
    let err = store.add_edge(edge("e", "a", "ghost")).unwrap_err();
    match err {
        StoreError::DanglingEndpoint { missing, .. } => {
            assert_eq!(missing, NodeId::new("ghost"));
        }
        other => panic!("expected DanglingEndpoint, got {other:?}"),
    }
    assert_eq!(store.edge_count(), 0);
}

#[test]
fn add_edge_rejects_duplicate_id() {
    let mut store = two_node_store();
    let err = store.add_edge(edge("a-b", "b", "a")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId { .. }));
}

#[test]
fn self_loops_are_permitted() {
    let mut store = FlowchartStore::new();
    store.add_node(node("a", 1900)).unwrap();
    store.add_edge(edge("loop", "a", "a")).unwrap();
    assert_eq!(store.edge_count(), 1);
}

#[test]
fn remove_node_cascades_referencing_edges() {
    let mut store = two_node_store();
    let change = store.remove_node(&NodeId::new("a")).unwrap();
    assert_eq!(store.node_count(), 1);
    assert_eq!(store.edge_count(), 0);
    assert!(store.contains_node(&NodeId::new("b")));
    // The notification carries both states.
    assert_eq!(change.before.nodes.len(), 2);
    assert_eq!(change.after.edges.len(), 0);
}

#[test]
fn remove_absent_node_is_a_noop() {
    let mut store = two_node_store();
    let revision = store.revision();
    assert!(store.remove_node(&NodeId::new("ghost")).is_none());
    assert_eq!(store.revision(), revision);
}

#[test]
fn remove_absent_edge_is_a_noop() {
    let mut store = two_node_store();
    let revision = store.revision();
    assert!(store.remove_edge(&EdgeId::new("ghost")).is_none());
    assert_eq!(store.revision(), revision);
}

#[test]
fn update_node_merges_patch_fields() {
    let mut store = two_node_store();
    store
        .update_node(
            &NodeId::new("a"),
            NodePatch::new()
                .with_position(Position::new(40.0, 60.0))
                .with_year(1910)
                .with_country(Some("France".to_string())),
        )
        .unwrap()
        .expect("patch changes the node");
    let updated = store.node(&NodeId::new("a")).unwrap();
    assert_eq!(updated.position, Position::new(40.0, 60.0));
    assert_eq!(updated.event.year, 1910);
    assert_eq!(updated.event.country.as_deref(), Some("France"));
    // Unpatched fields survive.
    assert_eq!(updated.event.body, "event a");
}

#[test]
fn update_node_with_identical_content_skips_revision() {
    let mut store = two_node_store();
    let revision = store.revision();
    let change = store
        .update_node(&NodeId::new("a"), NodePatch::new().with_year(1900))
        .unwrap();
    assert!(change.is_none());
    assert_eq!(store.revision(), revision);
}

#[test]
fn update_missing_node_fails_with_not_found() {
    let mut store = FlowchartStore::new();
    let err = store
        .update_node(&NodeId::new("ghost"), NodePatch::new().with_year(1900))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn replace_all_swaps_the_graph_atomically() {
    let mut store = two_node_store();
    let incoming = vec![node("x", 1950)];
    store.replace_all(incoming, vec![]).unwrap();
    assert_eq!(store.node_count(), 1);
    assert!(store.contains_node(&NodeId::new("x")));
    assert_eq!(store.edge_count(), 0);
}

#[test]
fn replace_all_with_dangling_edge_keeps_prior_state() {
    let mut store = two_node_store();
    let before = store.snapshot();
    let revision = store.revision();

    let err = store
        .replace_all(vec![node("x", 1950)], vec![edge("bad", "x", "ghost")])
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidSnapshot { .. }));

    // Prior graph untouched, byte for byte.
    assert_eq!(store.snapshot(), before);
    assert_eq!(store.revision(), revision);
}

#[test]
fn replace_all_rejects_duplicate_node_ids() {
    let mut store = FlowchartStore::new();
    let err = store
        .replace_all(vec![node("a", 1900), node("a", 1950)], vec![])
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId { .. }));
}

#[test]
fn every_successful_mutation_notifies_subscribers() {
    let mut store = FlowchartStore::new();
    let changes = store.subscribe();

    store.add_node(node("a", 1900)).unwrap();
    store.add_node(node("b", 1920)).unwrap();
    store.add_edge(edge("a-b", "a", "b")).unwrap();
    store.remove_edge(&EdgeId::new("a-b")).unwrap();
    store.remove_node(&NodeId::new("b")).unwrap();

    let received: Vec<_> = changes.drain().collect();
    assert_eq!(received.len(), 5);
    // Revisions are strictly increasing.
    let revisions: Vec<_> = received.iter().map(|c| c.revision).collect();
    assert_eq!(revisions, vec![1, 2, 3, 4, 5]);
    // Each notification chains: this change's before is the previous after.
    for pair in received.windows(2) {
        assert_eq!(pair[0].after, pair[1].before);
    }
}

#[test]
fn failed_mutations_do_not_notify() {
    let mut store = two_node_store();
    let changes = store.subscribe();
    let _ = store.add_node(node("a", 1900)).unwrap_err();
    let _ = store.add_edge(edge("e", "a", "ghost")).unwrap_err();
    assert!(changes.is_empty());
}
