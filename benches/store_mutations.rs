use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use flowsync::model::{EventDetails, FlowEdge, FlowNode, Position};
use flowsync::store::FlowchartStore;
use flowsync::types::{EdgeId, NodeId};

fn build_chain(n: usize) -> FlowchartStore {
    let mut store = FlowchartStore::new();
    for i in 0..n {
        store
            .add_node(FlowNode::new(
                NodeId::new(format!("n{i}")),
                Position::new(i as f64 * 10.0, 0.0),
                EventDetails::new(1878 + (i as i32 % 200), "bench event"),
            ))
            .unwrap();
        if i > 0 {
            store
                .add_edge(FlowEdge::new(
                    EdgeId::new(format!("e{i}")),
                    NodeId::new(format!("n{}", i - 1)),
                    NodeId::new(format!("n{i}")),
                ))
                .unwrap();
        }
    }
    store
}

fn bench_store_mutations(c: &mut Criterion) {
    c.bench_function("build_chain_100", |b| {
        b.iter(|| black_box(build_chain(100)));
    });

    c.bench_function("snapshot_100", |b| {
        let store = build_chain(100);
        b.iter(|| black_box(store.snapshot()));
    });

    c.bench_function("replace_all_100", |b| {
        let snapshot = build_chain(100).snapshot();
        let mut store = build_chain(100);
        b.iter(|| {
            store
                .replace_all(snapshot.nodes.clone(), snapshot.edges.clone())
                .unwrap()
        });
    });

    c.bench_function("cascade_remove_hub_node", |b| {
        b.iter_batched(
            || {
                let mut store = build_chain(50);
                // Fan every node into a hub so removal cascades widely.
                store
                    .add_node(FlowNode::new(
                        NodeId::new("hub"),
                        Position::default(),
                        EventDetails::new(1900, "hub"),
                    ))
                    .unwrap();
                for i in 0..50 {
                    store
                        .add_edge(FlowEdge::new(
                            EdgeId::new(format!("hub{i}")),
                            NodeId::new(format!("n{i}")),
                            NodeId::new("hub"),
                        ))
                        .unwrap();
                }
                store
            },
            |mut store| {
                store.remove_node(&NodeId::new("hub"));
                black_box(store)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_store_mutations);
criterion_main!(benches);
