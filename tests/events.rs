use std::time::Duration;

use flowsync::events::{ChannelSink, EventBus, MemorySink, SyncEvent};
use flowsync::types::SaveStatus;

#[tokio::test]
async fn bus_broadcasts_to_all_sinks_in_order() {
    let memory = MemorySink::new();
    let (tx, rx) = flume::unbounded();
    let bus = EventBus::with_sinks(vec![
        Box::new(memory.clone()),
        Box::new(ChannelSink::new(tx)),
    ]);
    bus.listen_for_events();

    let sender = bus.get_sender();
    sender.send(SyncEvent::status(SaveStatus::Saving, 1)).unwrap();
    sender.send(SyncEvent::status(SaveStatus::Saved, 1)).unwrap();
    sender
        .send(SyncEvent::diagnostic("lifecycle", "done"))
        .unwrap();

    // Give the listener task a moment to drain.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let captured = memory.snapshot();
    assert_eq!(captured.len(), 3);
    assert!(matches!(&captured[0], SyncEvent::Status(s) if s.status == SaveStatus::Saving));
    assert!(matches!(&captured[1], SyncEvent::Status(s) if s.status == SaveStatus::Saved));
    assert!(matches!(&captured[2], SyncEvent::Diagnostic(d) if d.message == "done"));

    let streamed: Vec<_> = rx.drain().collect();
    assert_eq!(streamed, captured);

    bus.stop_listener().await;
}

#[tokio::test]
async fn listen_for_events_is_idempotent() {
    let memory = MemorySink::new();
    let bus = EventBus::with_sink(memory.clone());
    bus.listen_for_events();
    bus.listen_for_events();

    bus.get_sender()
        .send(SyncEvent::remote_overwrite(false))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // A duplicate listener would double-deliver.
    assert_eq!(memory.snapshot().len(), 1);
    bus.stop_listener().await;
}

#[tokio::test]
async fn sinks_can_be_added_while_listening() {
    let bus = EventBus::with_sink(MemorySink::new());
    bus.listen_for_events();

    let late = MemorySink::new();
    bus.add_sink(late.clone());
    bus.get_sender()
        .send(SyncEvent::status(SaveStatus::Error, 7))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(late.snapshot().len(), 1);
    bus.stop_listener().await;
}
