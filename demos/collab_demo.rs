//! Two sessions collaborating on one flowchart through a shared in-memory
//! backend: an editor whose debounced saves land in the gateway, and a
//! viewer that picks them up over the live-update channel.
//!
//! Run with: `cargo run --example collab_demo`

use std::sync::Arc;
use std::time::Duration;

use flowsync::config::SyncConfig;
use flowsync::controller::SyncController;
use flowsync::gateway::{InMemoryGateway, PersistenceGateway};
use flowsync::live::ChannelListener;
use flowsync::model::{EventDetails, NodePatch, Position};
use flowsync::role::SharedRole;
use flowsync::types::NodeId;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    flowsync::telemetry::init();

    let gateway = Arc::new(InMemoryGateway::new());
    let hub = Arc::new(ChannelListener::new());
    let key = SyncConfig::default().key;

    let mut editor = SyncController::start(
        gateway.clone(),
        hub.clone(),
        Arc::new(SharedRole::editor()),
        SyncConfig::default(),
    )
    .await?;

    let viewer = SyncController::start(
        gateway.clone(),
        hub.clone(),
        Arc::new(SharedRole::viewer()),
        SyncConfig::default(),
    )
    .await?;

    println!("viewer starts with {} events", viewer.snapshot().nodes.len());

    // The editor adds an event and tweaks an existing one; both edits
    // coalesce into a single debounced save.
    let id = editor.add_event(
        Position::new(350.0, 350.0),
        EventDetails::new(1969, "First crewed Moon landing").with_country("United States"),
    )?;
    editor.update_event(&NodeId::new("1"), NodePatch::new().with_year(1879))?;
    println!("editor added {id} and updated event 1; waiting out the debounce window");

    tokio::time::sleep(Duration::from_millis(1500)).await;

    // Emulate the backend's change feed: every committed write is pushed to
    // all subscribers, the writer included (self-echo).
    if let Some(saved) = gateway.load(&key).await? {
        hub.publish(saved);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let seen = viewer.snapshot();
    println!(
        "viewer now sees {} events ({} edges), status on editor: {}",
        seen.nodes.len(),
        seen.edges.len(),
        editor.save_status()
    );

    editor.shutdown().await;
    viewer.shutdown().await;
    Ok(())
}
