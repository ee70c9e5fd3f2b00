//! Broadcast engine
//!
//! Fans a payload out to every connected client, optionally excluding one
//! connection (the sender). Sends iterate a registry snapshot so no lock is
//! held during socket I/O; clients whose writes fail are treated as
//! disconnected and pruned from the registry. Best effort, at most once.

use std::net::SocketAddr;

use log::warn;
use tokio::io::AsyncWriteExt;

use crate::client::registry::ClientRegistry;

/// Sends `payload` to every registered client except `exclude`.
///
/// Exclusion is by connection identity (socket address), not by name.
pub async fn broadcast(registry: &ClientRegistry, payload: &str, exclude: Option<SocketAddr>) {
    for (addr, writer) in registry.snapshot_clients().await {
        if exclude == Some(addr) {
            continue;
        }

        let result = writer.lock().await.write_all(payload.as_bytes()).await;
        if let Err(e) = result {
            warn!("Dropping client {} after failed send: {}", addr, e);
            registry.unregister(addr).await;
        }
    }
}

/// Pushes the roster of claimed names to every connected client.
///
/// Format: `Online: alice, bob` in claim order, or `Online: None` when no
/// client has claimed a name yet.
pub async fn announce_roster(registry: &ClientRegistry) {
    let names = registry.snapshot_names().await;
    let roster = if names.is_empty() {
        "Online: None".to_string()
    } else {
        format!("Online: {}", names.join(", "))
    };
    broadcast(registry, &roster, None).await;
}
