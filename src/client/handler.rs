//! Module `handler`
//!
//! Runs the per-connection session loop: reads inbound messages, attempts a
//! display-name claim, echoes the message back to the sender, rebroadcasts it
//! to everyone else, and pushes the updated roster. The loop ends when the
//! peer closes the connection, a read fails, or the server shuts down; either
//! way the client is unregistered and its socket closed.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::watch;

use crate::broadcast;
use crate::client::registry::ClientRegistry;
use crate::client::state::SharedWriter;

/// Processes messages from a single chat client.
///
/// One `read` is one logical message: the payload must decode as UTF-8 and
/// is trimmed, with no reassembly of messages split across reads and no
/// splitting of a read that carries several lines. An input that trims to
/// empty is deliberately a no-op: no echo, no broadcast, no roster push. A
/// payload that is not valid UTF-8 is a per-client failure like any read
/// error: the session ends and the client is pruned, nothing is relayed.
///
/// Every non-empty message doubles as a name-claim candidate; the claim
/// succeeds at most once per connection, so chat lines from an already-named
/// client pass through the claim check harmlessly.
pub async fn handle_client(
    mut reader: OwnedReadHalf,
    writer: SharedWriter,
    addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buffer = [0u8; 1024];

    // The entry check covers sessions spawned in the same tick as stop():
    // their receiver would otherwise never observe the flag flipping.
    while !*shutdown.borrow() {
        let n = tokio::select! {
            result = reader.read(&mut buffer) => match result {
                Ok(0) => {
                    // Connection closed gracefully by client
                    info!("Connection closed by client {}", addr);
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("Failed to read from client {}: {}", addr, e);
                    break;
                }
            },
            // Server shutdown unblocks the pending read deterministically.
            _ = shutdown.changed() => break,
        };

        let text = match std::str::from_utf8(&buffer[..n]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Dropping client {} after undecodable payload: {}", addr, e);
                break;
            }
        };
        let message = text.trim();
        if message.is_empty() {
            continue;
        }

        info!("From {}: {}", addr.ip(), message);

        // First well-formed message becomes the display name; later
        // attempts are ignored by the registry.
        registry.try_claim_name(addr, message).await;

        // Echo to the sender before anyone else sees the message.
        let echoed = writer
            .lock()
            .await
            .write_all(format!("Echo: {}", message).as_bytes())
            .await;
        if let Err(e) = echoed {
            warn!("Failed to echo to client {}: {}", addr, e);
            break;
        }

        broadcast::broadcast(&registry, &format!("{}: {}", addr.ip(), message), Some(addr)).await;
        broadcast::announce_roster(&registry).await;
    }

    registry.unregister(addr).await;
    let _ = writer.lock().await.shutdown().await;
    info!("Client {} disconnected", addr);
}
