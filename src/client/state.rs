//! Module `state`
//!
//! Defines the `ClientHandle` struct representing one active chat connection:
//! its remote address, the write half of its socket, and the display name it
//! has claimed (absent until the first successful claim).

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write half of a client connection, shared between the client's own session
/// handler (echo) and the broadcast engine (fan-out). The mutex serializes
/// writes so echo and broadcast bytes never interleave on one socket.
pub type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Represents one connected chat client.
///
/// Owned by the registry for the lifetime of the connection's read loop; the
/// session handler keeps the read half and a clone of the shared writer.
pub struct ClientHandle {
    addr: SocketAddr,
    name: Option<String>,
    writer: SharedWriter,
}

impl ClientHandle {
    pub fn new(addr: SocketAddr, writer: SharedWriter) -> Self {
        Self {
            addr,
            name: None,
            writer,
        }
    }

    /// Returns the remote socket address of this connection.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the claimed display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns a clone of the shared writer for this connection.
    pub fn writer(&self) -> SharedWriter {
        Arc::clone(&self.writer)
    }

    /// Binds a display name to this connection.
    ///
    /// The registry only calls this once per handle; the name is sticky.
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}
