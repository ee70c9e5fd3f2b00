//! Client registry
//!
//! Tracks active connections and claimed display names behind a single lock.
//! All shared mutable state of the server lives here; every observer takes a
//! snapshot under the lock and performs socket I/O without it.

use std::collections::HashMap;
use std::net::SocketAddr;

use log::{debug, info};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::client::state::{ClientHandle, SharedWriter};

/// Read-only view of the registry for external collaborators
/// (e.g. an HTTP status endpoint layered on top of the server).
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub online_names: Vec<String>,
    pub client_count: usize,
}

struct RegistryInner {
    clients: HashMap<SocketAddr, ClientHandle>,
    // Claim order is preserved so the roster lists names in join order.
    names: Vec<String>,
}

/// Registry for tracking active clients and claimed names.
pub struct ClientRegistry {
    inner: Mutex<RegistryInner>,
    max_name_length: usize,
}

impl ClientRegistry {
    pub fn new(max_name_length: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                clients: HashMap::new(),
                names: Vec::new(),
            }),
            max_name_length,
        }
    }

    /// Adds a connection to the registry. Always succeeds.
    pub async fn register(&self, handle: ClientHandle) {
        let mut inner = self.inner.lock().await;
        let count = inner.clients.len() + 1;
        debug!("Registered client {} ({} connected)", handle.addr(), count);
        inner.clients.insert(handle.addr(), handle);
    }

    /// Removes a connection and frees its claimed name, if any.
    ///
    /// Idempotent: unregistering an absent address is a no-op.
    pub async fn unregister(&self, addr: SocketAddr) {
        let mut inner = self.inner.lock().await;
        if let Some(handle) = inner.clients.remove(&addr) {
            if let Some(name) = handle.name() {
                let name = name.to_string();
                inner.names.retain(|n| n != &name);
                info!("Name '{}' released by {}", name, addr);
            }
        }
    }

    /// Attempts to bind `candidate` as the display name of `addr`.
    ///
    /// Succeeds iff the handle has no name yet, the candidate is non-empty,
    /// at most `max_name_length` characters, and not claimed by another live
    /// client. Returns whether the claim succeeded; rejection is not an
    /// error, the caller simply continues with the connection unnamed.
    pub async fn try_claim_name(&self, addr: SocketAddr, candidate: &str) -> bool {
        if candidate.is_empty() || candidate.chars().count() > self.max_name_length {
            return false;
        }

        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if inner.names.iter().any(|n| n == candidate) {
            return false;
        }

        match inner.clients.get_mut(&addr) {
            Some(handle) if handle.name().is_none() => {
                handle.set_name(candidate.to_string());
                inner.names.push(candidate.to_string());
                info!("Client {} claimed name '{}'", addr, candidate);
                true
            }
            // Already named (sticky) or not registered at all.
            _ => false,
        }
    }

    /// Point-in-time copy of all connections for lock-free iteration.
    pub async fn snapshot_clients(&self) -> Vec<(SocketAddr, SharedWriter)> {
        let inner = self.inner.lock().await;
        inner
            .clients
            .values()
            .map(|handle| (handle.addr(), handle.writer()))
            .collect()
    }

    /// Point-in-time copy of all claimed names, in claim order.
    pub async fn snapshot_names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.names.clone()
    }

    pub async fn client_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.clients.len()
    }

    /// Collaborator-facing status snapshot.
    pub async fn status(&self) -> ServerStatus {
        let inner = self.inner.lock().await;
        ServerStatus {
            online_names: inner.names.clone(),
            client_count: inner.clients.len(),
        }
    }

    /// Drops every connection record and claimed name, returning the writers
    /// so the caller can close the underlying sockets. Used by shutdown.
    pub async fn clear(&self) -> Vec<SharedWriter> {
        let mut inner = self.inner.lock().await;
        inner.names.clear();
        inner
            .clients
            .drain()
            .map(|(_, handle)| handle.writer())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::net::{TcpListener, TcpStream};

    // Registry handles need a real write half; pair up loopback sockets.
    async fn test_handle() -> ClientHandle {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let local = client.local_addr().unwrap();
        let _accepted = listener.accept().await.unwrap();
        let (_reader, writer) = client.into_split();
        ClientHandle::new(local, Arc::new(Mutex::new(writer)))
    }

    #[tokio::test]
    async fn claim_succeeds_once_per_name() {
        let registry = ClientRegistry::new(50);
        let a = test_handle().await;
        let b = test_handle().await;
        let (addr_a, addr_b) = (a.addr(), b.addr());
        registry.register(a).await;
        registry.register(b).await;

        assert!(registry.try_claim_name(addr_a, "alice").await);
        assert!(!registry.try_claim_name(addr_b, "alice").await);
        assert_eq!(registry.snapshot_names().await, vec!["alice"]);
    }

    #[tokio::test]
    async fn claim_is_sticky_per_handle() {
        let registry = ClientRegistry::new(50);
        let handle = test_handle().await;
        let addr = handle.addr();
        registry.register(handle).await;

        assert!(registry.try_claim_name(addr, "alice").await);
        // Later messages from the same client are not renames.
        assert!(!registry.try_claim_name(addr, "carol").await);
        assert_eq!(registry.snapshot_names().await, vec!["alice"]);
    }

    #[tokio::test]
    async fn claim_rejects_empty_and_overlong_names() {
        let registry = ClientRegistry::new(5);
        let handle = test_handle().await;
        let addr = handle.addr();
        registry.register(handle).await;

        assert!(!registry.try_claim_name(addr, "").await);
        assert!(!registry.try_claim_name(addr, "toolongname").await);
        assert!(registry.try_claim_name(addr, "bob").await);
    }

    #[tokio::test]
    async fn claim_requires_registration() {
        let registry = ClientRegistry::new(50);
        let handle = test_handle().await;
        assert!(!registry.try_claim_name(handle.addr(), "ghost").await);
        assert!(registry.snapshot_names().await.is_empty());
    }

    #[tokio::test]
    async fn unregister_frees_name_and_is_idempotent() {
        let registry = ClientRegistry::new(50);
        let a = test_handle().await;
        let addr_a = a.addr();
        registry.register(a).await;
        assert!(registry.try_claim_name(addr_a, "alice").await);

        registry.unregister(addr_a).await;
        assert!(registry.snapshot_names().await.is_empty());
        assert_eq!(registry.client_count().await, 0);

        // Second unregister is a no-op.
        registry.unregister(addr_a).await;

        // Name is immediately reclaimable by a new client.
        let b = test_handle().await;
        let addr_b = b.addr();
        registry.register(b).await;
        assert!(registry.try_claim_name(addr_b, "alice").await);
    }

    #[tokio::test]
    async fn roster_preserves_claim_order() {
        let registry = ClientRegistry::new(50);
        for name in ["carol", "alice", "bob"] {
            let handle = test_handle().await;
            let addr = handle.addr();
            registry.register(handle).await;
            assert!(registry.try_claim_name(addr, name).await);
        }
        assert_eq!(
            registry.snapshot_names().await,
            vec!["carol", "alice", "bob"]
        );
    }

    #[tokio::test]
    async fn status_reports_names_and_count() {
        let registry = ClientRegistry::new(50);
        let named = test_handle().await;
        let addr = named.addr();
        registry.register(named).await;
        assert!(registry.try_claim_name(addr, "alice").await);

        // A second client that never claims a name still counts.
        registry.register(test_handle().await).await;

        let status = registry.status().await;
        assert_eq!(status.online_names, vec!["alice"]);
        assert_eq!(status.client_count, 2);
    }

    #[tokio::test]
    async fn clear_empties_registry() {
        let registry = ClientRegistry::new(50);
        let handle = test_handle().await;
        let addr = handle.addr();
        registry.register(handle).await;
        assert!(registry.try_claim_name(addr, "alice").await);

        let writers = registry.clear().await;
        assert_eq!(writers.len(), 1);
        assert_eq!(registry.client_count().await, 0);
        assert!(registry.snapshot_names().await.is_empty());
    }
}
