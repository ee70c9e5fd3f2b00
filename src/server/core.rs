//! Server lifecycle controller
//!
//! Binds the chat listener, accepts connections, and spawns one session task
//! per client. Shutdown is ordered: stop accepting, close every client
//! connection, clear the registry, release the listening socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use log::{error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::{Mutex, watch};

use crate::client::handle_client;
use crate::client::registry::{ClientRegistry, ServerStatus};
use crate::client::state::{ClientHandle, SharedWriter};
use crate::config::ServerConfig;
use crate::error::ChatServerError;

const LISTEN_BACKLOG: u32 = 64;

/// Server lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Listening,
    Stopping,
}

pub struct Server {
    registry: Arc<ClientRegistry>,
    // Taken by the accept loop and dropped when it exits, so stopping
    // releases the socket even while the Server value is still alive.
    listener: StdMutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    state: StdMutex<LifecycleState>,
    // Latched by the first stop() so a stop racing ahead of start() still
    // wins: start() checks it before entering the accept loop.
    stop_requested: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    /// Binds the listening socket with address reuse enabled, so rapid
    /// restarts don't fail on a lingering socket.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ChatServerError> {
        let addr: SocketAddr = config.socket_addr().parse()?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(LISTEN_BACKLOG)?;
        let local_addr = listener.local_addr()?;
        info!("Server bound to {}", local_addr);

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            registry: Arc::new(ClientRegistry::new(config.max_name_length)),
            listener: StdMutex::new(Some(listener)),
            local_addr,
            state: StdMutex::new(LifecycleState::Stopped),
            stop_requested: AtomicBool::new(false),
            shutdown_tx,
        })
    }

    /// Runs the accept loop until `stop()` is called.
    ///
    /// Each accepted connection is registered and handed to its own session
    /// task so the loop returns to accepting immediately. Accept errors while
    /// listening are transient and logged; once stopping they are expected
    /// and end the loop silently.
    pub async fn start(&self) {
        let listener = match self.listener.lock().unwrap().take() {
            Some(listener) => listener,
            None => {
                warn!("Server already started or stopped; ignoring start()");
                return;
            }
        };

        // Subscribe before entering LISTENING so a stop() racing with
        // startup cannot signal a channel nobody is watching yet.
        let mut shutdown = self.shutdown_tx.subscribe();

        if self.stop_requested.load(Ordering::SeqCst) {
            info!("Stop requested before accept loop started");
            drop(listener);
            return;
        }

        self.set_state(LifecycleState::Listening);
        info!("Chat server listening on {}", self.local_addr);

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, addr)) => {
                        info!("Connection from {}", addr);

                        let (reader, write_half) = stream.into_split();
                        let writer: SharedWriter = Arc::new(Mutex::new(write_half));
                        self.registry
                            .register(ClientHandle::new(addr, Arc::clone(&writer)))
                            .await;

                        let registry = Arc::clone(&self.registry);
                        let shutdown_rx = self.shutdown_tx.subscribe();
                        tokio::spawn(handle_client(reader, writer, addr, registry, shutdown_rx));
                    }
                    Err(e) => {
                        if self.state() == LifecycleState::Stopping {
                            break;
                        }
                        error!("Error accepting connection: {}", e);
                    }
                },
                _ = shutdown.changed() => break,
            }
        }

        // Release the listening socket.
        drop(listener);
        self.set_state(LifecycleState::Stopped);
        info!("Chat server stopped");
    }

    /// Ordered shutdown: stop accepting, close every client connection
    /// (forcing their read loops to end), clear the registry.
    ///
    /// Idempotent: only the first call does work. A stop() that lands before
    /// start() enters its accept loop is latched, not lost — start() then
    /// returns without accepting anything.
    pub async fn stop(&self) {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let mut state = self.state.lock().unwrap();
            if *state == LifecycleState::Listening {
                *state = LifecycleState::Stopping;
            }
        }

        info!("Stopping chat server...");
        let _ = self.shutdown_tx.send(true);

        for writer in self.registry.clear().await {
            let _ = writer.lock().await.shutdown().await;
        }
    }

    /// Address the listener is actually bound to (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap()
    }

    /// Read-only snapshot for external collaborators (HTTP status layer).
    pub async fn status(&self) -> ServerStatus {
        self.registry.status().await
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock().unwrap() = state;
    }
}
