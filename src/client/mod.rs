//! Client management system
//!
//! Handles connected clients, the shared registry, and per-connection
//! session lifecycle.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::handle_client;
pub use registry::{ClientRegistry, ServerStatus};
pub use state::{ClientHandle, SharedWriter};
