//! Server core functionality
//!
//! Owns the listening socket, the accept loop, and ordered shutdown.

pub mod core;

pub use self::core::{LifecycleState, Server};
