//! Relay Chat Server - Entry Point
//!
//! A multi-client TCP text broadcast server: every message is echoed to its
//! sender, rebroadcast to everyone else, and followed by a roster push.

use std::sync::Arc;

use env_logger;
use log::{error, info};

mod broadcast;
mod client;
mod config;
mod error;
mod server;

use crate::config::ServerConfig;
use server::Server;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching chat server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(&config).await {
        Ok(server) => Arc::new(server),
        Err(e) => {
            error!("Failed to bind {}: {}", config.socket_addr(), e);
            std::process::exit(1);
        }
    };

    let accept_loop = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.start().await })
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    server.stop().await;
    let _ = accept_loop.await;
}
