//! Error types
//!
//! Domain-specific error types for the chat server.

use std::fmt;
use std::io;
use std::net::AddrParseError;

/// General chat server error that encompasses all error types
#[derive(Debug)]
pub enum ChatServerError {
    Config(config::ConfigError),
    InvalidBindAddress(AddrParseError),
    IoError(io::Error),
}

impl fmt::Display for ChatServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatServerError::InvalidBindAddress(e) => write!(f, "Invalid bind address: {}", e),
            ChatServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ChatServerError {}

impl From<config::ConfigError> for ChatServerError {
    fn from(error: config::ConfigError) -> Self {
        ChatServerError::Config(error)
    }
}

impl From<AddrParseError> for ChatServerError {
    fn from(error: AddrParseError) -> Self {
        ChatServerError::InvalidBindAddress(error)
    }
}

impl From<io::Error> for ChatServerError {
    fn from(error: io::Error) -> Self {
        ChatServerError::IoError(error)
    }
}
