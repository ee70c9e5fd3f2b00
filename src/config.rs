//! Configuration management for the relay chat server
//!
//! Loads settings from an optional `config.toml` with `CHAT_*` environment
//! variable overrides; every field has a coded default so the server runs
//! without any configuration file present.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Server configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the chat listener
    pub bind_address: String,

    /// TCP port for the chat listener (0 binds an ephemeral port)
    pub port: u16,

    /// Maximum length, in characters, of a claimed display name
    pub max_name_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            max_name_length: 50,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("max_name_length", defaults.max_name_length as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("CHAT"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Get bind address and port as a socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.max_name_length == 0 {
            return Err(ConfigError::Message(
                "max_name_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr(), "127.0.0.1:5000");
        assert_eq!(config.max_name_length, 50);
    }

    #[test]
    fn validate_rejects_empty_bind_address() {
        let config = ServerConfig {
            bind_address: String::new(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_name_length() {
        let config = ServerConfig {
            max_name_length: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
