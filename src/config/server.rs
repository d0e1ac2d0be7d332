//! Server configuration

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use crate::ports::InstanceId;

use super::error::ValidationError;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment name
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Identity of this process in the fleet; defaults to `HOSTNAME:port`
    pub instance_id: Option<String>,

    /// Time allowed for in-flight notifications on shutdown, in seconds
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

/// Application environment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidBindAddress(addr))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Resolve the instance id: the configured one, else `HOSTNAME:port`.
    pub fn instance_id(&self) -> InstanceId {
        match self.instance_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => InstanceId::new(id),
            _ => {
                let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
                InstanceId::new(format!("{}:{}", hostname, self.port))
            }
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.socket_addr()?;
        if matches!(self.instance_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(ValidationError::BlankInstanceId);
        }
        if self.shutdown_grace_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            instance_id: None,
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_log_level() -> String {
    "info,messenger_fanout=debug,tower_http=info".to_string()
}

fn default_shutdown_grace() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.instance_id.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_invalid_host_fails_validation() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidBindAddress(_))));
    }

    #[test]
    fn test_configured_instance_id_wins() {
        let config = ServerConfig {
            instance_id: Some("notify-7".to_string()),
            ..Default::default()
        };
        assert_eq!(config.instance_id(), InstanceId::new("notify-7"));
    }

    #[test]
    fn test_derived_instance_id_uses_port() {
        let config = ServerConfig {
            port: 9100,
            ..Default::default()
        };
        assert!(config.instance_id().as_str().ends_with(":9100"));
    }

    #[test]
    fn test_blank_instance_id_is_rejected() {
        let config = ServerConfig {
            instance_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::BlankInstanceId));
    }

    #[test]
    fn test_validation_invalid_port() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn test_is_production() {
        let mut config = ServerConfig::default();
        assert!(!config.is_production());

        config.environment = Environment::Production;
        assert!(config.is_production());
    }
}
