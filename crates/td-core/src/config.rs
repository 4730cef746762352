//! Configuration types and loading
//!
//! Environment-driven configuration with local-development defaults.

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Blob store configuration
    pub blob_store: BlobStoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in bytes (bounds uploads).
    pub max_body_size_bytes: usize,
}

/// Which blob store backend the server runs against.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlobBackend {
    /// In-process map, lost on restart. Suitable for development and tests.
    #[default]
    Memory,
    /// Local directory served under `public_base_url`.
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlobStoreConfig {
    pub backend: BlobBackend,
    /// Root directory for the `local` backend.
    pub local_root: String,
    /// Base URL prepended to blob keys to form locators.
    pub public_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_body_size_bytes: 50 * 1024 * 1024, // 50MB
            },
            blob_store: BlobStoreConfig {
                backend: BlobBackend::Memory,
                local_root: "/var/taskdesk/blobs".to_string(),
                public_base_url: "/blobs".to_string(),
            },
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("not a port number: {port}"),
            })?;
        }
        if let Ok(max) = std::env::var("TASKDESK_MAX_BODY_SIZE") {
            config.server.max_body_size_bytes =
                max.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "TASKDESK_MAX_BODY_SIZE".into(),
                    message: format!("not a byte count: {max}"),
                })?;
        }

        if let Ok(backend) = std::env::var("TASKDESK_BLOB_BACKEND") {
            config.blob_store.backend = match backend.as_str() {
                "memory" => BlobBackend::Memory,
                "local" => BlobBackend::Local,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "TASKDESK_BLOB_BACKEND".into(),
                        message: format!("unknown backend: {other}"),
                    })
                }
            };
        }
        if let Ok(root) = std::env::var("TASKDESK_BLOB_ROOT") {
            config.blob_store.local_root = root;
        }
        if let Ok(base) = std::env::var("TASKDESK_BLOB_BASE_URL") {
            config.blob_store.public_base_url = base;
        }

        Ok(config)
    }

    /// Get the server bind address.
    pub fn server_addr(&self) -> std::net::SocketAddr {
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        std::net::SocketAddr::new(ip, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.blob_store.backend, BlobBackend::Memory);
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig::default();
        assert_eq!(config.server_addr().port(), 8000);
    }
}
