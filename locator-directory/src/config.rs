//! Configuration loading for locatord.
//!
//! Configuration is loaded from a TOML file (default: `locator.toml`);
//! command-line flags override individual fields.

use locator_types::HostAddress;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Root configuration for locatord.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Directory behaviour.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Registration ingest listener.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Named-data transport connection.
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Directory behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Freshness seconds attached to every response (default: 1).
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u32,
    /// Bounded wait for one transport poll iteration, in ms (default: 500).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Registration ingest configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Interface whose address is announced as the upload endpoint
    /// (default: whichever interface holds the default local IP).
    #[serde(default)]
    pub interface: Option<String>,
    /// TCP port the registration listener binds (default: 7700).
    #[serde(default = "default_ingest_port")]
    pub port: u16,
    /// Deadline for draining one upload, in seconds (default: 30).
    /// A peer that stalls past this is dropped without touching the store.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

/// Named-data transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Forwarder daemon address (default: 127.0.0.1:6363).
    #[serde(default = "default_forwarder")]
    pub forwarder: String,
}

// Default value functions
fn default_freshness_secs() -> u32 {
    1
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_ingest_port() -> u16 {
    7700
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_forwarder() -> String {
    "127.0.0.1:6363".to_string()
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            freshness_secs: default_freshness_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interface: None,
            port: default_ingest_port(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            forwarder: default_forwarder(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolve the directory's own reachable endpoint.
    ///
    /// Walks the operator-chosen interface for its address (falling back
    /// to the default local IP when no interface is named) and pairs it
    /// with the ingest port. Established once at startup and immutable
    /// for the process lifetime.
    pub fn resolve_identity(&self) -> Result<HostAddress, ConfigError> {
        let ip = match &self.ingest.interface {
            Some(interface) => interface_ip(interface)?,
            None => local_ip_address::local_ip().map_err(|e| ConfigError::Discovery {
                reason: e.to_string(),
            })?,
        };
        Ok(HostAddress::new(SocketAddr::new(ip, self.ingest.port)))
    }
}

/// Find the address of a named interface, preferring IPv4.
fn interface_ip(interface: &str) -> Result<IpAddr, ConfigError> {
    let netifas = local_ip_address::list_afinet_netifas().map_err(|e| ConfigError::Discovery {
        reason: e.to_string(),
    })?;

    let mut candidates = netifas
        .into_iter()
        .filter(|(name, _)| name == interface)
        .map(|(_, ip)| ip)
        .peekable();

    if candidates.peek().is_none() {
        return Err(ConfigError::InterfaceNotFound {
            interface: interface.to_string(),
        });
    }

    let mut fallback = None;
    for ip in candidates {
        if ip.is_ipv4() {
            return Ok(ip);
        }
        fallback.get_or_insert(ip);
    }
    Ok(fallback.expect("at least one candidate"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// The named listen interface does not exist.
    #[error("listen interface not found: {interface}")]
    InterfaceNotFound {
        /// The interface name that was requested.
        interface: String,
    },
    /// Interface enumeration failed.
    #[error("interface discovery failed: {reason}")]
    Discovery {
        /// Underlying failure description.
        reason: String,
    },
}
