//! Content and host identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Identifier for a piece of content whose hosting location is tracked.
///
/// A trimmed, non-empty UTF-8 string. Whitespace-only inputs are rejected
/// so that blank inventory lines can never become keys.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey(String);

impl ContentKey {
    /// Create a content key, trimming surrounding whitespace.
    ///
    /// Returns `None` when the trimmed input is empty.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.0)
    }
}

/// Error type for host address parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid host address {input:?}: expected <ip>:<port>")]
pub struct AddressParseError {
    /// The string that failed to parse.
    pub input: String,
}

/// The reachable network endpoint of a node claiming to hold content.
///
/// Also used for the directory's own identity. Displayed as
/// `"<ip>:<port>"`, which is exactly the self-location payload format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostAddress(SocketAddr);

impl HostAddress {
    /// Wrap a socket address.
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// The underlying socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        self.0
    }

    /// The IP portion.
    pub fn ip(&self) -> std::net::IpAddr {
        self.0.ip()
    }

    /// The port portion.
    pub fn port(&self) -> u16 {
        self.0.port()
    }
}

impl From<SocketAddr> for HostAddress {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostAddress({})", self.0)
    }
}

impl std::str::FromStr for HostAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<SocketAddr>()
            .map(Self)
            .map_err(|_| AddressParseError {
                input: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_trims_whitespace() {
        let key = ContentKey::new("  a.txt\r").unwrap();
        assert_eq!(key.as_str(), "a.txt");
    }

    #[test]
    fn content_key_rejects_blank() {
        assert!(ContentKey::new("").is_none());
        assert!(ContentKey::new("   \t").is_none());
    }

    #[test]
    fn host_address_display_is_ip_port() {
        let addr: HostAddress = "10.0.0.5:9000".parse().unwrap();
        assert_eq!(addr.to_string(), "10.0.0.5:9000");
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn host_address_parse_trims() {
        let addr: HostAddress = " 192.168.1.10:7000\n".parse().unwrap();
        assert_eq!(addr.to_string(), "192.168.1.10:7000");
    }

    #[test]
    fn host_address_rejects_garbage() {
        assert!("not-an-address".parse::<HostAddress>().is_err());
        assert!("10.0.0.5".parse::<HostAddress>().is_err());
        assert!("10.0.0.5:notaport".parse::<HostAddress>().is_err());
    }

    #[test]
    fn host_address_round_trips_v6() {
        let addr: HostAddress = "[::1]:7000".parse().unwrap();
        let reparsed: HostAddress = addr.to_string().parse().unwrap();
        assert_eq!(addr, reparsed);
    }
}
