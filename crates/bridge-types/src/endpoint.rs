//! `Endpoint` parsing and display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Loopback host used when none is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Well-known port the listener binds by default.
pub const DEFAULT_PORT: u16 = 3000;

/// A `host:port` pair identifying a listener.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or IP literal.
    pub host: String,
    /// TCP port (`0` asks the OS for an ephemeral port when binding).
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint from its parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Loopback endpoint on the given port.
    pub fn loopback(port: u16) -> Self {
        Self::new(DEFAULT_HOST, port)
    }

    /// Returns the `(host, port)` pair accepted by socket APIs.
    pub fn as_socket_pair(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| BridgeError::invalid_input(format!("expected host:port, got '{s}'")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(BridgeError::invalid_input(format!("missing host in '{s}'")));
        }
        Ok(Self::new(host, parse_port(port)?))
    }
}

/// Parses a TCP port from user-supplied text.
///
/// # Errors
///
/// Returns an `InvalidInput` error for non-numeric or out-of-range values.
pub fn parse_port(raw: &str) -> Result<u16, BridgeError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| BridgeError::invalid_input(format!("invalid port number: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_is_loopback_3000() {
        let ep = Endpoint::default();
        assert_eq!(ep.host, "127.0.0.1");
        assert_eq!(ep.port, 3000);
    }

    #[test]
    fn display_host_port() {
        assert_eq!(Endpoint::new("localhost", 8080).to_string(), "localhost:8080");
    }

    #[test]
    fn display_brackets_ipv6() {
        assert_eq!(Endpoint::new("::1", 9000).to_string(), "[::1]:9000");
    }

    #[test]
    fn parse_host_port() {
        let ep: Endpoint = "example.org:4000".parse().expect("parse");
        assert_eq!(ep, Endpoint::new("example.org", 4000));
    }

    #[test]
    fn parse_bracketed_ipv6() {
        let ep: Endpoint = "[::1]:4000".parse().expect("parse");
        assert_eq!(ep.host, "::1");
        assert_eq!(ep.port, 4000);
    }

    #[test]
    fn parse_missing_port_fails() {
        let err = "localhost".parse::<Endpoint>().expect_err("no port");
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn parse_missing_host_fails() {
        assert!(":3000".parse::<Endpoint>().is_err());
    }

    #[test]
    fn parse_port_rejects_garbage() {
        assert!(parse_port("abc").is_err());
        assert!(parse_port("70000").is_err());
        assert!(parse_port("-1").is_err());
    }

    #[test]
    fn parse_port_accepts_whitespace() {
        assert_eq!(parse_port(" 3001 ").expect("port"), 3001);
    }
}
