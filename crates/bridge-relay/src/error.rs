//! Relay error types.

use bridge_types::{BridgeError, DiagnosticError, ErrorKind};
use thiserror::Error;

/// Errors from the relay stub.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The port argument is not a valid TCP port.
    #[error("invalid port number: {0}")]
    InvalidPort(String),
    /// The bridge listener could not be reached.
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect {
        /// The `host:port` that was dialed.
        endpoint: String,
        /// Why the attempt failed.
        reason: String,
    },
}

impl From<RelayError> for BridgeError {
    fn from(e: RelayError) -> Self {
        match &e {
            RelayError::InvalidPort(_) => BridgeError::new(ErrorKind::InvalidInput, e.to_string()),
            RelayError::Connect { endpoint, .. } => {
                BridgeError::unreachable(endpoint.clone(), e.to_string())
            }
        }
    }
}

impl DiagnosticError for RelayError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::InvalidPort(_) => Some("Ports are integers between 0 and 65535.".into()),
            Self::Connect { .. } => Some("Is the bridge listener running?".into()),
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Connect { .. } => Some("Start it with: rpc-bridge serve".into()),
            Self::InvalidPort(_) => None,
        }
    }
}
