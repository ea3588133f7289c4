//! Error types for the TCP transport layer.

use bridge_protocol::CodecError;
use bridge_types::{BridgeError, DiagnosticError, ErrorKind};
use thiserror::Error;

/// Errors that can occur in the TCP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind the listening address.
    #[error("failed to bind on {addr}: {source}")]
    Bind {
        /// The address string.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to read from the socket.
    #[error("read error: {0}")]
    Read(String),
    /// Failed to write to the socket.
    #[error("write error: {0}")]
    Write(String),
    /// A line could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The transport was closed before the operation.
    #[error("transport is closed")]
    Closed,
    /// The coordinator was not in the state the operation requires.
    #[error("invalid coordinator state: {0}")]
    InvalidState(String),
}

/// Error reported by a collaborator [`Session`](crate::Session).
#[derive(Debug, Error)]
#[error("session error: {0}")]
pub struct SessionError(pub String);

impl SessionError {
    /// Creates a session error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self(e.to_string())
    }
}

impl From<TransportError> for BridgeError {
    fn from(e: TransportError) -> Self {
        let kind = match &e {
            TransportError::Bind { .. } => ErrorKind::BindFailure,
            TransportError::Codec(_) => ErrorKind::InvalidInput,
            TransportError::Closed => ErrorKind::Closed,
            TransportError::Read(_)
            | TransportError::Write(_)
            | TransportError::InvalidState(_) => ErrorKind::Internal,
        };
        let err = BridgeError::new(kind, e.to_string());
        match e {
            TransportError::Bind { addr, .. } => err.at(addr),
            _ => err,
        }
    }
}

impl DiagnosticError for TransportError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Bind { source, .. } if source.kind() == std::io::ErrorKind::AddrInUse => {
                Some("Another process is already listening on this address.".into())
            }
            Self::Bind { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                Some("Binding this port requires elevated permissions.".into())
            }
            Self::Codec(e) => e.hint(),
            _ => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Bind { .. } => Some("Pick another port: rpc-bridge serve --port <port>".into()),
            Self::Codec(e) => e.fix(),
            _ => None,
        }
    }
}
