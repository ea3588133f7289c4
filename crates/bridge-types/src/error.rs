//! Error vocabulary shared by every bridge crate.
//!
//! Each layer keeps its own `thiserror` enum and folds it into a
//! [`BridgeError`] when it crosses a crate boundary or reaches the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong, independent of which layer noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A port, address, config value or wire line was rejected.
    InvalidInput,
    /// The listener could not bind its address.
    BindFailure,
    /// The bridge listener could not be dialed.
    Unreachable,
    /// The connection was already shut.
    Closed,
    /// A bounded wait ran out.
    Timeout,
    /// A bug or an unexpected runtime failure.
    Internal,
}

impl ErrorKind {
    /// Stable snake_case label, as used in logs and serialized errors.
    pub fn label(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::BindFailure => "bind_failure",
            Self::Unreachable => "unreachable",
            Self::Closed => "closed",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }

    /// Whether trying the same operation again later can succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Unreachable | Self::Timeout | Self::BindFailure)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error as reported across crate boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeError {
    /// Classification.
    pub kind: ErrorKind,
    /// What failed.
    pub message: String,
    /// Listener address or remote peer involved, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
}

impl BridgeError {
    /// Creates an error with no peer attached.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            peer: None,
        }
    }

    /// Attaches the address the error concerns.
    pub fn at(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    /// Rejected input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Use of a connection that was already shut.
    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Closed, message)
    }

    /// Failed dial of `endpoint`.
    pub fn unreachable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unreachable, message).at(endpoint)
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.peer {
            Some(peer) => write!(f, "{} ({}): {}", self.kind, peer, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Cause and remedy lines printed under an `[ERROR]` message.
pub trait DiagnosticError {
    /// Likely cause, in the user's terms.
    fn hint(&self) -> Option<String> {
        None
    }
    /// Something to run or change, e.g. another port.
    fn fix(&self) -> Option<String> {
        None
    }
}
