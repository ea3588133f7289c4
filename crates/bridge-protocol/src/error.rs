//! Codec error types.

use bridge_types::{BridgeError, DiagnosticError, ErrorKind};
use thiserror::Error;

/// Errors from encoding or decoding one line.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The line is not a valid JSON-RPC 2.0 message.
    #[error("malformed message: {reason} (line: {line})")]
    Malformed {
        /// The raw line as received, kept for diagnostics.
        line: String,
        /// Why decoding failed.
        reason: String,
    },
    /// The message could not be serialized.
    #[error("failed to serialize message: {0}")]
    Serialize(String),
}

impl CodecError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        let kind = match &e {
            CodecError::Malformed { .. } => ErrorKind::InvalidInput,
            CodecError::Serialize(_) => ErrorKind::Internal,
        };
        BridgeError::new(kind, e.to_string())
    }
}

impl DiagnosticError for CodecError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Malformed { .. } => Some(
                "The peer sent a line that is not a single JSON-RPC 2.0 object.".into(),
            ),
            Self::Serialize(_) => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Malformed { .. } => Some(
                "Make sure the client writes exactly one compact JSON object per line.".into(),
            ),
            Self::Serialize(_) => None,
        }
    }
}
