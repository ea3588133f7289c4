//! Line codec: one JSON-RPC message per newline-free line.
//!
//! `encode` never yields a raw `\n` or `\r`; the caller appends the single
//! line terminator. `decode` tolerates blank keep-alive lines.

use std::borrow::Cow;

use crate::error::CodecError;
use crate::jsonrpc::{JsonRpcMessage, JSONRPC_VERSION};

/// Serializes a message into one line, without the terminator.
///
/// # Errors
///
/// Returns [`CodecError::Serialize`] if serde cannot encode the payload.
pub fn encode(message: &JsonRpcMessage) -> Result<String, CodecError> {
    let json =
        serde_json::to_string(message).map_err(|e| CodecError::Serialize(e.to_string()))?;
    Ok(escape_newlines(&json).into_owned())
}

/// Parses one line into a message.
///
/// Returns `Ok(None)` for an empty or whitespace-only line.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] carrying the raw line if it is not a
/// JSON-RPC 2.0 object.
pub fn decode(line: &str) -> Result<Option<JsonRpcMessage>, CodecError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let message: JsonRpcMessage = serde_json::from_str(trimmed)
        .map_err(|e| CodecError::malformed(trimmed, e.to_string()))?;

    if message.version() != JSONRPC_VERSION {
        return Err(CodecError::malformed(
            trimmed,
            format!("unsupported jsonrpc version '{}'", message.version()),
        ));
    }

    Ok(Some(message))
}

/// Parses one raw line as read off the wire.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if the bytes are not UTF-8, carrying a
/// lossy rendering of the line, or for any reason [`decode`] would.
pub fn decode_bytes(line: &[u8]) -> Result<Option<JsonRpcMessage>, CodecError> {
    match std::str::from_utf8(line) {
        Ok(text) => decode(text),
        Err(e) => Err(CodecError::malformed(
            String::from_utf8_lossy(line).trim(),
            format!("invalid UTF-8: {e}"),
        )),
    }
}

/// Replaces raw line breaks with their two-character escapes.
///
/// Compact serde output already escapes control characters inside strings,
/// so this is a no-op on the normal path and only guards framing.
pub fn escape_newlines(json: &str) -> Cow<'_, str> {
    if json.contains(['\n', '\r']) {
        Cow::Owned(json.replace('\n', "\\n").replace('\r', "\\r"))
    } else {
        Cow::Borrowed(json)
    }
}
