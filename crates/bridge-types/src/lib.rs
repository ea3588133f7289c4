//! # bridge-types
//!
//! Domain types shared by every rpc-bridge crate.
//! Pure data with no runtime dependencies besides serde.

pub mod endpoint;
pub mod error;

pub use endpoint::{parse_port, Endpoint, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{BridgeError, DiagnosticError, ErrorKind};
