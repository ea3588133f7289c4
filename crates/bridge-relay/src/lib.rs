//! # bridge-relay
//!
//! Relay stub for processes that only speak JSON-RPC over stdio.
//!
//! The stub connects to a bridge listener and copies lines between its own
//! stdin/stdout and the socket until either side ends.

pub mod error;
pub mod link;

pub use error::RelayError;
pub use link::{connect, parse_endpoint, LinkSide, RelayLink, RelayOutcome};
