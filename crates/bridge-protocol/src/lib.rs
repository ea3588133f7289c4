//! # bridge-protocol
//!
//! JSON-RPC 2.0 type definitions and the newline-delimited wire codec.
//! One message travels as exactly one line of UTF-8 text.

pub mod codec;
pub mod error;
pub mod jsonrpc;

pub use codec::{decode, decode_bytes, encode};
pub use error::CodecError;
pub use jsonrpc::*;
