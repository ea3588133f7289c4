//! CLI command definitions.

pub mod connect;
pub mod serve;
