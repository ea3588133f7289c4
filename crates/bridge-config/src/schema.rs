//! Configuration schema types.

use std::path::PathBuf;
use std::time::Duration;

use bridge_types::{Endpoint, DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// TCP listener settings.
    #[serde(default)]
    pub listener: ListenerConfig,
    /// Relay stub settings.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener (session coordinator) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long shutdown waits for the accept loop, in milliseconds.
    #[serde(default = "default_accept_join_timeout_ms")]
    pub accept_join_timeout_ms: u64,
    /// How long shutdown waits for each session reader, in milliseconds.
    #[serde(default = "default_session_close_timeout_ms")]
    pub session_close_timeout_ms: u64,
    /// Per-recipient budget for a broadcast notification, in milliseconds.
    #[serde(default = "default_notify_timeout_ms")]
    pub notify_timeout_ms: u64,
}

impl ListenerConfig {
    /// Returns the configured endpoint.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Accept-loop join timeout as a `Duration`.
    pub fn accept_join_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_join_timeout_ms)
    }

    /// Session close timeout as a `Duration`.
    pub fn session_close_timeout(&self) -> Duration {
        Duration::from_millis(self.session_close_timeout_ms)
    }

    /// Broadcast timeout as a `Duration`.
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            accept_join_timeout_ms: default_accept_join_timeout_ms(),
            session_close_timeout_ms: default_session_close_timeout_ms(),
            notify_timeout_ms: default_notify_timeout_ms(),
        }
    }
}

/// Relay stub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Listener host to connect to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listener port to connect to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connection attempt budget, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl RelayConfig {
    /// Returns the target endpoint.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Connect timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_accept_join_timeout_ms() -> u64 {
    5_000
}
fn default_session_close_timeout_ms() -> u64 {
    2_000
}
fn default_notify_timeout_ms() -> u64 {
    5_000
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "bridge_transport_tcp=trace").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional file to append logs to instead of stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
