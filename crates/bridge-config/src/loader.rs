//! Configuration loader (file + env merge).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use thiserror::Error;

use bridge_types::{BridgeError, DiagnosticError, ErrorKind};

use crate::schema::BridgeConfig;

/// Prefix for environment overrides, e.g. `RPC_BRIDGE_LISTENER__PORT=4000`.
pub const ENV_PREFIX: &str = "RPC_BRIDGE_";

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load or merge configuration.
    #[error("configuration error: {0}")]
    Load(String),
}

impl From<ConfigError> for BridgeError {
    fn from(e: ConfigError) -> Self {
        BridgeError::new(ErrorKind::InvalidInput, e.to_string())
    }
}

impl DiagnosticError for ConfigError {
    fn fix(&self) -> Option<String> {
        Some(format!(
            "Check the TOML file and any {ENV_PREFIX}* variables (nested keys use '__')."
        ))
    }
}

/// Loads configuration by merging layers:
/// 1. Default values
/// 2. Config file (if given)
/// 3. Environment variables (`RPC_BRIDGE_` prefix, `__` between sections)
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if a layer cannot be parsed or a value has
/// the wrong type.
pub fn load_config(config_path: Option<&str>) -> Result<BridgeConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(BridgeConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment
        .extract()
        .map_err(|e| ConfigError::Load(e.to_string()))
}
