//! `rpc-bridge connect` command.
//!
//! Relays this process's stdin/stdout onto a bridge listener. Nothing but
//! relayed lines may reach stdout.

use clap::Args;

use bridge_config::BridgeConfig;
use bridge_relay::{connect, parse_endpoint, RelayLink};

use crate::output;

/// Relay stdio onto a bridge listener.
#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Listener host (defaults to the configured relay host).
    pub host: Option<String>,
    /// Listener port (defaults to the configured relay port).
    pub port: Option<String>,
}

/// Executes the connect command.
pub async fn execute(args: &ConnectArgs, config: &BridgeConfig) -> anyhow::Result<()> {
    let relay = &config.relay;
    let host = args.host.as_deref().unwrap_or(&relay.host);
    let port = args
        .port
        .clone()
        .unwrap_or_else(|| relay.port.to_string());

    let endpoint = parse_endpoint(host, &port).map_err(|e| anyhow::anyhow!("{e}"))?;
    let stream = connect(&endpoint, relay.connect_timeout())
        .await
        .map_err(|e| {
            output::print_remedy(&e);
            anyhow::anyhow!("{e}")
        })?;

    let outcome = RelayLink::new(stream)
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await;
    if let Some(error) = &outcome.error {
        tracing::warn!(ended_by = %outcome.ended_by, error = %error, "relay ended with error");
    }
    Ok(())
}
