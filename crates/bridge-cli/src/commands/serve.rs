//! `rpc-bridge serve` command.
//!
//! Starts a bridge listener whose sessions are served by the built-in
//! loopback session, and runs until Ctrl-C.

use clap::Args;

use bridge_config::BridgeConfig;
use bridge_transport_tcp::{CoordinatorOptions, SessionCoordinator};
use bridge_types::Endpoint;

use crate::loopback::LoopbackSession;
use crate::output;

/// Start a bridge listener.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Interface to bind (defaults to the configured listener host).
    #[arg(long)]
    pub host: Option<String>,
    /// TCP port to bind (defaults to the configured listener port).
    #[arg(long)]
    pub port: Option<u16>,
}

/// Executes the serve command.
pub async fn execute(args: &ServeArgs, config: &BridgeConfig) -> anyhow::Result<()> {
    let listener = &config.listener;
    let endpoint = Endpoint::new(
        args.host.clone().unwrap_or_else(|| listener.host.clone()),
        args.port.unwrap_or(listener.port),
    );
    let options = CoordinatorOptions {
        accept_join_timeout: listener.accept_join_timeout(),
        session_close_timeout: listener.session_close_timeout(),
        notify_timeout: listener.notify_timeout(),
    };

    let coordinator =
        SessionCoordinator::new(endpoint, LoopbackSession::factory()).with_options(options);
    let addr = coordinator.start().await.map_err(|e| {
        output::print_remedy(&e);
        anyhow::anyhow!("listener error: {e}")
    })?;
    output::print_success(&format!("bridge listening on {addr}"));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    coordinator.shutdown().await;

    let stats = coordinator.metrics().snapshot();
    tracing::info!(
        sessions = stats.sessions_opened,
        responses = stats.responses_sent,
        suppressed = stats.suppressed_failures,
        "bridge stopped"
    );
    Ok(())
}
