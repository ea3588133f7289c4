//! bridge-stub: pipes stdin/stdout onto an rpc-bridge listener.
//!
//! Stdout carries the protocol, so every diagnostic goes to stderr.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bridge_relay::{connect, parse_endpoint, RelayLink};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Relay JSON-RPC lines between this process's stdio and a bridge listener.
#[derive(Debug, Parser)]
#[command(name = "bridge-stub", version, about)]
struct Cli {
    /// Host of the bridge listener.
    host: String,
    /// Port of the bridge listener.
    port: String,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let endpoint = match parse_endpoint(&cli.host, &cli.port) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[ERROR] failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(async {
        let stream = match connect(&endpoint, CONNECT_TIMEOUT).await {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("[ERROR] {e}");
                return ExitCode::FAILURE;
            }
        };
        let outcome = RelayLink::new(stream)
            .run(tokio::io::stdin(), tokio::io::stdout())
            .await;
        if let Some(error) = &outcome.error {
            tracing::warn!(ended_by = %outcome.ended_by, error = %error, "relay ended with error");
        }
        ExitCode::SUCCESS
    });

    // A blocking stdin read may still be parked on its worker thread.
    runtime.shutdown_background();
    code
}
