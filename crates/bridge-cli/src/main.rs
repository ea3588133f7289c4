//! rpc-bridge CLI - newline-delimited JSON-RPC over TCP.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod loopback;
mod output;

/// Bridge JSON-RPC sessions between stdio processes and a TCP listener.
#[derive(Debug, Parser)]
#[command(name = "rpc-bridge", version, about)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format: plain (default) or json (for log aggregation).
    #[arg(long, global = true, default_value = "plain", value_parser = ["plain", "json"])]
    log_format: String,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a bridge listener with the built-in loopback session.
    Serve(commands::serve::ServeArgs),
    /// Relay this process's stdio onto a bridge listener.
    Connect(commands::connect::ConnectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match bridge_config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output::print_diagnostic(&e);
            return ExitCode::FAILURE;
        }
    };

    let settings = logging::LogSettings::resolve(
        cli.verbose,
        &cli.log_format,
        cli.log_file.as_deref(),
        &config.logging,
    );
    if let Err(e) = logging::init(&settings) {
        output::print_error(&format!("{e:#}"));
        return ExitCode::FAILURE;
    }

    tracing::debug!("rpc-bridge starting with config: {:?}", cli.config);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            output::print_error(&format!("failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Serve(args) => commands::serve::execute(args, &config).await,
            Commands::Connect(args) => commands::connect::execute(args, &config).await,
        }
    });

    // The relay may leave a blocking stdin read parked on a worker thread.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
