//! Main entry point for the tic-tac-toe server.

use native_ttt::{cli, config, server};

use anyhow::Context;
use clap::Parser;
use config::Config;
use server::AppState;
use std::path::PathBuf;

/// Parse CLI args, load the config and run the server.
///
/// Usage:
///   ttt-server [--config PATH] [--host HOST] [--port PORT] [--debug] [--persist]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::ServerCli::parse();

    // RUST_LOG wins; otherwise our crates at INFO and everything else at WARN.
    let log_filter = if cli.debug {
        "debug".to_string()
    } else {
        "native_ttt=info,ttt_shared=info,warn".to_string()
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(cli.debug)
        .with_thread_ids(cli.debug)
        .with_file(cli.debug)
        .with_line_number(cli.debug)
        .init();

    let config_path: PathBuf = cli.config.clone();

    let mut cfg = Config::load_or_create(&config_path)
        .with_context(|| format!("loading or creating config '{}'", config_path.display()))?;

    // Non-persistent unless --persist is given.
    let changed = cli.apply_overrides(&mut cfg);
    if changed && cli.persist {
        cfg.save(&config_path)
            .with_context(|| format!("saving updated config '{}'", config_path.display()))?;
    }

    let addr = cfg.socket_addr()?;
    tracing::info!(config = %config_path.display(), %addr, "starting server");

    let state = AppState::new(cfg);
    server::run_server(addr, state).await?;
    Ok(())
}
