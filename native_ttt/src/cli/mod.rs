use clap::Parser;
use std::path::PathBuf;

/// Server CLI for ttt-server
#[derive(Parser, Debug, Clone)]
#[command(name = "ttt-server", version, about = "Two-player tic-tac-toe server")]
pub struct ServerCli {
    /// Path to config file
    #[arg(long, default_value = "ttt-server.toml")]
    pub config: PathBuf,

    /// Address to listen on (overrides config.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Verbose logging with targets, threads and source locations
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Persist CLI overrides back to the config file
    #[arg(long, default_value_t = false)]
    pub persist: bool,
}

impl ServerCli {
    /// Apply command-line overrides to a loaded config. Returns true if anything changed.
    pub fn apply_overrides(&self, cfg: &mut crate::config::Config) -> bool {
        let mut changed = false;
        if let Some(host) = &self.host {
            changed |= cfg.host != *host;
            cfg.host = host.clone();
        }
        if let Some(port) = self.port {
            changed |= cfg.port != port;
            cfg.port = port;
        }
        changed
    }
}
