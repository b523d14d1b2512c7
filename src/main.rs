//! JJK Arena - Entry Point
//!
//! Binds the battle server, waits for players, runs one battle and exits.

use clap::Parser;
use jjk_arena::core::config::ServerConfig;
use jjk_arena::core::error::Result;
use jjk_arena::server::GameServer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// JJK Arena battle server
#[derive(Parser, Debug)]
#[command(name = "jjk-arena")]
#[command(about = "Host a turn-based JJK battle over TCP")]
struct Args {
    /// TOML config file (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interface to listen on
    #[arg(long)]
    host: Option<String>,

    /// TCP port
    #[arg(long)]
    port: Option<u16>,

    /// Seats at the table; the join window closes when all are taken
    #[arg(long)]
    max_players: Option<usize>,

    /// Random seed for deterministic special moves
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load_from_toml(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_players) = self.max_players {
            config.max_players = max_players;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jjk_arena=info")),
        )
        .init();

    let config = Args::parse().into_config()?;
    config.validate()?;

    let server = GameServer::bind(config).await?;
    tracing::info!("Waiting for players on {}", server.local_addr());

    let outcome = server.run().await?;
    tracing::info!("Session finished: {:?}", outcome);

    Ok(())
}
