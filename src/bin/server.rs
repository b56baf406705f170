//! Edit Store HTTP server

use std::path::PathBuf;

use clap::Parser;
use edit_store::{server, EditorConfig, LogBackend};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edit-server")]
#[command(about = "Serve the edit store HTTP API")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Data directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Snapshot log backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<LogBackend>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let mut config = EditorConfig::load_from(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.store.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    server::run(config).await
}
