//! Edit Store CLI
//!
//! Read, write and inspect version-controlled documents from the shell.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use edit_store::{EditorConfig, FileStore, LogBackend};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edit-store")]
#[command(about = "Version-controlled JSON/YAML/XML documents")]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a file, creating it with starter content if missing
    Read { filename: String },

    /// Save new content (from --input or stdin)
    Write {
        filename: String,
        /// Read content from this path instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show recent history entries, newest first
    History {
        filename: String,
        /// Maximum number of entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Bring back an earlier version as a new entry
    Restore { filename: String, id: String },

    /// List managed files
    List,

    /// Write the effective configuration to a TOML file
    InitConfig { path: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = EditorConfig::load_from(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.store.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }

    let open = || FileStore::open(&config.store);

    match cli.command {
        Commands::Read { filename } => {
            let outcome = open()?.read(&filename)?;
            if outcome.created {
                eprintln!("Created {}", filename);
            }
            print!("{}", outcome.content);
        }

        Commands::Write { filename, input } => {
            let content = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let entry = open()?.write(&filename, &content)?;
            println!("{} {}", entry.id, entry.message);
        }

        Commands::History { filename, limit } => {
            let store = open()?;
            let limit = limit.unwrap_or(store.options().history_limit);
            let history = store.history(&filename, limit);
            if history.is_empty() {
                println!("No history for {}", filename);
            }
            for entry in history {
                println!("{}  {}  {}", entry.id, entry.timestamp, entry.message);
            }
        }

        Commands::Restore { filename, id } => {
            let restored = open()?.restore(&filename, &id)?;
            println!("{} {}", restored.entry.id, restored.entry.message);
        }

        Commands::List => {
            for name in open()?.list()? {
                println!("{}", name);
            }
        }

        Commands::InitConfig { path } => {
            config.save(&path)?;
            println!("Wrote {}", path);
        }
    }

    Ok(())
}
