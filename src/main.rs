//! # bus-harvest CLI (`harvest`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `harvest serve` | Poll the bus in the background and serve the query API |
//! | `harvest poll` | Run a single discovery pass and print the records |
//! | `harvest mock-bus` | Serve the built-in demo bus |
//!
//! ## Examples
//!
//! ```bash
//! harvest serve --config ./config/harvest.toml
//! harvest poll --config ./config/harvest.toml | jq '.[].kind'
//! RUST_LOG=bus_harvest=debug harvest serve --bind 0.0.0.0:8000
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bus_harvest::config::{load_config, Config};
use bus_harvest::discovery::DiscoveryWalker;
use bus_harvest::fetch::HttpFetcher;
use bus_harvest::store::RecordStore;
use bus_harvest::{mock_bus, server};

/// bus-harvest — poll a service bus and serve its data under one schema.
///
/// Configuration is optional; without `--config` the built-in defaults
/// apply (bus at http://127.0.0.1:8001, 5s interval, 5s timeout).
#[derive(Parser)]
#[command(name = "harvest", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the bus forever and serve the accumulated records.
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one discovery pass and print the normalized records as JSON.
    ///
    /// Records gathered before a failure are still printed; the exit code
    /// is non-zero if the pass did not complete.
    Poll,

    /// Serve the built-in demo bus.
    MockBus {
        #[arg(long, default_value = "127.0.0.1:8001")]
        bind: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            info!("harvest v{} starting", env!("CARGO_PKG_VERSION"));
            server::run_server(&config).await
        }
        Commands::Poll => poll_once(&config).await,
        Commands::MockBus { bind } => {
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind {}", bind))?;
            mock_bus::serve(listener).await
        }
    }
}

async fn poll_once(config: &Config) -> Result<()> {
    let store = RecordStore::new();
    let fetcher = HttpFetcher::new(config.poll.timeout())?;
    let walker = DiscoveryWalker::new(config.bus.clone(), Arc::new(fetcher), store.clone());

    let result = walker.run_one_pass().await;

    println!("{}", serde_json::to_string_pretty(&store.list_all())?);

    match result {
        Ok(summary) => {
            info!(
                services = summary.services,
                endpoints = summary.endpoints,
                records = summary.records,
                "pass completed"
            );
            Ok(())
        }
        Err(e) => {
            warn!(stored = store.len(), "pass stopped early");
            Err(e).context("discovery pass failed")
        }
    }
}
