//! Findora Rosetta middleware.
//!
//! # Architecture Overview
//!
//! ```text
//!   Rosetta client
//!        │ JSON over HTTP
//!        ▼
//!   ┌──────────┐    ┌──────────────┐    ┌──────────────┐
//!   │   http   │───▶│ construction │───▶│  blockchain  │───▶ Findora node
//!   │  server  │    │   services   │    │    client    │     (JSON-RPC)
//!   └──────────┘    └──────────────┘    └──────────────┘
//!                                               │
//!   ┌─────────────────────────────────┐         ▼
//!   │ config · lifecycle · observ.    │   node supervisor
//!   └─────────────────────────────────┘   (local process)
//! ```
//!
//! Offline mode serves every endpoint that needs no node and refuses the rest.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use findora_rosetta::config::load_config;
use findora_rosetta::lifecycle;
use findora_rosetta::observability::logging::init_logging;
use findora_rosetta::services::network::MIDDLEWARE_VERSION;

#[derive(Parser)]
#[command(name = "findora-rosetta")]
#[command(about = "Rosetta Construction API middleware for Findora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Rosetta API (default)
    Run {
        /// TOML configuration file; environment variables override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate configuration and exit
    CheckConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the middleware version
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { config: None }) {
        Commands::Run { config } => {
            let config = load_config(config.as_deref())?;
            init_logging(&config.observability.log_level, config.observability.log_format)?;
            tracing::info!(version = MIDDLEWARE_VERSION, "findora-rosetta starting");
            lifecycle::run(config).await?;
        }
        Commands::CheckConfig { config } => {
            let config = load_config(config.as_deref())?;
            println!(
                "configuration ok: mode={} network={} chain_id={} listen={}",
                config.mode,
                config.network.network,
                config.params.chain_id,
                config.bind_address()
            );
        }
        Commands::Version => println!("findora-rosetta {}", MIDDLEWARE_VERSION),
    }

    Ok(())
}
