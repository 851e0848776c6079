//! Listing Manager CLI
//!
//! Provides commands for:
//! - `ingest`: Ingest listing events from a JSON-lines file
//! - `db`: Database operations (migrate, verify, stats, recent)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use listing_manager::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("listing_manager=info".parse()?))
        .init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Ingest(args) => {
            listing_manager::cli::ingest::execute(args).await?;
        }
        Commands::Db(cmd) => {
            listing_manager::cli::db::execute(cmd).await?;
        }
    }

    Ok(())
}
