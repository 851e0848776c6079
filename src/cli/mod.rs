//! Command-line interface
//!
//! Provides CLI commands for the listing manager.

pub mod db;
pub mod ingest;

use clap::{Parser, Subcommand};

/// Listing Manager CLI
#[derive(Parser)]
#[command(name = "listing-manager")]
#[command(about = "Deduplicating ingestion for new coin listing announcements")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Ingest listing events from a file
    Ingest(ingest::IngestArgs),
    /// Database operations
    #[command(subcommand)]
    Db(db::DbCommands),
}
