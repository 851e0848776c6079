//! Database management commands

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use crate::config::Settings;
use crate::storage::{ListingRepository, SchemaOperations};

/// Database subcommands
#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate(MigrateArgs),
    /// Verify the schema the writer depends on
    Verify,
    /// Show database statistics
    Stats(StatsArgs),
    /// Show recently recorded listings
    Recent(RecentArgs),
}

/// Arguments for migrate command
#[derive(Args)]
pub struct MigrateArgs {
    /// Verify the schema after running migrations
    #[arg(long)]
    pub verify: bool,
}

/// Arguments for stats command
#[derive(Args)]
pub struct StatsArgs {
    /// Show per-source statistics
    #[arg(long, short)]
    pub verbose: bool,
}

/// Arguments for recent command
#[derive(Args)]
pub struct RecentArgs {
    /// Number of listings to show
    #[arg(long, default_value = "20")]
    pub limit: i64,

    /// Only show listings from this source
    #[arg(long)]
    pub source: Option<String>,
}

/// Execute database commands
pub async fn execute(cmd: DbCommands) -> Result<()> {
    match cmd {
        DbCommands::Migrate(args) => execute_migrate(args).await,
        DbCommands::Verify => execute_verify().await,
        DbCommands::Stats(args) => execute_stats(args).await,
        DbCommands::Recent(args) => execute_recent(args).await,
    }
}

async fn execute_migrate(args: MigrateArgs) -> Result<()> {
    let settings = Settings::load().unwrap_or_else(|_| Settings::default_settings());
    let repository = ListingRepository::from_settings(&settings.database).await?;
    let schema = SchemaOperations::new(repository.pool().clone());

    info!("Running migrations...");
    schema.run_migrations().await?;

    if args.verify {
        schema.verify_schema().await?;
        info!("Schema verified");
    }

    info!("Migrations completed");
    Ok(())
}

async fn execute_verify() -> Result<()> {
    let settings = Settings::load().unwrap_or_else(|_| Settings::default_settings());
    let repository = ListingRepository::from_settings(&settings.database).await?;
    let schema = SchemaOperations::new(repository.pool().clone());

    schema.verify_schema().await?;

    info!("Schema verified: table and unique constraint in place");
    Ok(())
}

async fn execute_stats(args: StatsArgs) -> Result<()> {
    let settings = Settings::load().unwrap_or_else(|_| Settings::default_settings());
    let repository = ListingRepository::from_settings(&settings.database).await?;

    info!("Fetching database statistics...");

    let stats = repository.get_stats().await?;

    info!("Listing Statistics:");
    info!("  Total listings: {}", stats.total_listings);
    info!("  Distinct coins: {}", stats.distinct_coins);
    info!("  Distinct sources: {}", stats.distinct_sources);
    if let Some(earliest) = stats.earliest_reported {
        info!("  Earliest reported: {}", earliest);
    }
    if let Some(latest) = stats.latest_reported {
        info!("  Latest reported: {}", latest);
    }

    if args.verbose {
        info!("\nPer-source statistics:");
        let sources = repository.get_source_counts().await?;
        for (source, count) in sources {
            info!("  {}: {} listings", source, count);
        }
    }

    Ok(())
}

async fn execute_recent(args: RecentArgs) -> Result<()> {
    let settings = Settings::load().unwrap_or_else(|_| Settings::default_settings());
    let repository = ListingRepository::from_settings(&settings.database).await?;

    let listings = match args.source {
        Some(ref source) => repository.list_by_source(source, args.limit).await?,
        None => repository.list_recent(args.limit).await?,
    };

    if listings.is_empty() {
        println!("No listings recorded.");
        return Ok(());
    }

    println!("\nRecent listings:");
    for listing in &listings {
        println!(
            "  [{}] {} trading starts {} (via {}, reported {})",
            listing.id,
            listing.full_symbol(),
            listing.trading_start,
            listing.source,
            listing.reported_at
        );
    }

    Ok(())
}
