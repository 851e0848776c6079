//! Ingest command - feed listing events from a JSON-lines file
//!
//! Each line of the input is one JSON object with `coin`, `market`,
//! `trading_start`, `source`, and an optional `url`. Malformed lines are
//! counted and skipped; the run continues.

use anyhow::Result;
use clap::Args;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::retry_with_backoff;
use crate::ingest::{IngestPipeline, IngestReport};
use crate::normalizer::{ListingNormalizer, NormalizerConfig};
use crate::schema::RawListingEvent;
use crate::storage::ListingRepository;

/// Arguments for the ingest command
#[derive(Args)]
pub struct IngestArgs {
    /// Input file path (JSON lines)
    #[arg(long, short)]
    pub input: PathBuf,

    /// Dry run (validate and normalize but don't insert)
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the ingest command
pub async fn execute(args: IngestArgs) -> Result<()> {
    info!("Ingest request:");
    info!("  Input: {:?}", args.input);
    if args.dry_run {
        info!("  Mode: dry run");
    }

    if !args.input.exists() {
        error!("Input file not found: {:?}", args.input);
        return Ok(());
    }

    let settings = Settings::load().unwrap_or_else(|_| Settings::default_settings());
    let normalizer = ListingNormalizer::with_config(NormalizerConfig::from(&settings.validation));

    let events = read_events(&args.input, settings.ingest.max_line_warnings)?;
    info!("Parsed {} events from input", events.len());

    if args.dry_run {
        let report = dry_run_report(&normalizer, &events);
        log_report(&report);
        return Ok(());
    }

    info!("Connecting to database...");
    let repository = ListingRepository::from_settings(&settings.database).await?;
    let pipeline = IngestPipeline::new(normalizer, repository);

    let max_attempts = settings.ingest.max_retry_attempts;
    let initial_delay = Duration::from_millis(settings.ingest.initial_retry_delay_ms);

    // Transient store errors abort a batch; retry the whole run. Replayed
    // events that already landed resolve to skips, so retries are safe.
    let report = retry_with_backoff(
        || pipeline.ingest_all(&events),
        max_attempts,
        initial_delay,
    )
    .await?;

    log_report(&report);
    info!("Ingest completed");
    Ok(())
}

/// Read raw events from a JSON-lines file
fn read_events(path: &PathBuf, max_line_warnings: usize) -> Result<Vec<RawListingEvent>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();
    let mut malformed = 0;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<RawListingEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                if malformed < max_line_warnings {
                    warn!("Line {}: {}", i + 1, e);
                }
                malformed += 1;
            }
        }
    }

    if malformed > 0 {
        warn!("Skipped {} malformed lines", malformed);
    }

    Ok(events)
}

/// Run events through the normalizer only, without a database
fn dry_run_report(normalizer: &ListingNormalizer, events: &[RawListingEvent]) -> IngestReport {
    let mut report = IngestReport::default();
    let mut seen = std::collections::HashSet::new();

    for event in events {
        report.received += 1;
        match normalizer.normalize(event) {
            Ok(listing) => {
                if seen.insert(listing.dedupe_key()) {
                    report.inserted += 1;
                } else {
                    report.skipped += 1;
                }
            }
            Err(e) => {
                report.rejected += 1;
                warn!("Rejected event for {:?}: {}", event.coin, e);
            }
        }
    }

    report
}

fn log_report(report: &IngestReport) {
    info!("Ingest summary:");
    info!("  Received: {}", report.received);
    info!("  Inserted: {}", report.inserted);
    info!("  Skipped (duplicates): {}", report.skipped);
    info!("  Rejected (invalid): {}", report.rejected);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_counts_duplicates() {
        let normalizer = ListingNormalizer::new();
        let events = vec![
            RawListingEvent::new("abc", "Binance", "2026-08-30T12:00:00Z", "twitter"),
            RawListingEvent::new("ABC", "Binance", "2026-08-30T13:00:00Z", "twitter"),
            RawListingEvent::new("", "Binance", "2026-08-30T12:00:00Z", "twitter"),
        ];

        let report = dry_run_report(&normalizer, &events);
        assert_eq!(report.received, 3);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rejected, 1);
    }
}
