//! Ingest Integration Tests
//!
//! These tests exercise the full pipeline against a real PostgreSQL database:
//! RawListingEvent → Normalizer → Repository → new_coin_listings
//!
//! # Setup
//!
//! 1. Start a PostgreSQL instance and create a scratch database:
//!    ```bash
//!    createdb listing_manager_test
//!    ```
//!
//! 2. Set the connection URL:
//!    ```bash
//!    export DATABASE_URL=postgresql://localhost/listing_manager_test
//!    ```
//!
//! 3. Run tests:
//!    ```bash
//!    cargo test --test ingest_integration -- --ignored --nocapture
//!    ```
//!
//! # Notes
//!
//! - Tests are marked `#[ignore]` by default since they require a database
//! - Each test uses a distinct source identifier so runs don't collide
//! - Migrations run at the start of every test and are idempotent

use std::env;

use listing_manager::{
    IngestError, IngestPipeline, ListingNormalizer, ListingRepository, RawListingEvent,
    SchemaOperations, WriteOutcome,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Check if a test database is available
fn has_database() -> bool {
    env::var("DATABASE_URL").is_ok()
}

/// Skip test if no database is configured
macro_rules! require_database {
    () => {
        if !has_database() {
            eprintln!("Skipping: DATABASE_URL not set");
            return;
        }
    };
}

/// Connect, migrate, and clear any rows left over for the given source
async fn setup_pipeline(source: &str) -> IngestPipeline {
    let url = env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to test database");

    let schema = SchemaOperations::new(pool.clone());
    schema.run_migrations().await.expect("migrations failed");
    schema.verify_schema().await.expect("schema verify failed");

    sqlx::query("DELETE FROM new_coin_listings WHERE source = $1")
        .bind(source)
        .execute(&pool)
        .await
        .expect("cleanup failed");

    IngestPipeline::new(ListingNormalizer::new(), ListingRepository::new(pool))
}

fn sample_event(source: &str) -> RawListingEvent {
    RawListingEvent::new("aster", "Binance Spot", "2026-09-01T12:00:00Z", source)
        .with_url("https://example.com/announcements/aster")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_insert_then_duplicate_skips() {
    require_database!();
    let source = "it-dup";
    let pipeline = setup_pipeline(source).await;

    let event = sample_event(source);

    let first = pipeline.ingest(&event).await.expect("first ingest failed");
    let record = match first {
        WriteOutcome::Inserted(record) => record,
        WriteOutcome::Skipped(key) => panic!("expected insert, got skip for {}", key),
    };
    assert_eq!(record.coin, "ASTER");
    assert_eq!(record.market, "Binance Spot");

    // Same key, different trading_start and url: still a duplicate
    let replay = RawListingEvent::new("ASTER", "Binance Spot", "2026-09-02 08:00:00", source)
        .with_url("https://example.com/announcements/aster-again");
    let second = pipeline.ingest(&replay).await.expect("replay failed");
    assert!(second.is_skipped());

    // The original row is untouched
    let stored = pipeline
        .repository()
        .get("ASTER", "Binance Spot", source)
        .await
        .expect("get failed")
        .expect("row missing");
    assert_eq!(stored.id, record.id);
    assert_eq!(stored.trading_start, record.trading_start);
    assert_eq!(stored.url, record.url);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_writers_insert_exactly_once() {
    require_database!();
    let source = "it-race";
    let pipeline = setup_pipeline(source).await;
    let pool = pipeline.repository().pool().clone();

    let event = sample_event(source);
    let normalizer = ListingNormalizer::new();
    let listing = normalizer.normalize(&event).expect("normalize failed");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = ListingRepository::new(pool.clone());
        let listing = listing.clone();
        handles.push(tokio::spawn(async move {
            repo.insert_listing(&listing).await
        }));
    }

    let mut inserted = 0;
    let mut skipped = 0;
    for handle in handles {
        match handle.await.expect("task panicked").expect("write failed") {
            WriteOutcome::Inserted(_) => inserted += 1,
            WriteOutcome::Skipped(_) => skipped += 1,
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(skipped, 7);

    let stored = pipeline
        .repository()
        .list_by_source(source, 100)
        .await
        .expect("list failed");
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_invalid_event_rejected_without_write() {
    require_database!();
    let source = "it-invalid";
    let pipeline = setup_pipeline(source).await;

    let event = RawListingEvent::new("", "Binance Spot", "2026-09-01T12:00:00Z", source);
    let result = pipeline.ingest(&event).await;
    assert!(matches!(result, Err(IngestError::Validation(_))));

    let event = RawListingEvent::new("ABC", "Binance Spot", "whenever", source);
    let result = pipeline.ingest(&event).await;
    assert!(matches!(result, Err(IngestError::Validation(_))));

    let stored = pipeline
        .repository()
        .list_by_source(source, 100)
        .await
        .expect("list failed");
    assert!(stored.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_batch_report_counts() {
    require_database!();
    let source = "it-batch";
    let pipeline = setup_pipeline(source).await;

    let events = vec![
        RawListingEvent::new("abc", "Binance", "2026-09-01T12:00:00Z", source),
        // Same listing re-announced with different casing
        RawListingEvent::new("ABC", "Binance", "2026-09-01T12:00:00Z", source),
        RawListingEvent::new("xyz", "Kraken", "2026-09-02T12:00:00Z", source),
        // Missing market
        RawListingEvent::new("DEF", "", "2026-09-01T12:00:00Z", source),
    ];

    let report = pipeline.ingest_all(&events).await.expect("batch failed");
    assert_eq!(report.received, 4);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.rejected, 1);

    // Re-running the whole batch is idempotent
    let report = pipeline.ingest_all(&events).await.expect("replay failed");
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.rejected, 1);
}
