//! Listing repository
//!
//! Provides the write path for normalized listings and query helpers for
//! operators. The insert is a single atomic statement guarded by the unique
//! constraint on `(coin, market, source)`: concurrent writers for the same
//! key race at the store, exactly one observes `Inserted`, the rest resolve
//! to `Skipped`. No in-process locking is needed.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::DatabaseSettings;
use crate::dedupe::DedupeKey;
use crate::error::{ErrorCategory, ErrorClassification};
use crate::schema::{ListingRecord, NormalizedListing};

/// Repository errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl ErrorClassification for RepositoryError {
    fn category(&self) -> ErrorCategory {
        match self {
            RepositoryError::Database(_) => ErrorCategory::Transient,
            RepositoryError::Configuration(_) => ErrorCategory::Configuration,
            RepositoryError::InvalidData(_) => ErrorCategory::Permanent,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            RepositoryError::Database(_) => Some(Duration::from_millis(500)),
            _ => None,
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Outcome of a listing write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// A new row was appended; carries the stored record with its
    /// store-assigned id and timestamps.
    Inserted(ListingRecord),
    /// A row for this key already exists; nothing was changed.
    Skipped(DedupeKey),
}

impl WriteOutcome {
    /// Returns true if a row was appended
    pub fn is_inserted(&self) -> bool {
        matches!(self, WriteOutcome::Inserted(_))
    }

    /// Returns true if the write was a duplicate no-op
    pub fn is_skipped(&self) -> bool {
        matches!(self, WriteOutcome::Skipped(_))
    }
}

/// Listing repository
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new repository from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&settings.url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Get the database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a normalized listing, skipping duplicates.
    ///
    /// Requires the unique constraint on `(coin, market, source)` (created by
    /// [`SchemaOperations::run_migrations`](super::SchemaOperations)); the
    /// `ON CONFLICT` target errors out without it. A conflict is expected
    /// behavior — upstream feeds re-announce the same listing — and resolves
    /// to [`WriteOutcome::Skipped`] without touching the existing row.
    /// `reported_at` and `created_at` are assigned by the store at insert.
    pub async fn insert_listing(
        &self,
        listing: &NormalizedListing,
    ) -> RepositoryResult<WriteOutcome> {
        let row = sqlx::query(
            r#"
            INSERT INTO new_coin_listings (coin, market, trading_start, source, url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (coin, market, source) DO NOTHING
            RETURNING id, coin, market, trading_start, source, url, reported_at, created_at
            "#,
        )
        .bind(&listing.coin)
        .bind(&listing.market)
        .bind(listing.trading_start)
        .bind(&listing.source)
        .bind(&listing.url)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let record = row_to_record(&row);
                debug!("Inserted listing {} with id {}", record.coin, record.id);
                Ok(WriteOutcome::Inserted(record))
            }
            None => {
                let key = listing.dedupe_key();
                debug!("Skipped duplicate listing {}", key);
                Ok(WriteOutcome::Skipped(key))
            }
        }
    }

    /// Get a listing by its uniqueness key
    pub async fn get(
        &self,
        coin: &str,
        market: &str,
        source: &str,
    ) -> RepositoryResult<Option<ListingRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, coin, market, trading_start, source, url, reported_at, created_at
            FROM new_coin_listings
            WHERE coin = $1 AND market = $2 AND source = $3
            "#,
        )
        .bind(coin)
        .bind(market)
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_record))
    }

    /// List the most recently reported listings
    pub async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<ListingRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, coin, market, trading_start, source, url, reported_at, created_at
            FROM new_coin_listings
            ORDER BY reported_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    /// List listings reported by a given source feed
    pub async fn list_by_source(
        &self,
        source: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<ListingRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, coin, market, trading_start, source, url, reported_at, created_at
            FROM new_coin_listings
            WHERE source = $1
            ORDER BY reported_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(source)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Get total number of recorded listings
    pub async fn count(&self) -> RepositoryResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM new_coin_listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    /// Get overall listing statistics
    pub async fn get_stats(&self) -> RepositoryResult<ListingStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total_listings,
                COUNT(DISTINCT coin) as distinct_coins,
                COUNT(DISTINCT source) as distinct_sources,
                MIN(reported_at) as earliest_reported,
                MAX(reported_at) as latest_reported
            FROM new_coin_listings
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ListingStats {
            total_listings: row.get::<i64, _>("total_listings") as u64,
            distinct_coins: row.get::<i64, _>("distinct_coins") as u64,
            distinct_sources: row.get::<i64, _>("distinct_sources") as u64,
            earliest_reported: row.get("earliest_reported"),
            latest_reported: row.get("latest_reported"),
        })
    }

    /// Get per-source record counts
    pub async fn get_source_counts(&self) -> RepositoryResult<Vec<(String, u64)>> {
        let rows = sqlx::query(
            r#"
            SELECT source, COUNT(*) as count
            FROM new_coin_listings
            GROUP BY source
            ORDER BY count DESC, source
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("source"), row.get::<i64, _>("count") as u64))
            .collect())
    }
}

/// Overall listing statistics
#[derive(Debug, Clone)]
pub struct ListingStats {
    pub total_listings: u64,
    pub distinct_coins: u64,
    pub distinct_sources: u64,
    pub earliest_reported: Option<DateTime<Utc>>,
    pub latest_reported: Option<DateTime<Utc>>,
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> ListingRecord {
    ListingRecord {
        id: row.get("id"),
        coin: row.get("coin"),
        market: row.get("market"),
        trading_start: row.get("trading_start"),
        source: row.get("source"),
        url: row.get("url"),
        reported_at: row.get("reported_at"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_write_outcome_predicates() {
        let record = ListingRecord {
            id: 1,
            coin: "ABC".to_string(),
            market: "Binance".to_string(),
            trading_start: Utc::now(),
            source: "twitter".to_string(),
            url: None,
            reported_at: Utc::now(),
            created_at: Utc::now(),
        };

        let inserted = WriteOutcome::Inserted(record);
        assert!(inserted.is_inserted());
        assert!(!inserted.is_skipped());

        let skipped = WriteOutcome::Skipped(DedupeKey::new("ABC", "Binance", "twitter"));
        assert!(skipped.is_skipped());
        assert!(!skipped.is_inserted());
    }

    #[test]
    fn test_repository_error_classification() {
        let err = RepositoryError::Configuration("missing url".to_string());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.suggested_retry_delay(), None);

        let err = RepositoryError::InvalidData("bad row".to_string());
        assert!(err.is_permanent());
    }
}
