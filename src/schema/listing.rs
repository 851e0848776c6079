//! Listing event types
//!
//! These types represent the stages of a listing announcement as it moves
//! through the system: raw feed payload, normalized event, persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw listing event as delivered by an upstream feed.
///
/// Carries no identity until normalized; `trading_start` is an unparsed
/// string because feeds disagree on timestamp formats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawListingEvent {
    /// Coin ticker as reported (any casing, may have padding)
    pub coin: String,
    /// Market the coin starts trading on (e.g., "Spot", "USD-M Perpetual")
    pub market: String,
    /// Trading start time as reported by the feed
    pub trading_start: String,
    /// Identifier of the origin feed (e.g., "binance-announcements")
    pub source: String,
    /// Announcement URL, if the feed provides one
    #[serde(default)]
    pub url: Option<String>,
}

impl RawListingEvent {
    /// Create a new raw event
    pub fn new(
        coin: impl Into<String>,
        market: impl Into<String>,
        trading_start: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            coin: coin.into(),
            market: market.into(),
            trading_start: trading_start.into(),
            source: source.into(),
            url: None,
        }
    }

    /// Set the announcement URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Normalized listing event
///
/// This is the canonical representation of a listing announcement. Produced
/// only by the normalizer: the coin is an upper-cased trimmed ticker, the
/// trading start is an absolute timestamp, and all length bounds hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedListing {
    /// Upper-cased coin ticker (1-20 chars)
    pub coin: String,
    /// Trimmed market identifier (1-50 chars)
    pub market: String,
    /// Absolute trading start time
    pub trading_start: DateTime<Utc>,
    /// Trimmed origin feed identifier (1-50 chars)
    pub source: String,
    /// Announcement URL, passed through unchanged
    pub url: Option<String>,
}

impl NormalizedListing {
    /// Get the full listing identifier (coin@market)
    pub fn full_symbol(&self) -> String {
        format!("{}@{}", self.coin, self.market)
    }
}

/// A listing persisted in the database.
///
/// Append-only: rows are never updated or deleted by this service. The id is
/// store-assigned and never reused; `reported_at` and `created_at` default to
/// the insert time at the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    /// Surrogate identifier assigned by the store
    pub id: i32,
    pub coin: String,
    pub market: String,
    pub trading_start: DateTime<Utc>,
    pub source: String,
    pub url: Option<String>,
    /// When the listing was reported to us
    pub reported_at: DateTime<Utc>,
    /// When the row was inserted
    pub created_at: DateTime<Utc>,
}

impl ListingRecord {
    /// Get the full listing identifier (coin@market)
    pub fn full_symbol(&self) -> String {
        format!("{}@{}", self.coin, self.market)
    }
}
