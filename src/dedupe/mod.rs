//! Listing deduplication key
//!
//! Two listing events are duplicates iff their `(coin, market, source)`
//! triples are exactly equal after normalization. Differing `trading_start`
//! or `url` on an otherwise-matching key is non-authoritative and ignored:
//! first writer wins. The schema has no versioning column, so there is no
//! update path to reconcile divergent re-announcements.
//!
//! The key is only a value; enforcement happens at the store, where a unique
//! constraint on the triple provides atomic check-and-insert semantics (see
//! `storage`).

use serde::{Deserialize, Serialize};

use crate::schema::NormalizedListing;

/// Uniqueness key for a listing: `(coin, market, source)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupeKey {
    pub coin: String,
    pub market: String,
    pub source: String,
}

impl DedupeKey {
    /// Create a key from its components
    pub fn new(
        coin: impl Into<String>,
        market: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            coin: coin.into(),
            market: market.into(),
            source: source.into(),
        }
    }
}

impl From<&NormalizedListing> for DedupeKey {
    fn from(listing: &NormalizedListing) -> Self {
        Self {
            coin: listing.coin.clone(),
            market: listing.market.clone(),
            source: listing.source.clone(),
        }
    }
}

impl NormalizedListing {
    /// Derive the uniqueness key for this listing
    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey::from(self)
    }
}

impl std::fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} via {}", self.coin, self.market, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn listing(coin: &str, market: &str, source: &str) -> NormalizedListing {
        NormalizedListing {
            coin: coin.to_string(),
            market: market.to_string(),
            trading_start: Utc::now(),
            source: source.to_string(),
            url: None,
        }
    }

    #[test]
    fn test_key_equality_ignores_trading_start_and_url() {
        let mut a = listing("ABC", "Binance", "twitter");
        let mut b = listing("ABC", "Binance", "twitter");
        a.url = Some("https://example.com/1".to_string());
        b.trading_start = a.trading_start + Duration::hours(6);

        assert_eq!(a.dedupe_key(), b.dedupe_key());
    }

    #[test]
    fn test_key_differs_on_any_component() {
        let base = listing("ABC", "Binance", "twitter");

        assert_ne!(base.dedupe_key(), listing("ABD", "Binance", "twitter").dedupe_key());
        assert_ne!(base.dedupe_key(), listing("ABC", "Spot", "twitter").dedupe_key());
        assert_ne!(base.dedupe_key(), listing("ABC", "Binance", "rss").dedupe_key());
    }

    #[test]
    fn test_display() {
        let key = DedupeKey::new("ABC", "Binance", "twitter");
        assert_eq!(key.to_string(), "ABC@Binance via twitter");
    }
}
