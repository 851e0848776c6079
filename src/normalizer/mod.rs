//! Listing event normalizer
//!
//! Validates raw listing events and canonicalizes them into
//! [`NormalizedListing`]. Normalization is a pure function: no side effects,
//! and the same input always produces the same output.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::ValidationSettings;
use crate::schema::{NormalizedListing, RawListingEvent};

/// Validation errors for listing events.
///
/// These are input problems: permanent, never retried, and surfaced to the
/// caller before any store interaction.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    /// Required field is empty or missing
    #[error("{field} is required but was empty")]
    Required { field: &'static str },

    /// Field exceeds maximum length
    #[error("{field} '{value}' exceeds maximum length of {max_length}")]
    TooLong {
        field: &'static str,
        value: String,
        max_length: usize,
    },

    /// Trading start time could not be parsed
    #[error("could not parse trading start time: '{value}'")]
    InvalidTimestamp { value: String },
}

impl crate::error::ErrorClassification for ValidationError {
    fn category(&self) -> crate::error::ErrorCategory {
        // Validation errors are input issues
        crate::error::ErrorCategory::Permanent
    }
}

/// Result type for normalization
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration for listing normalization.
///
/// Defaults match the column bounds of the `new_coin_listings` table.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Maximum coin ticker length
    pub max_coin_length: usize,
    /// Maximum market identifier length
    pub max_market_length: usize,
    /// Maximum source identifier length
    pub max_source_length: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_coin_length: 20,
            max_market_length: 50,
            max_source_length: 50,
        }
    }
}

impl From<&ValidationSettings> for NormalizerConfig {
    fn from(settings: &ValidationSettings) -> Self {
        Self {
            max_coin_length: settings.max_coin_length,
            max_market_length: settings.max_market_length,
            max_source_length: settings.max_source_length,
        }
    }
}

/// Normalizer for raw listing events
pub struct ListingNormalizer {
    config: NormalizerConfig,
}

impl ListingNormalizer {
    /// Create a normalizer with default config
    pub fn new() -> Self {
        Self {
            config: NormalizerConfig::default(),
        }
    }

    /// Create a normalizer with custom config
    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw listing event.
    ///
    /// - `coin`: trimmed and upper-cased, must be 1..=20 chars
    /// - `market`: trimmed, must be 1..=50 chars
    /// - `source`: trimmed, must be 1..=50 chars
    /// - `trading_start`: parsed into an absolute UTC timestamp
    /// - `url`: passed through unchanged
    pub fn normalize(&self, event: &RawListingEvent) -> ValidationResult<NormalizedListing> {
        let coin = self.normalize_field("coin", &event.coin, self.config.max_coin_length)?;
        let market = self.normalize_field("market", &event.market, self.config.max_market_length)?;
        let source = self.normalize_field("source", &event.source, self.config.max_source_length)?;
        let trading_start = parse_trading_start(&event.trading_start)?;

        Ok(NormalizedListing {
            coin: coin.to_uppercase(),
            market,
            trading_start,
            source,
            url: event.url.clone(),
        })
    }

    fn normalize_field(
        &self,
        field: &'static str,
        value: &str,
        max_length: usize,
    ) -> ValidationResult<String> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Required { field });
        }

        if trimmed.chars().count() > max_length {
            return Err(ValidationError::TooLong {
                field,
                value: trimmed.to_string(),
                max_length,
            });
        }

        Ok(trimmed.to_string())
    }

    /// Get the current config
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }
}

impl Default for ListingNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a trading start time from the formats seen across feeds.
///
/// Announcement parsers emit `YYYY-MM-DD HH:MM UTC`; other feeds deliver
/// RFC 3339 or unix timestamps. Naive datetimes are interpreted as UTC.
pub fn parse_trading_start(s: &str) -> ValidationResult<DateTime<Utc>> {
    let s = s.trim();

    if s.is_empty() {
        return Err(ValidationError::Required {
            field: "trading_start",
        });
    }

    // Try ISO 8601 / RFC 3339
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }

    // Announcement format carries an explicit UTC suffix
    let naive_part = s.strip_suffix(" UTC").unwrap_or(s);

    let formats = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];

    for format in &formats {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(naive_part, format) {
            return Ok(naive.and_utc());
        }
    }

    // Try Unix timestamp (seconds or milliseconds)
    if let Ok(ts) = s.parse::<i64>() {
        let parsed = if ts > 1_000_000_000_000 {
            DateTime::from_timestamp_millis(ts)
        } else {
            DateTime::from_timestamp(ts, 0)
        };
        return parsed.ok_or_else(|| ValidationError::InvalidTimestamp {
            value: s.to_string(),
        });
    }

    Err(ValidationError::InvalidTimestamp {
        value: s.to_string(),
    })
}
