//! Ingestion pipeline
//!
//! Ties the normalizer and the repository together: a raw event is
//! validated and normalized, then written with duplicate resolution at
//! the store. Validation failures never reach the database.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{ErrorCategory, ErrorClassification};
use crate::normalizer::{ListingNormalizer, ValidationError};
use crate::schema::RawListingEvent;
use crate::storage::{ListingRepository, RepositoryError, WriteOutcome};

/// Errors produced by the ingestion pipeline
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IngestError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),
}

impl ErrorClassification for IngestError {
    fn category(&self) -> ErrorCategory {
        match self {
            IngestError::Validation(e) => e.category(),
            IngestError::Store(e) => e.category(),
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            IngestError::Validation(e) => e.suggested_retry_delay(),
            IngestError::Store(e) => e.suggested_retry_delay(),
        }
    }
}

/// Summary of a batch ingest run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Raw events received
    pub received: u64,
    /// New rows appended
    pub inserted: u64,
    /// Duplicate events resolved to a no-op
    pub skipped: u64,
    /// Events rejected by validation
    pub rejected: u64,
}

/// Ingestion pipeline for raw listing events
pub struct IngestPipeline {
    normalizer: ListingNormalizer,
    repository: ListingRepository,
}

impl IngestPipeline {
    /// Create a new pipeline
    pub fn new(normalizer: ListingNormalizer, repository: ListingRepository) -> Self {
        Self {
            normalizer,
            repository,
        }
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &ListingRepository {
        &self.repository
    }

    /// Ingest a single raw event.
    ///
    /// Returns the write outcome for valid events. Invalid events fail
    /// fast with [`IngestError::Validation`] before any store interaction.
    pub async fn ingest(&self, event: &RawListingEvent) -> Result<WriteOutcome, IngestError> {
        let listing = self.normalizer.normalize(event)?;
        let outcome = self.repository.insert_listing(&listing).await?;
        Ok(outcome)
    }

    /// Ingest a batch of raw events, continuing past per-event failures.
    ///
    /// Validation rejections are counted and logged; a store error aborts
    /// the batch since later events would hit the same failure.
    pub async fn ingest_all(&self, events: &[RawListingEvent]) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();

        for event in events {
            report.received += 1;

            match self.ingest(event).await {
                Ok(WriteOutcome::Inserted(record)) => {
                    report.inserted += 1;
                    debug!("Recorded listing {} on {}", record.coin, record.market);
                }
                Ok(WriteOutcome::Skipped(key)) => {
                    report.skipped += 1;
                    debug!("Duplicate listing {}", key);
                }
                Err(IngestError::Validation(e)) => {
                    report.rejected += 1;
                    warn!("Rejected event for {:?}: {}", event.coin, e);
                }
                Err(e @ IngestError::Store(_)) => {
                    return Err(e);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_classification() {
        let err = IngestError::Validation(ValidationError::Required { field: "coin" });
        assert!(err.is_permanent());
        assert_eq!(err.suggested_retry_delay(), None);
    }

    #[test]
    fn test_report_default() {
        let report = IngestReport::default();
        assert_eq!(report.received, 0);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.rejected, 0);
    }
}
