//! # Listing Manager
//!
//! Deduplicating ingestion for new coin listing announcements.
//!
//! ## Features
//!
//! - **Normalization**: Raw feed events are validated, trimmed, and upper-cased
//!   into a canonical form before any persistence
//! - **Deduplication**: One record per `(coin, market, source)`, enforced by a
//!   database unique constraint rather than in-process state
//! - **Append-only storage**: Records are never updated or deleted; re-announced
//!   listings resolve to a skip
//!
//! ## Architecture
//!
//! Events flow through a three-stage pipeline: normalizer, deduplicator, writer.
//! The writer's `INSERT ... ON CONFLICT DO NOTHING` makes the unique constraint
//! the sole serialization point, so concurrent feeds for the same listing need
//! no coordination.

pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod ingest;
pub mod normalizer;
pub mod schema;
pub mod storage;

// Re-export commonly used types
pub use config::Settings;
pub use dedupe::DedupeKey;
pub use error::{ErrorCategory, ErrorClassification};
pub use ingest::{IngestError, IngestPipeline, IngestReport};
pub use normalizer::{ListingNormalizer, NormalizerConfig, ValidationError};
pub use schema::{ListingRecord, NormalizedListing, RawListingEvent};
pub use storage::{ListingRepository, RepositoryError, SchemaOperations, WriteOutcome};
