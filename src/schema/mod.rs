//! Canonical listing types
//!
//! All feed-specific announcement data is normalized to these types before
//! storage.

mod listing;

pub use listing::*;
