//! Storage layer for coin listings
//!
//! Provides PostgreSQL persistence for normalized listing events. The table's
//! unique constraint on `(coin, market, source)` is the system's sole
//! consistency invariant; inserts resolve conflicts to a skip, never an error.

mod migrations;
mod repository;

pub use migrations::*;
pub use repository::*;
