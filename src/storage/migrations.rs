//! Database schema management
//!
//! Creates the `new_coin_listings` table and the unique constraint the writer
//! depends on. All DDL is idempotent so migrations can run on every startup.

use sqlx::{PgPool, Row};
use tracing::info;

use super::{RepositoryError, RepositoryResult};

/// Schema operations for the listings database
pub struct SchemaOperations {
    pool: PgPool,
}

impl SchemaOperations {
    /// Create a new schema operations helper
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> RepositoryResult<()> {
        info!("Running listing schema migrations...");

        // Create new_coin_listings table. The UNIQUE constraint on
        // (coin, market, source) is the dedup mechanism: the writer's
        // ON CONFLICT clause targets it.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS new_coin_listings (
                id SERIAL PRIMARY KEY,
                coin VARCHAR(20) NOT NULL,
                market VARCHAR(50) NOT NULL,
                trading_start TIMESTAMPTZ NOT NULL,
                source VARCHAR(50) NOT NULL,
                url TEXT,
                reported_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (coin, market, source)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_new_coin_listings_reported
            ON new_coin_listings (reported_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_new_coin_listings_source
            ON new_coin_listings (source, reported_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Listing schema migrations completed");
        Ok(())
    }

    /// Verify that the schema the writer depends on is in place.
    ///
    /// Checks that the table exists and that the unique constraint on
    /// `(coin, market, source)` is present. Without the constraint the
    /// writer's insert cannot resolve duplicates at the store.
    pub async fn verify_schema(&self) -> RepositoryResult<()> {
        let table = sqlx::query(
            r#"
            SELECT to_regclass('new_coin_listings') IS NOT NULL as exists
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        if !table.get::<bool, _>("exists") {
            return Err(RepositoryError::Configuration(
                "table new_coin_listings does not exist (run `db migrate`)".to_string(),
            ));
        }

        let constraint = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM information_schema.table_constraints tc
            JOIN information_schema.constraint_column_usage ccu
              ON tc.constraint_name = ccu.constraint_name
            WHERE tc.table_name = 'new_coin_listings'
              AND tc.constraint_type = 'UNIQUE'
              AND ccu.column_name IN ('coin', 'market', 'source')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        // All three columns of the dedupe key must be covered
        if constraint.get::<i64, _>("count") < 3 {
            return Err(RepositoryError::Configuration(
                "unique constraint on (coin, market, source) is missing".to_string(),
            ));
        }

        Ok(())
    }
}

/// SQL migration script
pub const MIGRATION_SQL: &str = r#"
-- New coin listings schema
-- Run this to initialize the database

CREATE TABLE IF NOT EXISTS new_coin_listings (
    id SERIAL PRIMARY KEY,
    coin VARCHAR(20) NOT NULL,
    market VARCHAR(50) NOT NULL,
    trading_start TIMESTAMPTZ NOT NULL,
    source VARCHAR(50) NOT NULL,
    url TEXT,
    reported_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    -- One record per (coin, market, source); the ingest writer's
    -- ON CONFLICT clause targets this constraint.
    UNIQUE (coin, market, source)
);

CREATE INDEX IF NOT EXISTS idx_new_coin_listings_reported
ON new_coin_listings (reported_at DESC);

CREATE INDEX IF NOT EXISTS idx_new_coin_listings_source
ON new_coin_listings (source, reported_at DESC);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_sql_syntax() {
        // Just verify the SQL constant is valid
        assert!(MIGRATION_SQL.contains("CREATE TABLE"));
        assert!(MIGRATION_SQL.contains("UNIQUE (coin, market, source)"));
    }
}
