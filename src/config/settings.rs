//! Application settings and configuration

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database configuration
    pub database: DatabaseSettings,
    /// Validation settings
    #[serde(default)]
    pub validation: ValidationSettings,
    /// Ingest settings
    #[serde(default)]
    pub ingest: IngestSettings,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

/// Validation settings for incoming listing events.
///
/// Defaults mirror the column bounds of the `new_coin_listings` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Maximum coin ticker length
    #[serde(default = "default_max_coin_length")]
    pub max_coin_length: usize,
    /// Maximum market identifier length
    #[serde(default = "default_max_market_length")]
    pub max_market_length: usize,
    /// Maximum source identifier length
    #[serde(default = "default_max_source_length")]
    pub max_source_length: usize,
}

fn default_max_coin_length() -> usize {
    20
}

fn default_max_market_length() -> usize {
    50
}

fn default_max_source_length() -> usize {
    50
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_coin_length: default_max_coin_length(),
            max_market_length: default_max_market_length(),
            max_source_length: default_max_source_length(),
        }
    }
}

/// Ingest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Maximum retry attempts for transient store errors
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    /// Initial retry delay in milliseconds
    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay_ms: u64,
    /// Maximum number of per-line warnings logged during a file ingest
    #[serde(default = "default_max_line_warnings")]
    pub max_line_warnings: usize,
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_initial_retry_delay() -> u64 {
    500
}

fn default_max_line_warnings() -> usize {
    10
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_retry_attempts: default_max_retry_attempts(),
            initial_retry_delay_ms: default_initial_retry_delay(),
            max_line_warnings: default_max_line_warnings(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_prefix("LISTING_MANAGER")
    }

    /// Load settings with a custom environment variable prefix
    pub fn load_with_prefix(env_prefix: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = Self::config_dir();

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Add environment-specific configuration
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Add local overrides (not checked into git)
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            // Add environment variables (e.g., LISTING_MANAGER__DATABASE__URL)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Get the configuration directory path
    fn config_dir() -> String {
        std::env::var("LISTING_MANAGER_CONFIG_DIR").unwrap_or_else(|_| "config".into())
    }

    /// Create default settings (useful for testing)
    pub fn default_settings() -> Self {
        Settings {
            database: DatabaseSettings {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/new_coin_listings".into()),
                max_connections: 10,
                min_connections: 2,
            },
            validation: ValidationSettings::default(),
            ingest: IngestSettings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::default_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default_settings();
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.validation.max_coin_length, 20);
        assert_eq!(settings.ingest.max_retry_attempts, 3);
    }

    #[test]
    fn test_validation_bounds_match_schema() {
        let validation = ValidationSettings::default();
        assert_eq!(validation.max_coin_length, 20);
        assert_eq!(validation.max_market_length, 50);
        assert_eq!(validation.max_source_length, 50);
    }
}
