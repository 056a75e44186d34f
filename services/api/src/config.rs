//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use manga_reader_core::LanguageFilter;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub catalog_base_url: String,
    pub catalog_feed_limit: u32,
    pub default_languages: LanguageFilter,
    pub cors_origin: String,
    pub auth_session_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Content Catalog Settings ---
        let catalog_base_url = lookup("CATALOG_BASE_URL")
            .unwrap_or_else(|| "https://api.mangadex.org".to_string())
            .trim_end_matches('/')
            .to_string();

        let feed_limit_str = lookup("CATALOG_FEED_LIMIT").unwrap_or_else(|| "500".to_string());
        let catalog_feed_limit = feed_limit_str
            .parse::<u32>()
            .ok()
            .filter(|limit| (1..=500).contains(limit))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "CATALOG_FEED_LIMIT".to_string(),
                    format!("'{}' must be between 1 and 500", feed_limit_str),
                )
            })?;

        let languages_str = lookup("DEFAULT_LANGUAGES").unwrap_or_else(|| "en,ar".to_string());
        let default_languages = LanguageFilter::parse(&languages_str).ok_or_else(|| {
            ConfigError::InvalidValue(
                "DEFAULT_LANGUAGES".to_string(),
                "at least one language code is required".to_string(),
            )
        })?;

        // --- Load Web Settings ---
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let session_days_str = lookup("AUTH_SESSION_DAYS").unwrap_or_else(|| "30".to_string());
        let auth_session_days = session_days_str
            .parse::<i64>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "AUTH_SESSION_DAYS".to_string(),
                    format!("'{}' is not a positive number of days", session_days_str),
                )
            })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            catalog_base_url,
            catalog_feed_limit,
            default_languages,
            cors_origin,
            auth_session_days,
        })
    }
}
