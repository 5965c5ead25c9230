//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Token signing secrets, one per token class
    pub access_token_secret: String,
    pub refresh_token_secret: String,

    /// Token lifetimes in seconds
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,

    /// Verified tokens are cached until `exp - margin`
    pub token_cache_margin_secs: i64,
    pub token_cache_capacity: u64,

    /// Requests per user, route and minute on throttled routes
    pub throttle_per_minute: u64,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| get(key).ok_or_else(|| anyhow::anyhow!("{} is required", key));

        let config = Self {
            database_url: required("DATABASE_URL")?,

            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,

            access_token_ttl_secs: parse_or(get("ACCESS_TOKEN_TTL_SECS"), 300),
            refresh_token_ttl_secs: parse_or(get("REFRESH_TOKEN_TTL_SECS"), 24 * 60 * 60),

            token_cache_margin_secs: parse_or(get("TOKEN_CACHE_MARGIN_SECS"), 30),
            token_cache_capacity: parse_or(get("TOKEN_CACHE_CAPACITY"), 10_000),

            throttle_per_minute: parse_or(get("THROTTLE_PER_MINUTE"), 5),

            rust_log: get("RUST_LOG").unwrap_or_else(|| "reelhouse=debug".to_string()),
            port: parse_or(get("PORT"), 3000),
        };

        if config.access_token_secret == config.refresh_token_secret {
            tracing::warn!("Access and refresh tokens share a signing secret");
        }

        Ok(config)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
