//! Authentication configuration

use reelhouse_common::config::Config;

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub cache_margin_secs: i64,
    pub cache_capacity: u64,
}

impl From<&Config> for AuthConfig {
    fn from(config: &Config) -> Self {
        Self {
            access_token_secret: config.access_token_secret.clone(),
            refresh_token_secret: config.refresh_token_secret.clone(),
            access_token_ttl_secs: config.access_token_ttl_secs,
            refresh_token_ttl_secs: config.refresh_token_ttl_secs,
            cache_margin_secs: config.token_cache_margin_secs,
            cache_capacity: config.token_cache_capacity,
        }
    }
}
