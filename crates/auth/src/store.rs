//! Token store: a key-value cache with per-entry time-to-live
//!
//! The revocation denylist and the verified-token cache each get their own
//! store. Only the verified-token cache may be bounded: a denylist entry must
//! survive until its TTL runs out, whatever else is going on. Entries are
//! derived from immutable token contents, so concurrent writers may race
//! freely (last write wins).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::claims::TokenPayload;

#[derive(Debug, thiserror::Error)]
#[error("token store unavailable: {0}")]
pub struct StoreError(pub String);

/// Key-value store with TTL, injected into `AuthBackend`
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<TokenPayload>, StoreError>;

    async fn set(&self, key: &str, payload: TokenPayload, ttl: Duration)
        -> Result<(), StoreError>;
}

#[derive(Clone)]
struct Entry {
    payload: TokenPayload,
    ttl: Duration,
}

/// Each entry lives exactly as long as the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process store on a `moka` cache
#[derive(Clone)]
pub struct MokaTokenStore {
    cache: Cache<String, Entry>,
}

impl MokaTokenStore {
    /// Store holding at most `max_capacity` entries; the cache may evict
    /// any of them early once it is full.
    pub fn bounded(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Store whose entries leave only when their TTL runs out
    pub fn unbounded() -> Self {
        Self {
            cache: Cache::builder().expire_after(PerEntryTtl).build(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl TokenStore for MokaTokenStore {
    async fn get(&self, key: &str) -> Result<Option<TokenPayload>, StoreError> {
        Ok(self.cache.get(key).await.map(|entry| entry.payload))
    }

    async fn set(
        &self,
        key: &str,
        payload: TokenPayload,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.cache.insert(key.to_string(), Entry { payload, ttl }).await;
        Ok(())
    }
}
