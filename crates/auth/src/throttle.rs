//! Per-user request throttle
//!
//! Counts successful requests per user, method and path within the current
//! wall-clock minute. Anonymous callers are never throttled.
//!
//! A slot is reserved atomically when a request is admitted, so concurrent
//! requests from one user cannot overshoot the limit. The slot is kept when
//! the request succeeds and handed back when it fails.

use std::time::Duration;

use chrono::{Timelike, Utc};
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use uuid::Uuid;

use crate::error::AuthError;

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Throttle {
    counters: Cache<String, u64>,
    limit: u64,
}

impl Throttle {
    pub fn new(limit: u64) -> Self {
        Self {
            counters: Cache::builder().time_to_live(WINDOW).build(),
            limit,
        }
    }

    /// Reserve a slot, or fail with `ThrottleExceeded` once `limit` requests
    /// have succeeded (or are still in flight) this minute.
    ///
    /// Commit the returned ticket after the request succeeds; dropping it
    /// releases the slot.
    pub fn admit(&self, method: &str, path: &str, user: Uuid) -> Result<ThrottleTicket, AuthError> {
        let key = counter_key(method, path, user, Utc::now().minute());
        let limit = self.limit;

        let result = self.counters.entry_by_ref(&key).and_compute_with(|existing| {
            let count = existing.map(|entry| entry.into_value()).unwrap_or(0);
            if count >= limit {
                Op::Nop
            } else {
                Op::Put(count + 1)
            }
        });

        match result {
            CompResult::Inserted(_) | CompResult::ReplacedWith(_) => Ok(ThrottleTicket {
                counters: self.counters.clone(),
                key,
                committed: false,
            }),
            other => {
                let count = match other {
                    CompResult::Unchanged(entry) => entry.into_value(),
                    _ => 0,
                };
                tracing::info!(user_id = %user, method, path, count, "Request throttled");
                Err(AuthError::ThrottleExceeded)
            }
        }
    }
}

#[must_use = "commit the ticket once the request succeeds"]
pub struct ThrottleTicket {
    counters: Cache<String, u64>,
    key: String,
    committed: bool,
}

impl ThrottleTicket {
    /// Keep the reserved slot
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for ThrottleTicket {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        self.counters
            .entry_by_ref(&self.key)
            .and_compute_with(|existing| match existing.map(|entry| entry.into_value()) {
                Some(count) if count > 1 => Op::Put(count - 1),
                Some(_) => Op::Remove,
                None => Op::Nop,
            });
    }
}

fn counter_key(method: &str, path: &str, user: Uuid, minute: u32) -> String {
    format!("{}_{}_{}_{}", method, path, user, minute)
}
