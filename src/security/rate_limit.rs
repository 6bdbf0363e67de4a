//! Per-client token bucket rate limiting.
//!
//! Every client identity owns a bucket with a capacity of one token that
//! refills continuously at `rpm / 60` tokens per second. Buckets are created
//! on first sight and live for the rest of the process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::observability::metrics;

/// Burst size. A client may send one request, then waits for a refill.
const BUCKET_CAPACITY: f64 = 1.0;

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(now: Instant) -> Self {
        Self {
            tokens: BUCKET_CAPACITY,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, now: Instant, refill_rate: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(BUCKET_CAPACITY);
        if now > self.last_update {
            self.last_update = now;
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Registry of token buckets keyed by client identity.
#[derive(Debug)]
pub struct RateLimiterRegistry {
    requests_per_minute: Option<u32>,
    buckets: RwLock<HashMap<String, Arc<Mutex<TokenBucket>>>>,
}

impl RateLimiterRegistry {
    /// Create a registry. Zero or negative `requests_per_minute` disables limiting.
    pub fn new(requests_per_minute: i64) -> Self {
        let requests_per_minute = u32::try_from(requests_per_minute)
            .ok()
            .filter(|rpm| *rpm > 0)
            .or_else(|| (requests_per_minute > i64::from(u32::MAX)).then_some(u32::MAX));

        Self {
            requests_per_minute,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Configured limit, `None` when limiting is disabled.
    pub fn requests_per_minute(&self) -> Option<u32> {
        self.requests_per_minute
    }

    pub fn is_enabled(&self) -> bool {
        self.requests_per_minute.is_some()
    }

    /// Number of client identities holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.read().len()
    }

    /// Admit or throttle one request from `client`.
    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    /// Admit or throttle one request from `client` as of `now`.
    pub fn allow_at(&self, client: &str, now: Instant) -> bool {
        let Some(rpm) = self.requests_per_minute else {
            return true;
        };
        let refill_rate = f64::from(rpm) / 60.0;

        let bucket = self.bucket_for(client, now);
        let mut bucket = bucket.lock();
        bucket.try_acquire(now, refill_rate)
    }

    fn bucket_for(&self, client: &str, now: Instant) -> Arc<Mutex<TokenBucket>> {
        if let Some(bucket) = self.buckets.read().get(client) {
            return bucket.clone();
        }

        let mut buckets = self.buckets.write();
        // Another caller may have inserted between dropping the read lock
        // and acquiring the write lock.
        if let Some(bucket) = buckets.get(client) {
            return bucket.clone();
        }

        let bucket = Arc::new(Mutex::new(TokenBucket::new(now)));
        buckets.insert(client.to_string(), bucket.clone());
        metrics::record_tracked_clients(buckets.len());
        bucket
    }
}
