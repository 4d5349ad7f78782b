//! Per-key token bucket rate limiting.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket rate limiter keyed by caller.
///
/// Each key gets `capacity` tokens that refill continuously, reaching full
/// capacity again after `interval`. Buckets are created on first use.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    interval: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Create a limiter allowing `capacity` requests per `interval` per key.
    #[must_use]
    pub fn new(capacity: u32, interval: Duration) -> Self {
        Self {
            capacity: f64::from(capacity.max(1)),
            interval: interval.max(Duration::from_millis(1)),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Try to take one token for `key` now.
    pub fn try_acquire(&self, key: &str) -> bool {
        self.try_acquire_at(key, Instant::now())
    }

    /// Try to take one token for `key` at the given instant.
    ///
    /// A denied request consumes nothing.
    pub fn try_acquire_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });

        // A denied bucket is left untouched so refill is always measured from
        // the last granted token.
        let available = self.refilled(bucket, now);
        if available >= 1.0 {
            bucket.tokens = available - 1.0;
            bucket.last_refill = now;
            true
        } else {
            false
        }
    }

    /// Drop buckets that have refilled to capacity by `now`. Returns the
    /// number of buckets removed.
    pub fn prune_idle(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let before = buckets.len();
        buckets.retain(|_, bucket| self.refilled(bucket, now) < self.capacity);
        before - buckets.len()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn refilled(&self, bucket: &Bucket, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let gained = elapsed.as_secs_f64() * self.capacity / self.interval.as_secs_f64();
        (bucket.tokens + gained).min(self.capacity)
    }
}
