//! Request admission for the archive endpoint.
//!
//! A request is admitted when its caller still has rate-limit budget and the
//! same thread was not accepted within the cooldown window.

mod dedup;
mod rate_limiter;

pub use dedup::DuplicateCache;
pub use rate_limiter::RateLimiter;

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The caller is out of rate-limit budget.
    Denied,
    /// The thread was accepted recently.
    Duplicate,
}

/// Rate limiting and duplicate suppression combined.
#[derive(Debug)]
pub struct AdmissionGate {
    limiter: RateLimiter,
    dedup: DuplicateCache,
    cooldown: Duration,
}

impl AdmissionGate {
    #[must_use]
    pub fn new(capacity: u32, interval: Duration, cooldown: Duration) -> Self {
        Self {
            limiter: RateLimiter::new(capacity, interval),
            dedup: DuplicateCache::new(),
            cooldown,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rate_limit_capacity,
            config.rate_limit_interval,
            config.post_cache_time,
        )
    }

    /// Decide whether `rate_key` may archive `content_id` now.
    pub fn admit(&self, rate_key: &str, content_id: &str) -> Admission {
        self.admit_at(rate_key, content_id, Instant::now())
    }

    /// Decide whether `rate_key` may archive `content_id` at `now`.
    ///
    /// Duplicates are rejected before any token is taken, and a denied caller
    /// leaves no record behind.
    pub fn admit_at(&self, rate_key: &str, content_id: &str, now: Instant) -> Admission {
        if self.dedup.should_suppress(content_id, self.cooldown, now) {
            return Admission::Duplicate;
        }
        if !self.limiter.try_acquire_at(rate_key, now) {
            return Admission::Denied;
        }
        if self.dedup.check_and_record(content_id, self.cooldown, now) {
            // Lost a race with a concurrent request for the same thread.
            return Admission::Duplicate;
        }
        Admission::Allowed
    }

    /// Withdraw an admitted submission that never reached the archiver, so the
    /// same thread can be submitted again without waiting out the cooldown.
    /// The rate-limit token stays spent.
    pub fn withdraw(&self, content_id: &str) {
        self.dedup.forget(content_id);
    }

    /// Drop state that no longer affects any decision.
    pub fn prune(&self, now: Instant) {
        let buckets = self.limiter.prune_idle(now);
        let entries = self.dedup.prune_expired(self.cooldown, now);
        if buckets > 0 || entries > 0 {
            tracing::debug!(
                idle_buckets = buckets,
                expired_entries = entries,
                "Pruned admission state"
            );
        }
    }

    /// Periodically prune admission state until `shutdown` fires.
    pub async fn run_sweeper(&self, interval: Duration, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            "Starting admission sweeper"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.prune(Instant::now());
                }
                () = shutdown.cancelled() => {
                    tracing::info!("Admission sweeper shutting down");
                    break;
                }
            }
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn dedup(&self) -> &DuplicateCache {
        &self.dedup
    }
}
