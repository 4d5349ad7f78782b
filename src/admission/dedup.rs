//! Suppression of repeated archive requests for the same thread.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Remembers when each thread was last accepted for archiving.
#[derive(Debug, Default)]
pub struct DuplicateCache {
    accepted: Mutex<HashMap<String, Instant>>,
}

impl DuplicateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` was accepted less than `cooldown` before `now`.
    pub fn should_suppress(&self, id: &str, cooldown: Duration, now: Instant) -> bool {
        let accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);
        is_recent(accepted.get(id), cooldown, now)
    }

    /// Mark `id` as accepted at `now`.
    pub fn record(&self, id: &str, now: Instant) {
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), now);
    }

    /// Check and record under one lock. Returns `true` if the request is a
    /// duplicate, in which case nothing is recorded.
    pub fn check_and_record(&self, id: &str, cooldown: Duration, now: Instant) -> bool {
        let mut accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);
        if is_recent(accepted.get(id), cooldown, now) {
            return true;
        }
        accepted.insert(id.to_string(), now);
        false
    }

    /// Drop the entry for `id`, if any.
    pub fn forget(&self, id: &str) {
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Forget entries whose cooldown has passed. Returns the number removed.
    pub fn prune_expired(&self, cooldown: Duration, now: Instant) -> usize {
        let mut accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);
        let before = accepted.len();
        accepted.retain(|_, at| is_recent(Some(at), cooldown, now));
        before - accepted.len()
    }

    pub fn len(&self) -> usize {
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_recent(entry: Option<&Instant>, cooldown: Duration, now: Instant) -> bool {
    entry.is_some_and(|at| now.saturating_duration_since(*at) < cooldown)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(3600);

    #[test]
    fn test_suppress_within_cooldown() {
        let cache = DuplicateCache::new();
        let start = Instant::now();

        assert!(!cache.should_suppress("agi5zf", COOLDOWN, start));
        cache.record("agi5zf", start);

        assert!(cache.should_suppress("agi5zf", COOLDOWN, start + Duration::from_secs(3599)));
        assert!(!cache.should_suppress("agi5zf", COOLDOWN, start + COOLDOWN));
        assert!(!cache.should_suppress("other1", COOLDOWN, start));
    }

    #[test]
    fn test_check_and_record() {
        let cache = DuplicateCache::new();
        let start = Instant::now();

        assert!(!cache.check_and_record("agi5zf", COOLDOWN, start));
        assert!(cache.check_and_record("agi5zf", COOLDOWN, start + Duration::from_secs(1)));

        // The suppressed attempt did not extend the window.
        assert!(!cache.check_and_record("agi5zf", COOLDOWN, start + COOLDOWN));
    }

    #[test]
    fn test_prune_expired() {
        let cache = DuplicateCache::new();
        let start = Instant::now();
        cache.record("old111", start);
        cache.record("new111", start + Duration::from_secs(1800));

        assert_eq!(cache.prune_expired(COOLDOWN, start + COOLDOWN), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.should_suppress("new111", COOLDOWN, start + COOLDOWN));
    }

    #[test]
    fn test_forget_allows_resubmission() {
        let cache = DuplicateCache::new();
        let now = Instant::now();
        assert!(!cache.check_and_record("agi5zf", COOLDOWN, now));
        assert!(cache.check_and_record("agi5zf", COOLDOWN, now));

        cache.forget("agi5zf");
        assert!(cache.is_empty());
        assert!(!cache.check_and_record("agi5zf", COOLDOWN, now));
    }
}
