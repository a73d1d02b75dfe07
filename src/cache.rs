//! Single-slot cache for the most recent aggregate result.

use std::time::{Duration, Instant};

use crate::status::AggregatedResult;

/// Holds the most recent [`AggregatedResult`] for a configurable TTL so
/// that concurrent endpoint requests coalesce instead of re-running the
/// on-demand checks. A TTL of zero disables caching entirely.
pub(crate) struct ResultCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

struct CacheEntry {
    result: AggregatedResult,
    expires_at: Instant,
}

impl ResultCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The cached result, if present and not expired.
    pub(crate) fn get(&self) -> Option<AggregatedResult> {
        self.entry
            .as_ref()
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.result.clone())
    }

    /// Store a freshly computed result. No-op when the cache is disabled.
    pub(crate) fn put(&mut self, result: &AggregatedResult) {
        if self.ttl.is_zero() {
            return;
        }
        self.entry = Some(CacheEntry {
            result: result.clone(),
            expires_at: Instant::now() + self.ttl,
        });
    }
}
