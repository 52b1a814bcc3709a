//! Failed-attempt limiter (brute-force guard).
//!
//! Each key counts failures up to `limit`. A key at the limit is blocked
//! until `interval` has passed since its last failure, after which it gets
//! one more try. Blocked keys schedule their own eviction, and a periodic
//! sweep removes every matured record.

use crate::metrics::LimiterMetrics;
use parking_lot::Mutex;
use pipeline_core::{PipelineError, Reason};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct AttemptRecord {
    count: u32,
    last_update: Instant,
    generation: u64,
    eviction_scheduled: bool,
}

impl AttemptRecord {
    fn is_mature(&self, interval: Duration) -> bool {
        self.last_update.elapsed() >= interval
    }

    fn can_check(&self, limit: u32, interval: Duration) -> bool {
        self.count < limit || (self.count == limit && self.is_mature(interval))
    }
}

struct Attempts {
    limit: u32,
    interval: Duration,
    message: String,
    records: Mutex<HashMap<String, AttemptRecord>>,
    generations: AtomicU64,
}

impl Attempts {
    /// Evict `key` if it still holds record `generation` and has matured.
    /// Returns the time left when the record is still fresh.
    fn evict_if_mature(&self, key: &str, generation: u64) -> Option<Duration> {
        let mut records = self.records.lock();
        let record = records.get_mut(key).filter(|r| r.generation == generation)?;
        let elapsed = record.last_update.elapsed();
        if elapsed >= self.interval {
            records.remove(key);
            tracing::debug!(key = %key, "Attempt record evicted");
            None
        } else {
            Some(self.interval.saturating_sub(elapsed))
        }
    }

    fn cleanup_mature(&self) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| !r.is_mature(self.interval));
        before - records.len()
    }
}

/// Per-key failure counter with time-based release.
///
/// Cloning is cheap; clones share the same records.
#[derive(Clone)]
pub struct AttemptLimiter {
    inner: Arc<Attempts>,
}

impl AttemptLimiter {
    /// Limiter allowing `limit` failures per `interval`.
    ///
    /// `message` is returned by [`check_with_response`](Self::check_with_response);
    /// `{minutes}` in it is replaced with the interval in whole minutes.
    #[must_use]
    pub fn new(limit: u32, interval: Duration, message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Attempts {
                limit,
                interval,
                message: message.into(),
                records: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Record one failure for `key`.
    ///
    /// When the key becomes blocked, a one-shot eviction is scheduled for it
    /// on the current tokio runtime (at most one per record). Without a
    /// runtime only the periodic sweep releases it.
    pub fn increment(&self, key: &str) {
        let limit = self.inner.limit;
        let interval = self.inner.interval;
        let mut records = self.inner.records.lock();
        let record = records
            .entry(key.to_string())
            .and_modify(|r| {
                r.count = (r.count + 1).min(limit);
                r.last_update = Instant::now();
            })
            .or_insert_with(|| AttemptRecord {
                count: 1,
                last_update: Instant::now(),
                generation: self.inner.generations.fetch_add(1, Ordering::Relaxed),
                eviction_scheduled: false,
            });

        tracing::debug!(key = %key, count = record.count, limit, "Failed attempt recorded");

        if record.can_check(limit, interval) || record.eviction_scheduled {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        record.eviction_scheduled = true;
        let generation = record.generation;
        drop(records);

        let weak: Weak<Attempts> = Arc::downgrade(&self.inner);
        let key = key.to_string();
        handle.spawn(async move {
            let mut delay = interval;
            loop {
                tokio::time::sleep(delay).await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                match inner.evict_if_mature(&key, generation) {
                    Some(remaining) => delay = remaining,
                    None => break,
                }
            }
        });
    }

    /// `true` if `key` may make another attempt.
    #[must_use]
    pub fn can_check(&self, key: &str) -> bool {
        self.inner
            .records
            .lock()
            .get(key)
            .is_none_or(|r| r.can_check(self.inner.limit, self.inner.interval))
    }

    /// Ok if `key` may make another attempt.
    ///
    /// # Errors
    ///
    /// Returns a `TOO_MANY_REQUESTS` error carrying the configured message
    /// while the key is blocked.
    pub fn check_with_response(&self, key: &str) -> Result<(), PipelineError> {
        if self.can_check(key) {
            return Ok(());
        }
        tracing::warn!(key = %key, "Too many failed attempts");
        LimiterMetrics::record_attempt_throttled();
        let minutes = self.inner.interval.as_secs().div_ceil(60);
        Err(PipelineError::with_reason(
            self.inner.message.replace("{minutes}", &minutes.to_string()),
            Reason::TooManyRequests,
        ))
    }

    /// Forget `key`.
    pub fn reset(&self, key: &str) {
        self.inner.records.lock().remove(key);
    }

    /// Remove every matured record. Returns how many were removed.
    pub fn cleanup_mature(&self) -> usize {
        self.inner.cleanup_mature()
    }

    /// Failures currently recorded for `key`.
    #[must_use]
    pub fn count(&self, key: &str) -> u32 {
        self.inner.records.lock().get(key).map_or(0, |r| r.count)
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.records.lock().len()
    }

    /// `true` when no key is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Failures allowed before blocking.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.inner.limit
    }

    /// Run [`cleanup_mature`](Self::cleanup_mature) every `every` on the
    /// current tokio runtime.
    ///
    /// The task ends once every clone of the limiter has been dropped.
    #[must_use = "dropping the handle does not stop the sweep; keep it to abort"]
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Attempts> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let evicted = inner.cleanup_mature();
                tracing::debug!(evicted, "Attempt limiter sweep");
            }
        })
    }
}

impl std::fmt::Debug for AttemptLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptLimiter")
            .field("limit", &self.inner.limit)
            .field("interval", &self.inner.interval)
            .field("keys", &self.len())
            .finish()
    }
}
