//! Per-key rate limiter using the token bucket algorithm.
//!
//! ```text
//! key "10.0.0.7" ─▶ bucket (capacity: burst)
//!                   ├─ refills at `rate` tokens/second
//!                   ├─ each request consumes one token
//!                   └─ empty bucket → request rejected
//! ```
//!
//! Buckets are created lazily on the first request for a key. A periodic
//! sweep drops every bucket, idle or not.

use crate::metrics::LimiterMetrics;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

struct Buckets {
    rate: f64,
    burst: f64,
    store: Mutex<HashMap<String, Bucket>>,
}

impl Buckets {
    fn clear(&self) -> usize {
        let mut store = self.store.lock();
        let evicted = store.len();
        store.clear();
        evicted
    }
}

/// Token-bucket admission gate keyed by an arbitrary string (usually an IP).
///
/// Cloning is cheap; clones share the same buckets.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Buckets>,
}

impl RateLimiter {
    /// Limiter refilling `rate` tokens per second up to `burst`.
    #[must_use]
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            inner: Arc::new(Buckets {
                rate,
                burst: f64::from(burst),
                store: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Consume one token for `key`; `false` if none is available.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut store = self.inner.store.lock();
        let bucket = store.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.inner.burst,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = elapsed.mul_add(self.inner.rate, bucket.tokens).min(self.inner.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            tracing::debug!(key = %key, available = bucket.tokens, "Rate limit check passed");
            true
        } else {
            tracing::warn!(key = %key, available = bucket.tokens, "Rate limit exceeded");
            LimiterMetrics::record_rate_limited();
            false
        }
    }

    /// Drop every bucket. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        self.inner.clear()
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    /// `true` when no key is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tokens per second.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.inner.rate
    }

    /// Bucket capacity.
    #[must_use]
    pub fn burst(&self) -> f64 {
        self.inner.burst
    }

    /// Clear all buckets every `every` on the current tokio runtime.
    ///
    /// The task ends once every clone of the limiter has been dropped.
    #[must_use = "dropping the handle does not stop the sweep; keep it to abort"]
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Buckets> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let evicted = inner.clear();
                tracing::debug!(evicted, "Rate limiter sweep");
            }
        })
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rate", &self.inner.rate)
            .field("burst", &self.inner.burst)
            .field("keys", &self.len())
            .finish()
    }
}
