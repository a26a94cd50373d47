//! Fixed-window rate limiting keyed by client.
//!
//! Each key gets a window of [`RateLimitConfig::window`] during which at most
//! [`RateLimitConfig::max_attempts`] requests are admitted. The first request
//! after a window ends opens a fresh one.
//!
//! # Example
//!
//! ```rust,ignore
//! use franchise_core::services::{Admission, RateLimiter};
//!
//! let limiter = RateLimiter::in_memory(RateLimitConfig::default());
//! match limiter.admit("203.0.113.7") {
//!     Admission::Allowed => { /* handle the request */ }
//!     Admission::Denied { retry_after_secs } => { /* respond 429 */ }
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Configuration for [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Length of one window
    pub window: Duration,
    /// Requests admitted per key per window
    pub max_attempts: u32,
    /// How often expired windows are swept from the store
    pub sweep_interval: std::time::Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::minutes(15),
            max_attempts: 5,
            sweep_interval: std::time::Duration::from_secs(3600),
        }
    }
}

impl RateLimitConfig {
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: std::time::Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }
}

/// The outcome of asking the limiter to admit a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The key is over its limit; retry once the window ends
    Denied { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Request count for one key within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitWindow {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.reset_at <= now
    }
}

/// Storage for rate-limit windows.
///
/// Implementations must make [`hit`](Self::hit) atomic per key: two
/// concurrent hits on one key can never both observe the same count.
pub trait RateLimitStore: Send + Sync + 'static {
    /// Count one request against `key` and decide whether it is admitted.
    fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration, max_attempts: u32)
    -> Admission;

    /// Remove windows that have ended by `now`. Returns the number removed.
    fn sweep(&self, now: DateTime<Utc>) -> usize;

    /// Current window for `key`, if any.
    fn window(&self, key: &str) -> Option<RateLimitWindow>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local [`RateLimitStore`] backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: DashMap<String, RateLimitWindow>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
        max_attempts: u32,
    ) -> Admission {
        // The entry guard holds the shard lock until it drops.
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| RateLimitWindow {
                count: 0,
                reset_at: now + window,
            });

        if entry.is_expired(now) {
            *entry = RateLimitWindow {
                count: 1,
                reset_at: now + window,
            };
            return Admission::Allowed;
        }

        if entry.count >= max_attempts {
            let remaining_ms = (entry.reset_at - now).num_milliseconds().max(0);
            return Admission::Denied {
                retry_after_secs: (remaining_ms as u64).div_ceil(1000),
            };
        }

        entry.count += 1;
        Admission::Allowed
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now));
        before.saturating_sub(self.windows.len())
    }

    fn window(&self, key: &str) -> Option<RateLimitWindow> {
        self.windows.get(key).map(|window| *window)
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

/// Per-key fixed-window rate limiter.
///
/// `S` may be `dyn RateLimitStore` when the store is chosen at runtime.
pub struct RateLimiter<S: RateLimitStore + ?Sized = InMemoryRateLimitStore> {
    store: Arc<S>,
    config: RateLimitConfig,
}

impl<S: RateLimitStore + ?Sized> Clone for RateLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl RateLimiter<InMemoryRateLimitStore> {
    /// A limiter with its own, empty in-memory store.
    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()), config)
    }
}

impl<S: RateLimitStore> RateLimiter<S> {
    /// Erase the store type so limiters over different stores share one type.
    pub fn into_dyn(self) -> RateLimiter<dyn RateLimitStore> {
        let store: Arc<dyn RateLimitStore> = self.store;
        RateLimiter {
            store,
            config: self.config,
        }
    }
}

impl<S: RateLimitStore + ?Sized> RateLimiter<S> {
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn admit(&self, key: &str) -> Admission {
        self.admit_at(key, Utc::now())
    }

    /// Like [`admit`](Self::admit) with the clock supplied by the caller.
    pub fn admit_at(&self, key: &str, now: DateTime<Utc>) -> Admission {
        let admission = self
            .store
            .hit(key, now, self.config.window, self.config.max_attempts);

        if let Admission::Denied { retry_after_secs } = admission {
            tracing::warn!(key = %key, retry_after_secs, "Rate limit exceeded");
        }

        admission
    }

    /// Start the background sweep task.
    ///
    /// Runs every [`RateLimitConfig::sweep_interval`] until `shutdown` changes.
    pub fn start_sweep_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let sweep_interval = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(sweep_interval);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = store.sweep(Utc::now());
                        if removed > 0 {
                            tracing::debug!(removed, "Swept expired rate limit windows");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down rate limit sweep task");
                        break;
                    }
                }
            }
        })
    }
}
