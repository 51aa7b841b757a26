//! Fixed-window rate limiting for form submissions
//!
//! The guard is advisory: it deters repeated submissions from one form but is
//! not a security boundary. State lives in memory only and is lost on restart.

use super::clock::{Clock, SystemClock};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Attempt budget for one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum attempts per window
    pub max_attempts: u32,
    /// Window length, measured from the first attempt
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self { max_attempts, window }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::from_secs(300),
        }
    }
}

/// Attempt count within the current window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRecord {
    pub count: u32,
    pub window_start: Instant,
    window: Duration,
}

impl RateLimitRecord {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_start: now,
            window,
        }
    }
}

/// Rate limiter owning its own table, keyed by logical identifier
pub struct RateLimiter {
    records: Arc<DashMap<String, RateLimitRecord>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a rate limiter backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a rate limiter with a custom time source
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Count an attempt for `identifier` and decide whether it may proceed.
    ///
    /// The first attempt, or the first one after the window has elapsed,
    /// starts a new window with a count of one. A rejected attempt leaves the
    /// record untouched, so the count never exceeds `max_attempts`.
    pub fn check(&self, identifier: &str, policy: RateLimitPolicy) -> Result<(), RateLimitError> {
        let now = self.clock.now();

        // The entry guard holds the shard lock: check-and-increment is atomic
        match self.records.entry(identifier.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitRecord::fresh(now, policy.window));
                debug!("Attempt allowed for {} (1/{})", identifier, policy.max_attempts);
                Ok(())
            }
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                let elapsed = now.saturating_duration_since(record.window_start);

                if elapsed > policy.window {
                    *record = RateLimitRecord::fresh(now, policy.window);
                    debug!("Window reset for {} (1/{})", identifier, policy.max_attempts);
                    return Ok(());
                }

                if record.count < policy.max_attempts {
                    record.count += 1;
                    record.window = policy.window;
                    debug!(
                        "Attempt allowed for {} ({}/{})",
                        identifier, record.count, policy.max_attempts
                    );
                    return Ok(());
                }

                let retry_after = policy.window.saturating_sub(elapsed);
                warn!(
                    "Rate limit exceeded for {} ({} attempts in window)",
                    identifier, record.count
                );
                Err(RateLimitError::LimitExceeded {
                    retry_after,
                    limit: policy.max_attempts,
                })
            }
        }
    }

    /// Boolean form of [`check`](Self::check)
    pub fn allow(&self, identifier: &str, max_attempts: u32, window: Duration) -> bool {
        self.check(identifier, RateLimitPolicy::new(max_attempts, window))
            .is_ok()
    }

    /// Current count and time elapsed in the window for an identifier
    pub fn usage(&self, identifier: &str) -> Option<(u32, Duration)> {
        let now = self.clock.now();
        self.records.get(identifier).map(|record| {
            (record.count, now.saturating_duration_since(record.window_start))
        })
    }

    /// Forget the record for an identifier
    pub fn reset(&self, identifier: &str) {
        self.records.remove(identifier);
        debug!("Rate limit reset for {}", identifier);
    }

    /// Drop records whose window has elapsed; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.records.len();

        self.records.retain(|_, record| {
            now.saturating_duration_since(record.window_start) <= record.window
        });

        let removed = before.saturating_sub(self.records.len());
        debug!("Cleaned up {} expired rate limit records", removed);
        removed
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.cleanup_expired();
            }
        })
    }

    /// Get statistics
    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            tracked_identifiers: self.records.len(),
            total_attempts: self.records.iter().map(|r| u64::from(r.value().count)).sum(),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limit error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded. Retry after {retry_after:?}. Limit: {limit} attempts per window")]
    LimitExceeded { retry_after: Duration, limit: u32 },
}

/// Rate limit statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStats {
    pub tracked_identifiers: usize,
    pub total_attempts: u64,
}
