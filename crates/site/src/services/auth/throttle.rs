//! Login throttling.
//!
//! Failed logins are counted per `client:id` key. After
//! [`ThrottleSettings::max_failures`] failures the key is blocked for
//! [`ThrottleSettings::block_for`]; a success clears the key.
//!
//! [`MemoryLoginThrottle`] keeps counters in process memory, so they are lost
//! on restart and not shared between replicas. The number of tracked keys is
//! bounded; call [`LoginThrottle::sweep`] periodically to drop expired ones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;

/// Default number of failures before a key is blocked.
pub const DEFAULT_MAX_FAILURES: u32 = 5;
/// Default block window in minutes.
pub const DEFAULT_BLOCK_MINUTES: i64 = 10;
/// Default bound on tracked keys.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Build the throttle key for a client address and submitted login id.
#[must_use]
pub fn throttle_key(client: &str, id: &str) -> String {
    format!("{client}:{id}")
}

/// Throttle configuration.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleSettings {
    /// Failures that trigger a block.
    pub max_failures: u32,
    /// How long a block lasts. Also the window after which an idle counter
    /// is forgotten.
    pub block_for: Duration,
    /// Maximum number of tracked keys.
    pub max_entries: usize,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
            block_for: Duration::minutes(DEFAULT_BLOCK_MINUTES),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Tracks failed logins and blocks abusive clients.
#[async_trait]
pub trait LoginThrottle: Send + Sync {
    /// Whether `key` is currently blocked. Expired blocks are cleared.
    async fn is_blocked(&self, key: &str) -> bool;

    /// Count a failed attempt, blocking the key once the limit is reached.
    async fn record_failure(&self, key: &str);

    /// Forget `key` after a successful login.
    async fn record_success(&self, key: &str);

    /// Drop expired blocks and idle counters. Returns how many were removed.
    async fn sweep(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Attempts {
    fails: u32,
    blocked_until: Option<DateTime<Utc>>,
    last_failure: DateTime<Utc>,
}

impl Attempts {
    fn is_expired(&self, now: DateTime<Utc>, block_for: Duration) -> bool {
        match self.blocked_until {
            Some(until) => until <= now,
            None => now - self.last_failure >= block_for,
        }
    }
}

/// Process-local, bounded login throttle.
pub struct MemoryLoginThrottle {
    settings: ThrottleSettings,
    clock: Arc<dyn Clock>,
    attempts: Mutex<HashMap<String, Attempts>>,
}

impl std::fmt::Debug for MemoryLoginThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLoginThrottle")
            .field("settings", &self.settings)
            .field("tracked", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl MemoryLoginThrottle {
    /// Create a throttle.
    #[must_use]
    pub fn new(settings: ThrottleSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Attempts>> {
        // Counters stay usable after a panicking holder; worst case a count is off by one.
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep_locked(&self, map: &mut HashMap<String, Attempts>, now: DateTime<Utc>) -> usize {
        let before = map.len();
        map.retain(|_, a| !a.is_expired(now, self.settings.block_for));
        before - map.len()
    }
}

#[async_trait]
impl LoginThrottle for MemoryLoginThrottle {
    async fn is_blocked(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut map = self.lock();
        match map.get(key).and_then(|a| a.blocked_until) {
            Some(until) if until > now => true,
            Some(_) => {
                map.remove(key);
                false
            }
            None => false,
        }
    }

    async fn record_failure(&self, key: &str) {
        let now = self.clock.now();
        let block_for = self.settings.block_for;
        let mut map = self.lock();

        if map.get(key).is_some_and(|a| a.is_expired(now, block_for)) {
            map.remove(key);
        }

        if !map.contains_key(key) && map.len() >= self.settings.max_entries {
            self.sweep_locked(&mut map, now);
            if map.len() >= self.settings.max_entries {
                let oldest = map
                    .iter()
                    .min_by_key(|(_, a)| a.last_failure)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    map.remove(&oldest);
                }
            }
        }

        let attempts = map.entry(key.to_owned()).or_insert(Attempts {
            fails: 0,
            blocked_until: None,
            last_failure: now,
        });
        attempts.fails += 1;
        attempts.last_failure = now;
        if attempts.fails >= self.settings.max_failures && attempts.blocked_until.is_none() {
            attempts.blocked_until = Some(now + block_for);
            tracing::warn!(
                failures = attempts.fails,
                block_minutes = block_for.num_minutes(),
                "Login blocked after repeated failures"
            );
        }
    }

    async fn record_success(&self, key: &str) {
        self.lock().remove(key);
    }

    async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.lock();
        self.sweep_locked(&mut map, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn throttle(max_entries: usize) -> (MemoryLoginThrottle, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let settings = ThrottleSettings {
            max_entries,
            ..ThrottleSettings::default()
        };
        (MemoryLoginThrottle::new(settings, clock.clone()), clock)
    }

    #[test]
    fn test_throttle_key() {
        assert_eq!(throttle_key("203.0.113.9", "root"), "203.0.113.9:root");
    }

    #[tokio::test]
    async fn test_blocks_after_five_failures() {
        let (t, _) = throttle(100);
        for _ in 0..4 {
            t.record_failure("c:root").await;
        }
        assert!(!t.is_blocked("c:root").await);

        t.record_failure("c:root").await;
        assert!(t.is_blocked("c:root").await);
        assert!(!t.is_blocked("c:editor").await);
        assert!(!t.is_blocked("other:root").await);
    }

    #[tokio::test]
    async fn test_block_expires_and_counter_resets() {
        let (t, clock) = throttle(100);
        for _ in 0..5 {
            t.record_failure("k").await;
        }

        clock.advance(Duration::minutes(9));
        assert!(t.is_blocked("k").await);

        clock.advance(Duration::minutes(1) + Duration::seconds(1));
        assert!(!t.is_blocked("k").await);
        assert_eq!(t.tracked(), 0);

        t.record_failure("k").await;
        assert!(!t.is_blocked("k").await);
    }

    #[tokio::test]
    async fn test_success_clears_counter() {
        let (t, _) = throttle(100);
        for _ in 0..4 {
            t.record_failure("k").await;
        }
        t.record_success("k").await;
        t.record_failure("k").await;
        assert!(!t.is_blocked("k").await);
    }

    #[tokio::test]
    async fn test_idle_counter_is_forgotten() {
        let (t, clock) = throttle(100);
        for _ in 0..4 {
            t.record_failure("k").await;
        }
        clock.advance(Duration::minutes(11));
        t.record_failure("k").await;
        assert!(!t.is_blocked("k").await);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let (t, clock) = throttle(100);
        t.record_failure("idle").await;
        for _ in 0..5 {
            t.record_failure("blocked").await;
        }
        assert_eq!(t.tracked(), 2);

        clock.advance(Duration::minutes(5));
        assert_eq!(t.sweep().await, 0);

        clock.advance(Duration::minutes(6));
        assert_eq!(t.sweep().await, 2);
        assert_eq!(t.tracked(), 0);
    }

    #[tokio::test]
    async fn test_bounded_evicts_oldest() {
        let (t, clock) = throttle(2);
        t.record_failure("first").await;
        clock.advance(Duration::seconds(1));
        t.record_failure("second").await;
        clock.advance(Duration::seconds(1));
        t.record_failure("third").await;

        assert_eq!(t.tracked(), 2);
        for _ in 0..4 {
            t.record_failure("second").await;
        }
        assert!(t.is_blocked("second").await);
    }
}
