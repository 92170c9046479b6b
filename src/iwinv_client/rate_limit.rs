//! Outbound rate limiting for the iwinv API.
//!
//! iwinv allows 60 requests per credential per minute, enforced here as a
//! fixed window: a counter and a window-start timestamp per access key. The
//! counter resets whenever at least one full window has elapsed, and the 61st
//! request inside a window is rejected with a wait hint before any network
//! traffic happens.
//!
//! Window state lives in a process-wide [`RateLimiterRegistry`] keyed by
//! access key, so the budget holds across concurrent dashboard requests that
//! share a credential pair. Entries are created on first use and swept out by
//! a background task after a configurable idle period (see
//! `AppState::spawn_eviction_task`).
//!
//! Time is read through the [`Clock`] trait rather than the ambient system
//! clock, so window behavior is testable without real minutes passing.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{AppError, AppResult};

/// Time source for signing timestamps and window accounting.
///
/// Production code uses [`SystemClock`]; tests use [`ManualClock`] and advance
/// it explicitly.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Time elapsed since the Unix epoch.
    fn now(&self) -> Duration;

    /// Current time as whole seconds since the Unix epoch.
    fn unix_seconds(&self) -> u64 {
        self.now().as_secs()
    }
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        // A system clock before the epoch is not meaningfully recoverable;
        // saturate to zero rather than propagate.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}

/// Manually advanced time source for tests.
///
/// Starts at the given offset from the epoch and only moves when told to,
/// so window-reset and eviction behavior can be exercised without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock fixed at the given offset from the epoch.
    pub fn new(start: Duration) -> Self {
        Self {
            millis: AtomicU64::new(u64::try_from(start.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Per-key window accounting.
#[derive(Debug, Clone)]
struct WindowState {
    /// Requests consumed in the current window.
    count: u32,
    /// When the current window opened (offset from the epoch).
    window_start: Duration,
    /// Last time this key was touched, for idle eviction.
    last_seen: Duration,
}

/// Process-wide fixed-window limiter, keyed by access key.
///
/// Each key owns an independent window; exhausting one credential's budget
/// never affects another. All accounting for one call happens under a single
/// short-lived lock, so the counter can never race past the ceiling.
#[derive(Debug)]
pub struct RateLimiterRegistry {
    /// Requests allowed per window. The Nth request is the last accepted one.
    max_requests: u32,
    /// Window length; elapsed >= window triggers a reset.
    window: Duration,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiterRegistry {
    /// Create a registry enforcing `max_requests` per `window` for each key.
    pub fn new(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Consume one request slot for `access_key`, or fail with a wait hint.
    ///
    /// Fixed-window semantics:
    ///
    /// 1. If a full window has elapsed since `window_start`, reset the counter
    ///    and open a new window at "now".
    /// 2. If the counter has reached the ceiling, fail with the number of
    ///    whole seconds until the window reopens (`ceil` of the remainder).
    /// 3. Otherwise count the request and succeed.
    ///
    /// The ceiling request itself is accepted; only the request after it
    /// fails. No network traffic happens on the failure path.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RateLimited`] carrying the wait hint in seconds.
    pub fn check_and_consume(&self, access_key: &str) -> AppResult<()> {
        let now = self.clock.now();
        let mut windows = self.lock_windows();

        let entry = windows
            .entry(access_key.to_string())
            .or_insert_with(|| WindowState {
                count: 0,
                window_start: now,
                last_seen: now,
            });
        entry.last_seen = now;

        if now.saturating_sub(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            let remaining = self
                .window
                .saturating_sub(now.saturating_sub(entry.window_start));
            let wait_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(AppError::RateLimited { wait_secs });
        }

        entry.count += 1;
        Ok(())
    }

    /// Requests consumed in the current window for `access_key`.
    ///
    /// Returns zero for unknown keys and for keys whose window has lapsed.
    pub fn current_count(&self, access_key: &str) -> u32 {
        let now = self.clock.now();
        let windows = self.lock_windows();

        match windows.get(access_key) {
            Some(entry) if now.saturating_sub(entry.window_start) < self.window => entry.count,
            _ => 0,
        }
    }

    /// Drop every key that has been idle for at least `idle_for`.
    ///
    /// Returns the number of evicted entries. A key touched within the idle
    /// period always survives, even mid-window.
    pub fn evict_idle(&self, idle_for: Duration) -> usize {
        let now = self.clock.now();
        let mut windows = self.lock_windows();

        let before = windows.len();
        windows.retain(|_, entry| now.saturating_sub(entry.last_seen) < idle_for);
        before - windows.len()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.lock_windows().len()
    }

    /// Configured per-window ceiling.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Configured window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock_windows(&self) -> MutexGuard<'_, HashMap<String, WindowState>> {
        // Window accounting cannot leave the map in an inconsistent state, so
        // a poisoned lock is safe to recover.
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn registry_at_epoch(max_requests: u32) -> (Arc<ManualClock>, RateLimiterRegistry) {
        let clock = Arc::new(ManualClock::new(Duration::from_secs(1_700_000_000)));
        let registry = RateLimiterRegistry::new(max_requests, Duration::from_secs(60), clock.clone());
        (clock, registry)
    }

    #[test]
    fn test_ceiling_request_accepted_next_rejected() {
        let (_clock, registry) = registry_at_epoch(60);

        for i in 1..=60 {
            assert!(
                registry.check_and_consume("alice").is_ok(),
                "request {i} should be within the window budget"
            );
        }

        let err = registry.check_and_consume("alice").unwrap_err();
        match err {
            AppError::RateLimited { wait_secs } => assert_eq!(wait_secs, 60),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn test_wait_hint_rounds_up_to_whole_seconds() {
        let (clock, registry) = registry_at_epoch(1);

        registry.check_and_consume("alice").unwrap();
        clock.advance(Duration::from_millis(30_500));

        let err = registry.check_and_consume("alice").unwrap_err();
        match err {
            // 29.5s remain in the window; the hint rounds up.
            AppError::RateLimited { wait_secs } => assert_eq!(wait_secs, 30),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn test_window_resets_after_full_minute() {
        let (clock, registry) = registry_at_epoch(60);

        for _ in 0..60 {
            registry.check_and_consume("alice").unwrap();
        }
        assert!(registry.check_and_consume("alice").is_err());

        clock.advance(Duration::from_secs(60));

        assert!(registry.check_and_consume("alice").is_ok());
        assert_eq!(registry.current_count("alice"), 1);
    }

    #[test]
    fn test_partial_elapse_does_not_reset() {
        let (clock, registry) = registry_at_epoch(2);

        registry.check_and_consume("alice").unwrap();
        registry.check_and_consume("alice").unwrap();
        clock.advance(Duration::from_secs(59));

        assert!(registry.check_and_consume("alice").is_err());

        clock.advance(Duration::from_secs(1));
        assert!(registry.check_and_consume("alice").is_ok());
    }

    #[test]
    fn test_keys_are_isolated() {
        let (_clock, registry) = registry_at_epoch(2);

        registry.check_and_consume("alice").unwrap();
        registry.check_and_consume("alice").unwrap();
        assert!(registry.check_and_consume("alice").is_err());

        assert!(registry.check_and_consume("bob").is_ok());
        assert_eq!(registry.current_count("bob"), 1);
        assert_eq!(registry.current_count("alice"), 2);
    }

    #[test]
    fn test_current_count_for_unknown_key_is_zero() {
        let (_clock, registry) = registry_at_epoch(60);
        assert_eq!(registry.current_count("nobody"), 0);
    }

    #[test]
    fn test_idle_keys_are_evicted() {
        let (clock, registry) = registry_at_epoch(60);

        registry.check_and_consume("alice").unwrap();
        assert_eq!(registry.tracked_keys(), 1);

        clock.advance(Duration::from_secs(601));
        let evicted = registry.evict_idle(Duration::from_secs(600));

        assert_eq!(evicted, 1);
        assert_eq!(registry.tracked_keys(), 0);

        // A fresh window opens transparently on next use.
        assert!(registry.check_and_consume("alice").is_ok());
        assert_eq!(registry.current_count("alice"), 1);
    }

    #[test]
    fn test_recently_seen_keys_survive_eviction() {
        let (clock, registry) = registry_at_epoch(60);

        registry.check_and_consume("alice").unwrap();
        clock.advance(Duration::from_secs(590));
        registry.check_and_consume("bob").unwrap();

        let evicted = registry.evict_idle(Duration::from_secs(600));
        assert_eq!(evicted, 0);

        clock.advance(Duration::from_secs(11));
        let evicted = registry.evict_idle(Duration::from_secs(600));
        assert_eq!(evicted, 1);
        assert_eq!(registry.tracked_keys(), 1);
        assert_eq!(registry.current_count("bob"), 1);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(Duration::from_secs(100));
        assert_eq!(clock.unix_seconds(), 100);

        clock.advance(Duration::from_millis(1_500));
        assert_eq!(clock.now(), Duration::from_millis(101_500));
    }

    #[test]
    fn test_system_clock_is_past_2020() {
        let clock = SystemClock;
        assert!(clock.unix_seconds() > 1_577_836_800);
    }
}
