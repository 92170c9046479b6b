//! Shared application state for Axum handlers.
//!
//! This module provides thread-safe, clonable state that is shared across
//! all request handlers. It includes:
//!
//! - **HTTP client**: One connection pool reused by every upstream call
//! - **Quota registry**: Per-access-key windows shared process-wide
//! - **Clock**: The single time source for signing and window arithmetic
//! - **Configuration**: Runtime configuration access
//!
//! # Thread Safety
//!
//! All state components are wrapped in `Arc` or use interior mutability
//! patterns that are safe for concurrent access from multiple handlers.
//!
//! # Structured Concurrency
//!
//! Background tasks are managed using `tokio_util::task::TaskTracker` and
//! `CancellationToken` for proper lifecycle management. Call `shutdown()`
//! to gracefully stop all background tasks before application exit.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::AppResult;
use crate::iwinv_client::{Clock, IwinvClient, RateLimiterRegistry, SystemClock, build_http_client};
use crate::metrics;

/// Shared application state for Axum handlers.
///
/// This struct is cloned for each request handler. All internal data
/// is wrapped in `Arc` for efficient sharing.
///
/// # Lifecycle
///
/// A background eviction task is spawned when the state is created. Call
/// `shutdown()` before dropping to ensure clean task termination:
///
/// ```rust,ignore
/// let state = AppState::new(config)?;
/// // ... use state ...
/// state.shutdown().await;  // Wait for background tasks to complete
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Shared HTTP connection pool for upstream calls
    pub http: reqwest::Client,
    /// Per-access-key quota registry, shared process-wide
    pub limiters: Arc<RateLimiterRegistry>,
    /// Time source for signing timestamps and window arithmetic
    pub clock: Arc<dyn Clock>,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Application configuration
    pub config: Arc<Config>,
    /// Tracks spawned background tasks for graceful shutdown
    task_tracker: TaskTracker,
    /// Cancellation token for signaling background tasks to stop
    cancellation_token: CancellationToken,
}

impl AppState {
    /// Create new application state from configuration.
    ///
    /// # Background Tasks
    ///
    /// When eviction is enabled, this spawns a task that periodically drops
    /// quota windows for access keys that have gone idle, so the registry
    /// does not grow with every credential pair ever seen. Call `shutdown()`
    /// to gracefully terminate background tasks.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the HTTP client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_clock(config, clock)
    }

    /// Create state with an explicit clock (used by tests to control time).
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let http = build_http_client(&config)?;
        let limiters = Arc::new(RateLimiterRegistry::new(
            config.window_max_requests,
            config.window_length,
            Arc::clone(&clock),
        ));
        let config = Arc::new(config);
        let task_tracker = TaskTracker::new();
        let cancellation_token = CancellationToken::new();

        let state = Self {
            http,
            limiters,
            clock,
            started_at: Instant::now(),
            config,
            task_tracker,
            cancellation_token,
        };

        // Spawn background tasks
        if state.config.eviction_enabled() {
            state.spawn_eviction_task();
        }

        Ok(state)
    }

    /// Build a dispatcher for the credentials carried by one request.
    ///
    /// All heavy state is shared; this only binds the key pair to it.
    pub fn client_for(&self, credentials: Credentials) -> IwinvClient {
        IwinvClient::new(
            credentials,
            self.http.clone(),
            Arc::clone(&self.limiters),
            Arc::clone(&self.clock),
            Arc::clone(&self.config),
        )
    }

    /// Spawn the background quota-window eviction task.
    ///
    /// The task is tracked by `task_tracker` and respects `cancellation_token`
    /// for graceful shutdown.
    ///
    /// # Implementation Note
    ///
    /// The task holds only the registry and the two durations it needs
    /// rather than the entire AppState.
    fn spawn_eviction_task(&self) {
        let limiters = Arc::clone(&self.limiters);
        let idle_timeout = self.config.limiter_idle_timeout;
        let sweep_interval = self.config.limiter_sweep_interval;
        let cancel = self.cancellation_token.clone();

        self.task_tracker.spawn(async move {
            let mut ticker = interval(sweep_interval);
            ticker.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    biased; // Check cancellation first

                    _ = cancel.cancelled() => {
                        debug!("Eviction task received cancellation signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = limiters.evict_idle(idle_timeout);
                        if evicted > 0 {
                            debug!(evicted, "Evicted idle quota windows");
                            metrics::record_evictions(evicted as u64);
                        }
                        metrics::set_tracked_credentials(limiters.tracked_keys());
                    }
                }
            }

            debug!("Eviction task shutting down");
        });
    }

    /// Gracefully shutdown all background tasks.
    ///
    /// This method:
    /// 1. Signals all tasks to stop via cancellation token
    /// 2. Closes the task tracker (prevents new tasks)
    /// 3. Waits for all tasks to complete
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// // In main.rs shutdown handler:
    /// state.shutdown().await;
    /// ```
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown of background tasks");

        // Signal all tasks to stop
        self.cancellation_token.cancel();

        // Close the tracker - no new tasks can be spawned
        self.task_tracker.close();

        // Wait for all tasks to complete
        self.task_tracker.wait().await;

        info!("All background tasks have completed");
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
