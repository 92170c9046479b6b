//! Prometheus metrics for application observability.
//!
//! This module provides Prometheus-compatible metrics for monitoring the application.
//! Metrics are exposed via a dedicated HTTP endpoint (default: `/metrics`).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `iwinv_http_requests_total` - Inbound dashboard requests (with labels: method, status)
//! - `iwinv_upstream_requests_total` - Upstream API calls (with labels: method, outcome)
//! - `iwinv_rate_limited_total` - Calls rejected locally because a key's window was full
//! - `iwinv_limiter_evictions_total` - Idle quota windows removed by the background sweep
//!
//! ## Histograms
//! - `iwinv_upstream_duration_seconds` - Upstream call duration (with label: method)
//!
//! ## Gauges
//! - `iwinv_tracked_credentials` - Access keys with a live quota window
//!
//! # Usage
//!
//! ```rust,ignore
//! use iwinv_console::metrics::{init_metrics, record_upstream_request};
//!
//! // Initialize metrics (call once at startup)
//! init_metrics(addr)?;
//!
//! // Record metrics in the dispatcher
//! record_upstream_request("GET", "success");
//! ```

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "iwinv_http_requests_total";
    pub const UPSTREAM_REQUESTS_TOTAL: &str = "iwinv_upstream_requests_total";
    pub const RATE_LIMITED_TOTAL: &str = "iwinv_rate_limited_total";
    pub const LIMITER_EVICTIONS_TOTAL: &str = "iwinv_limiter_evictions_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "iwinv_upstream_duration_seconds";
    pub const TRACKED_CREDENTIALS: &str = "iwinv_tracked_credentials";
}

/// Outcome labels for upstream calls.
pub mod outcomes {
    pub const SUCCESS: &str = "success";
    pub const API_ERROR: &str = "api_error";
    pub const HTTP_ERROR: &str = "http_error";
    pub const NETWORK_ERROR: &str = "network_error";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Initialize the Prometheus metrics exporter.
///
/// This sets up metric descriptions and starts the Prometheus HTTP listener
/// on the specified address (default: 0.0.0.0:9090).
///
/// # Arguments
///
/// * `metrics_addr` - Address for the Prometheus metrics endpoint
///
/// # Returns
///
/// `Ok(())` if initialization succeeds, `Err` with message otherwise.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    // Set up Prometheus exporter
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    // Describe all metrics
    describe_counter!(
        names::HTTP_REQUESTS_TOTAL,
        "Total number of inbound dashboard requests"
    );
    describe_counter!(
        names::UPSTREAM_REQUESTS_TOTAL,
        "Total number of calls dispatched to the iwinv API"
    );
    describe_counter!(
        names::RATE_LIMITED_TOTAL,
        "Total number of calls rejected locally because the per-key window was full"
    );
    describe_counter!(
        names::LIMITER_EVICTIONS_TOTAL,
        "Total number of idle quota windows evicted"
    );

    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Upstream call duration in seconds"
    );

    describe_gauge!(
        names::TRACKED_CREDENTIALS,
        "Number of access keys currently holding a quota window"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
///
/// This is useful for cases where metrics are optional.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

// =============================================================================
// Counter Recording Functions
// =============================================================================

/// Record an inbound dashboard request and the status it was answered with.
pub fn record_http_request(method: &str, status: u16) {
    counter!(names::HTTP_REQUESTS_TOTAL, "method" => method.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record an upstream call and its outcome.
pub fn record_upstream_request(method: &str, outcome: &str) {
    counter!(names::UPSTREAM_REQUESTS_TOTAL, "method" => method.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

/// Record a call rejected by the local quota window.
pub fn record_rate_limited() {
    counter!(names::RATE_LIMITED_TOTAL).increment(1);
}

/// Record quota windows removed by an eviction sweep.
pub fn record_evictions(count: u64) {
    counter!(names::LIMITER_EVICTIONS_TOTAL).increment(count);
}

// =============================================================================
// Histogram Recording Functions
// =============================================================================

/// Record upstream call duration.
pub fn record_upstream_duration(method: &str, duration_secs: f64) {
    histogram!(names::UPSTREAM_DURATION_SECONDS, "method" => method.to_string())
        .record(duration_secs);
}

// =============================================================================
// Gauge Recording Functions
// =============================================================================

/// Update the tracked-credentials gauge after a sweep.
pub fn set_tracked_credentials(count: usize) {
    gauge!(names::TRACKED_CREDENTIALS).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests verify the functions don't panic.
    // Full metrics testing requires integration tests with a Prometheus scraper.

    #[test]
    fn test_record_upstream_request() {
        // Should not panic even without metrics initialized
        record_upstream_request("GET", outcomes::SUCCESS);
    }

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", 200);
        record_http_request("POST", 429);
    }

    #[test]
    fn test_record_rate_limited() {
        record_rate_limited();
    }

    #[test]
    fn test_record_evictions() {
        record_evictions(3);
    }

    #[test]
    fn test_record_upstream_duration() {
        record_upstream_duration("POST", 0.1);
    }

    #[test]
    fn test_set_tracked_credentials() {
        set_tracked_credentials(0);
        set_tracked_credentials(12);
    }
}
