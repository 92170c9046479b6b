//! Health and readiness endpoints.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check with version and uptime
//! - `GET /ready` - Kubernetes-compatible readiness probe
//!
//! # Health vs Readiness
//!
//! The service holds no upstream connections of its own: every provider call
//! is signed per request with the caller's credentials. There is therefore
//! nothing remote to probe, and both endpoints report on the process alone.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// Always returns 200 OK with status details in the body.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2024-01-15T10:30:00Z",
///   "uptime_seconds": 3600
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Readiness check endpoint for Kubernetes probes.
///
/// The service is ready as soon as it is serving: credentials arrive with
/// each request, so there is no warm-up or connection phase to wait out.
///
/// # Usage
///
/// Configure in Kubernetes:
/// ```yaml
/// readinessProbe:
///   httpGet:
///     path: /ready
///     port: 3000
///   initialDelaySeconds: 5
///   periodSeconds: 10
/// ```
#[instrument]
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
