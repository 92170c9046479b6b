//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Rate Limiting   │ ← 429 if a client IP floods the proxy
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers for the dashboard
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler        ← Credentials extractor rejects cookie-less calls
//! ```
//!
//! # Route Groups
//!
//! - `/health`, `/ready` - Health & monitoring (no credentials needed)
//! - `/api/zones` - Availability zones
//! - `/api/flavors` - Compute flavors
//! - `/api/images` - OS images
//! - `/api/instances` - Instance CRUD and lifecycle actions

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{RateLimitError, RateLimitLayer, RequestIdLayer};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
///
/// # Middleware Configuration
///
/// Middleware is configured based on the application config:
///
/// - **Rate Limiting**: Enabled if `rate_limit_rps > 0`
/// - **CORS**: Configured from `cors_allowed_origins`
/// - **Body limit**: `max_request_body_size`
///
/// # Errors
///
/// Returns `RateLimitError` if rate limiting configuration is invalid.
pub fn build_router(state: AppState) -> Result<Router, RateLimitError> {
    let config = &state.config;

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    let cors = build_cors_layer(&config.cors_allowed_origins);

    // =========================================================================
    // Build Router with Routes
    // =========================================================================
    let mut router = Router::new()
        // Health endpoints (no credentials required)
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // Zones
        .route("/api/zones", get(handlers::list_zones))
        // Flavors
        .route("/api/flavors", get(handlers::list_flavors))
        .route("/api/flavors/{id}", get(handlers::get_flavor))
        // Images
        .route("/api/images", get(handlers::list_images))
        .route("/api/images/{id}", get(handlers::get_image))
        // Instances
        .route("/api/instances", get(handlers::list_instances))
        .route("/api/instances", post(handlers::create_instance))
        .route("/api/instances/{id}", get(handlers::get_instance))
        .route("/api/instances/{id}", put(handlers::update_instance))
        .route("/api/instances/{id}", delete(handlers::delete_instance))
        .route(
            "/api/instances/{id}/action",
            post(handlers::instance_action),
        );

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Request body size limit (prevents DoS via large payloads)
    info!(
        max_size_kb = config.max_request_body_size / 1024,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    // 2. CORS
    router = router.layer(cors);

    // 3. Tracing
    router = router.layer(TraceLayer::new_for_http());

    // 4. Request ID
    router = router.layer(RequestIdLayer::new());

    // 5. Inbound rate limiting (if enabled) - applied last, runs first
    if config.rate_limiting_enabled() {
        info!(
            rps = config.rate_limit_rps,
            burst = config.rate_limit_burst,
            "Inbound rate limiting enabled"
        );
        router = router.layer(RateLimitLayer::new(
            config.rate_limit_rps,
            config.rate_limit_burst,
        )?);
    } else {
        info!("Inbound rate limiting disabled (RATE_LIMIT_RPS=0)");
    }

    // Add state
    Ok(router.with_state(state))
}

/// Build CORS layer from configuration.
///
/// # Security Note
///
/// Using `*` (any origin) is convenient for development; production should
/// list the dashboard's exact origin instead.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
