//! # iwinv Console Backend
//!
//! An Axum service backing a browser-based administrative dashboard for the
//! iwinv cloud API (instances, images, flavors, zones), featuring:
//!
//! - **Signed dispatch**: per-request HMAC-SHA256 signing of upstream calls
//! - **Quota enforcement**: per-access-key fixed-window rate limiting,
//!   applied before any network traffic
//! - **Credential relay**: key pairs arrive as cookies, are used once, and
//!   are never persisted or logged
//! - **Observability**: request IDs, structured logging, Prometheus metrics,
//!   health endpoints
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Rate Limit → Request ID → Trace → CORS)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, zones, flavors, images, instances)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IwinvClient (limiter check → sign → dispatch → envelope)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  iwinv REST API (https://api-kr.iwinv.kr)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iwinv_console::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     let app = build_router(state)?;
//!
//!     // Start the server...
//!     Ok(())
//! }
//! ```
//!
//! ## Credentials
//!
//! The dashboard stores the iwinv key pair in two cookies and sends them with
//! every request:
//!
//! ```bash
//! curl -b "accessKey=AK...; secretKey=SK..." http://localhost:3000/api/zones
//! ```
//!
//! Requests without both cookies are rejected with 401 before any upstream
//! work happens.

pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod iwinv_client;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use credentials::Credentials;
pub use error::{AppError, AppResult};
pub use iwinv_client::{ApiRequest, IwinvClient};
pub use routes::build_router;
pub use state::AppState;
