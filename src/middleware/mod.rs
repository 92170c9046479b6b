//! HTTP middleware for the dashboard-facing surface.
//!
//! - **Rate Limiting**: per-IP GCRA limiting of inbound traffic. This guards
//!   the proxy itself and is independent of the outbound per-credential
//!   window enforced inside `iwinv_client`.
//! - **Request ID**: `X-Request-Id` generation and propagation, so a failed
//!   upstream call can be traced back to the dashboard request behind it.
//!
//! Authentication deliberately has no middleware here: iwinv credentials are
//! relayed, not verified locally, and handlers reject requests without the
//! credential cookies through the [`crate::credentials::Credentials`]
//! extractor.

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{RateLimitError, RateLimitLayer};
pub use request_id::RequestIdLayer;
