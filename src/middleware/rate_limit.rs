//! Inbound per-IP rate limiting.
//!
//! Protects this service itself from a single noisy client; it is unrelated
//! to the outbound per-credential window in `iwinv_client::rate_limit`, which
//! mirrors the provider's quota. This layer uses the Governor crate's GCRA
//! ("leaky bucket as a meter"):
//!
//! - Smooth per-IP limiting with burst capacity above the sustained rate
//! - Memory efficient keyed state with automatic cleanup
//! - Thread-safe
//!
//! # Configuration
//!
//! - `rate_limit_rps`: sustained requests per second per IP (0 disables)
//! - `rate_limit_burst`: additional burst capacity above RPS
//!
//! # Response Headers
//!
//! On rate limit exceeded (429):
//! - `Retry-After`: seconds until the next request will be accepted
//! - `X-RateLimit-Limit`: configured RPS limit
//! - `X-RateLimit-Remaining`: remaining requests in the current window
//!
//! The client IP is taken from `X-Forwarded-For` / `X-Real-Ip` when present
//! (this service is expected to run behind the dashboard's reverse proxy,
//! which owns client-IP correctness), falling back to the socket address.

use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tower::{Layer, Service};
use tracing::warn;

/// Error type for rate limit layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// RPS value cannot be zero.
    ZeroRps,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::ZeroRps => {
                write!(
                    f,
                    "RPS must be greater than 0; leave the layer off for no limiting"
                )
            }
        }
    }
}

impl std::error::Error for RateLimitError {}

/// Type alias for the per-IP rate limiter.
///
/// Uses `String` keys (IP addresses) with the default DashMap-based state store.
type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Fallback key when no client IP can be determined.
const UNKNOWN_IP: &str = "unknown";

/// Rate limiting layer for the Tower middleware stack.
///
/// # Example
///
/// ```rust,ignore
/// let layer = RateLimitLayer::new(100, 50)?; // 100 RPS per IP, 50 burst
/// let app = Router::new()
///     .route("/api/zones", get(handler))
///     .layer(layer);
/// ```
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<KeyedLimiter>,
    /// Configured RPS limit (for headers)
    limit: u32,
}

impl RateLimitLayer {
    /// Create a new per-IP rate limit layer.
    ///
    /// # Arguments
    ///
    /// * `rps` - Requests per second limit per IP (sustained rate)
    /// * `burst` - Additional burst capacity per IP
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::ZeroRps` if `rps` is 0; config-gate the layer
    /// instead of constructing it with a zero limit.
    pub fn new(rps: u32, burst: u32) -> Result<Self, RateLimitError> {
        let rps_nonzero = NonZeroU32::new(rps).ok_or(RateLimitError::ZeroRps)?;

        // A burst of 0 makes Quota unconstructible; clamp to 1
        const MIN_BURST: NonZeroU32 = NonZeroU32::new(1).unwrap();
        let burst_nonzero = NonZeroU32::new(burst).unwrap_or(MIN_BURST);

        // Quota: burst capacity refilled at `rps` per second
        let quota = Quota::per_second(rps_nonzero).allow_burst(burst_nonzero);
        let limiter = RateLimiter::keyed(quota);

        Ok(Self {
            limiter: Arc::new(limiter),
            limit: rps,
        })
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            limit: self.limit,
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<KeyedLimiter>,
    limit: u32,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let limit = self.limit;
        let mut inner = self.inner.clone();

        let client_ip = extract_client_ip(&req);

        Box::pin(async move {
            match limiter.check_key(&client_ip) {
                Ok(_) => inner.call(req).await,
                Err(not_until) => {
                    let path = req.uri().path();
                    let wait_time =
                        not_until.wait_time_from(governor::clock::DefaultClock::default().now());
                    let retry_after = wait_time.as_secs().max(1);

                    warn!(
                        client_ip = %client_ip,
                        path = %path,
                        retry_after_secs = retry_after,
                        "Inbound rate limit exceeded for IP"
                    );

                    let response = (
                        StatusCode::TOO_MANY_REQUESTS,
                        [
                            ("Retry-After", retry_after.to_string()),
                            ("X-RateLimit-Limit", limit.to_string()),
                            ("X-RateLimit-Remaining", "0".to_string()),
                        ],
                        "Rate limit exceeded. Please retry later.",
                    )
                        .into_response();

                    Ok(response)
                }
            }
        })
    }
}

/// Determine the limiter key for a request.
///
/// Proxy headers win over the socket address; the first entry in
/// `X-Forwarded-For` is the original client when the proxy chain is honest.
fn extract_client_ip<B>(req: &Request<B>) -> String {
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && !value.is_empty()
    {
        return value.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_IP.to_string(), |info| info.0.ip().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_layer_creation() {
        let layer = RateLimitLayer::new(100, 50).unwrap();
        assert_eq!(layer.limit, 100);
    }

    #[test]
    fn test_rate_limit_zero_rps_returns_error() {
        let result = RateLimitLayer::new(0, 50);
        assert!(matches!(result, Err(RateLimitError::ZeroRps)));
    }

    #[test]
    fn test_rate_limit_zero_burst_is_clamped() {
        assert!(RateLimitLayer::new(10, 0).is_ok());
    }

    #[test]
    fn test_extract_ip_from_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "203.0.113.7");
    }

    #[test]
    fn test_extract_ip_from_real_ip() {
        let req = Request::builder()
            .header("x-real-ip", "203.0.113.9")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn test_extract_ip_falls_back_to_unknown() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_client_ip(&req), UNKNOWN_IP);
    }

    #[test]
    fn test_forwarded_for_wins_over_real_ip() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .header("x-real-ip", "203.0.113.9")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "203.0.113.7");
    }
}
