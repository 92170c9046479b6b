//! Signed, rate-limited client for the iwinv REST API.
//!
//! Every browser request that needs provider data gets its own short-lived
//! dispatcher built from the credentials on that request. The heavyweight
//! pieces (connection pool, quota registry, clock) live in shared state and
//! are only borrowed here, so constructing a dispatcher is cheap.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       IwinvClient                           │
//! │  ┌──────────────────┐  ┌─────────────────────────────────┐  │
//! │  │ Per request      │  │ Shared                          │  │
//! │  │ - credentials    │  │ - reqwest::Client (pool)        │  │
//! │  │                  │  │ - RateLimiterRegistry (quotas)  │  │
//! │  │                  │  │ - Clock (timestamps, windows)   │  │
//! │  └──────────────────┘  └─────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - `signer` - HMAC-SHA256 request signing and auth headers
//! - `rate_limit` - Per-access-key fixed-window quota registry
//! - `params` - The `ApiRequest` call descriptor
//!
//! # Dispatch Order
//!
//! The quota is consumed before anything touches the network: a request
//! rejected for quota reasons never counts against the provider, never signs
//! anything, and fails in microseconds. There are no retries; the caller
//! decides whether to try again.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = state.client_for(credentials);
//! let zones = client.list_zones().await?;
//! ```

mod params;
mod rate_limit;
mod signer;

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{
    CreateInstanceRequest, Envelope, EnvelopeOutcome, ErrorBody, Flavor, Image, Instance,
    InstanceAction, RawEnvelope, Zone,
};

// Re-exports for public API
pub use params::ApiRequest;
pub use rate_limit::{Clock, ManualClock, RateLimiterRegistry, SystemClock};
pub use signer::{HEADER_CREDENTIAL, HEADER_SIGNATURE, HEADER_TIMESTAMP, build_headers, sign};

// =============================================================================
// Constants
// =============================================================================

/// User agent sent with every upstream call.
const USER_AGENT: &str = concat!("iwinv-console/", env!("CARGO_PKG_VERSION"));

/// Fallback failure message when the provider's envelope carries none.
const FALLBACK_FAILURE_MESSAGE: &str = "API request failed";

// =============================================================================
// HTTP Client Construction
// =============================================================================

/// Build the shared HTTP client used by every dispatcher.
///
/// Redirects are disabled: a redirect would change the request path after
/// signing, so following one silently would only ever produce a signature
/// mismatch at the new location.
///
/// # Errors
///
/// Returns `AppError::ConfigError` if the client cannot be constructed from
/// the configured values.
pub fn build_http_client(config: &Config) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

// =============================================================================
// IwinvClient
// =============================================================================

/// A dispatcher for signed iwinv API calls under one credential pair.
///
/// Cheap to construct per request; all heavy state is shared behind `Arc`.
/// Thread-safe and fine to clone.
#[derive(Clone)]
pub struct IwinvClient {
    /// The key pair this dispatcher signs with
    credentials: Credentials,
    /// Shared HTTP connection pool
    http: reqwest::Client,
    /// Shared per-access-key quota registry
    limiters: Arc<RateLimiterRegistry>,
    /// Time source for signing timestamps
    clock: Arc<dyn Clock>,
    /// Application configuration
    config: Arc<Config>,
}

impl IwinvClient {
    /// Create a dispatcher for one credential pair.
    pub fn new(
        credentials: Credentials,
        http: reqwest::Client,
        limiters: Arc<RateLimiterRegistry>,
        clock: Arc<dyn Clock>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            credentials,
            http,
            limiters,
            clock,
            config,
        }
    }

    /// The access key this dispatcher signs with.
    pub fn access_key(&self) -> &str {
        &self.credentials.access_key
    }

    // =========================================================================
    // Core Dispatch
    // =========================================================================

    /// Dispatch one signed call and decode the provider's envelope.
    ///
    /// Checks the local quota window first, then signs and sends. A 2xx
    /// answer whose envelope reports a non-success `error_code` still fails:
    /// transport success and API success are judged separately.
    ///
    /// # Errors
    ///
    /// - `AppError::RateLimited` - the quota window is full; nothing was sent
    /// - `AppError::Http` - non-2xx status; carries the remote message when
    ///   the body held one
    /// - `AppError::Api` - 2xx but the envelope reported a failure
    /// - `AppError::Network` - the call never completed (DNS, connect, timeout)
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request<T>(&self, request: ApiRequest) -> AppResult<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        // Quota first: a rejected call must never reach the wire
        if let Err(e) = self.limiters.check_and_consume(&self.credentials.access_key) {
            metrics::record_rate_limited();
            return Err(e);
        }

        let method = request.method.as_str().to_string();
        let started = Instant::now();

        let result = self.dispatch(request).await;

        metrics::record_upstream_duration(&method, started.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(_) => metrics::outcomes::SUCCESS,
            Err(AppError::Api { .. }) => metrics::outcomes::API_ERROR,
            Err(AppError::Http { .. }) => metrics::outcomes::HTTP_ERROR,
            Err(AppError::Network(_)) => metrics::outcomes::NETWORK_ERROR,
            Err(_) => metrics::outcomes::INTERNAL_ERROR,
        };
        metrics::record_upstream_request(&method, outcome);

        result
    }

    /// Sign, send, and decode a single call. Quota already consumed.
    async fn dispatch<T>(&self, request: ApiRequest) -> AppResult<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let timestamp = self.clock.unix_seconds();
        let headers = build_headers(
            &self.credentials.access_key,
            &self.credentials.secret_key,
            &request.path,
            timestamp,
        )?;

        // The signature covers the bare path; query parameters ride along
        // unsigned, exactly as the provider expects
        let url = format!("{}{}", self.config.api_base_url, request.path);

        if self.config.debug_upstream_logging {
            debug!(
                method = %request.method,
                url = %url,
                query = ?request.query,
                has_body = request.body.is_some(),
                "Dispatching upstream request"
            );
        }

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        // Bodyless calls (start, shutdown, every GET/DELETE) carry no payload
        // at all, not an empty JSON object
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if self.config.debug_upstream_logging {
            debug!(status = status.as_u16(), "Upstream response received");
        }

        if !status.is_success() {
            return Err(remote_failure(status.as_u16(), response).await);
        }

        let raw: RawEnvelope = response.json().await?;
        match raw.resolve::<T>().map_err(|e| {
            AppError::Internal(format!("Unexpected response shape from the iwinv API: {e}"))
        })? {
            EnvelopeOutcome::Success(envelope) => Ok(envelope),
            EnvelopeOutcome::Failure(remote) => {
                warn!(code = %remote.code, "Upstream envelope reported failure");
                let message = if remote.message.is_empty() {
                    FALLBACK_FAILURE_MESSAGE.to_string()
                } else {
                    remote.message
                };
                Err(AppError::Api {
                    code: remote.code,
                    message,
                })
            }
        }
    }

    // =========================================================================
    // Zones
    // =========================================================================

    /// List availability zones.
    pub async fn list_zones(&self) -> AppResult<Envelope<Vec<Zone>>> {
        self.request(ApiRequest::get("/v1/zones")).await
    }

    // =========================================================================
    // Flavors
    // =========================================================================

    /// List available instance flavors.
    pub async fn list_flavors(&self) -> AppResult<Envelope<Vec<Flavor>>> {
        self.request(ApiRequest::get("/v1/flavors")).await
    }

    /// Get a single flavor. The provider answers with a one-element list.
    pub async fn get_flavor(&self, flavor_id: &str) -> AppResult<Envelope<Vec<Flavor>>> {
        self.request(ApiRequest::get(format!("/v1/flavors/{flavor_id}")))
            .await
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// List available OS images.
    pub async fn list_images(&self) -> AppResult<Envelope<Vec<Image>>> {
        self.request(ApiRequest::get("/v1/images")).await
    }

    /// Get a single image. The provider answers with a one-element list.
    pub async fn get_image(&self, image_id: &str) -> AppResult<Envelope<Vec<Image>>> {
        self.request(ApiRequest::get(format!("/v1/images/{image_id}")))
            .await
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// List instances, one page at a time (1-indexed).
    pub async fn list_instances(&self, page: u64) -> AppResult<Envelope<Vec<Instance>>> {
        self.request(
            ApiRequest::get("/v1/instances").with_query("page", page.to_string()),
        )
        .await
    }

    /// Get a single instance. The provider answers with a one-element list.
    pub async fn get_instance(&self, instance_id: &str) -> AppResult<Envelope<Vec<Instance>>> {
        self.request(ApiRequest::get(format!("/v1/instances/{instance_id}")))
            .await
    }

    /// Create an instance.
    pub async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> AppResult<Envelope<Vec<Instance>>> {
        let body = serde_json::to_value(request)?;
        self.request(ApiRequest::post("/v1/instances").with_body(body))
            .await
    }

    /// Update an instance. The payload is relayed to the provider unchanged.
    pub async fn update_instance(
        &self,
        instance_id: &str,
        body: serde_json::Value,
    ) -> AppResult<Envelope<Vec<Instance>>> {
        self.request(ApiRequest::put(format!("/v1/instances/{instance_id}")).with_body(body))
            .await
    }

    /// Delete an instance.
    pub async fn delete_instance(
        &self,
        instance_id: &str,
    ) -> AppResult<Envelope<serde_json::Value>> {
        self.request(ApiRequest::delete(format!("/v1/instances/{instance_id}")))
            .await
    }

    /// Run a lifecycle action against an instance.
    ///
    /// Each action has its own endpoint under the instance; only reboot,
    /// rebuild, and resize carry a body.
    pub async fn instance_action(
        &self,
        instance_id: &str,
        action: &InstanceAction,
    ) -> AppResult<Envelope<serde_json::Value>> {
        let path = format!("/v1/instances/{instance_id}/{}", action.path_segment());
        let mut request = ApiRequest::post(path);
        if let Some(body) = action.upstream_body() {
            request = request.with_body(body);
        }
        self.request(request).await
    }
}

/// Turn a non-2xx upstream answer into an error.
///
/// The provider sends its usual envelope on failure statuses too; when the
/// body parses, its message is kept, otherwise the status alone has to do.
async fn remote_failure(status: u16, response: reqwest::Response) -> AppError {
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body
            .remote_message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error status={status}")),
        Err(_) => format!("HTTP error status={status}"),
    };

    warn!(status, "Upstream returned non-success status");
    AppError::Http { status, message }
}
