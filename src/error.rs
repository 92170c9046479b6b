use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::models::ErrorCode;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Failure Taxonomy
///
/// Dispatch failures are split into specific variants so callers can match on
/// the failure mode without string inspection:
///
/// - `MissingCredentials` - no credential cookies; detected before a
///   dispatcher is ever constructed
/// - `RateLimited` - the outbound window budget is exhausted; carries the
///   wait hint and never reaches the network
/// - `Http` - the provider answered with a non-2xx status
/// - `Api` - transport succeeded but the envelope reported a failure
/// - `Network` - the request never completed (DNS, connect, timeout, decode)
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    MissingCredentials,

    #[error("Rate limit exceeded. Please wait {wait_secs} seconds.")]
    RateLimited { wait_secs: u64 },

    /// `message` is the remote envelope's message when one could be parsed,
    /// or `HTTP error status=<code>` when it could not. The numeric status
    /// is kept alongside for logging and metrics.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("iwinv API error [{code}]: {message}")]
    Api { code: ErrorCode, message: String },

    #[error("Upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full error details server-side for debugging
        // but only expose sanitized messages to clients
        tracing::error!(error = %self, "Request failed");

        let (status, error_type, message) = match &self {
            // Credential cookies absent - nothing was dispatched
            AppError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "missing_credentials",
                "Authentication required".to_string(),
            ),

            // The outbound budget for this credential is exhausted. The
            // message carries the wait hint, and Retry-After mirrors it.
            AppError::RateLimited { wait_secs } => {
                let message = self.to_string();
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    axum::Json(ErrorResponse {
                        error: "rate_limit_exceeded".to_string(),
                        message,
                        details: None,
                    }),
                )
                    .into_response();

                if let Ok(value) = HeaderValue::from_str(&wait_secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                return response;
            }

            // Upstream failures - the remote detail is logged above, the
            // client gets one generic message regardless of the cause
            AppError::Http { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_error",
                "Failed to complete the request to the iwinv API. Please try again later."
                    .to_string(),
            ),
            AppError::Api { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_error",
                "Failed to complete the request to the iwinv API. Please try again later."
                    .to_string(),
            ),
            AppError::Network(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_error",
                "Failed to complete the request to the iwinv API. Please try again later."
                    .to_string(),
            ),

            // Internal errors - never expose internal details to clients
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred. Please contact support if the issue persists."
                    .to_string(),
            ),
            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Service configuration error. Please contact support.".to_string(),
            ),

            // Client errors - safe to show the message as it's user-facing
            AppError::SerializationError(e) => {
                // Serde errors can be helpful for clients debugging their payload
                // but sanitize to avoid leaking internal type names
                let sanitized = sanitize_serde_error(e);
                return (
                    StatusCode::BAD_REQUEST,
                    axum::Json(ErrorResponse {
                        error: "serialization_error".to_string(),
                        message: sanitized,
                        details: None,
                    }),
                )
                    .into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None, // Never expose internal details to clients
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Sanitize serde error messages to avoid leaking internal type information.
///
/// Serde errors can contain internal struct/field names which shouldn't be
/// exposed to external clients. This function extracts the useful parts.
fn sanitize_serde_error(e: &serde_json::Error) -> String {
    let msg = e.to_string();

    // Common patterns to simplify for users
    if msg.contains("missing field")
        && let Some(start) = msg.find('`')
        && let Some(end) = msg[start + 1..].find('`')
    {
        let field = &msg[start + 1..start + 1 + end];
        return format!("Missing required field: {field}");
    }

    if msg.contains("unknown field")
        && let Some(start) = msg.find('`')
        && let Some(end) = msg[start + 1..].find('`')
    {
        let field = &msg[start + 1..start + 1 + end];
        return format!("Unknown field: {field}");
    }

    if msg.contains("invalid type") {
        return "Invalid data type in request body".to_string();
    }

    if msg.contains("EOF while parsing") || msg.contains("expected") {
        return "Malformed JSON in request body".to_string();
    }

    // Generic fallback that doesn't leak internal details
    "Invalid request format".to_string()
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
