//! The iwinv response envelope.
//!
//! Every remote response, success or failure, arrives wrapped in the same
//! JSON shape:
//!
//! ```text
//! { "code": "...", "error_code": "...", "message": "...", "result": ...,
//!   "count"?: n, "page_no"?: n, "page_size"?: n }
//! ```
//!
//! `error_code == "SUCCESS"` is the sole success sentinel. A 2xx transport
//! status with any other code is an application failure, so the envelope is
//! modeled as a union: deserialize the raw shape first, then resolve it into
//! either a typed success envelope or the remote failure. The error-code set
//! is open — the provider is only partially documented, and unobserved codes
//! must survive a round trip untouched.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote error code, as an open set.
///
/// The known values were observed in provider responses; anything else is
/// preserved verbatim in [`ErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// The success sentinel.
    Success,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimitExceeded,
    InternalServerError,
    /// Any code this client does not recognize.
    Other(String),
}

impl ErrorCode {
    /// Whether this is the success sentinel.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Wire representation of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "SUCCESS" => Self::Success,
            "NOT_FOUND" => Self::NotFound,
            "UNAUTHORIZED" => Self::Unauthorized,
            "FORBIDDEN" => Self::Forbidden,
            "RATE_LIMIT_EXCEEDED" => Self::RateLimitExceeded,
            "INTERNAL_SERVER_ERROR" => Self::InternalServerError,
            _ => Self::Other(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An envelope as it comes off the wire, with the payload still untyped.
///
/// `result` stays a [`Value`] here because its shape depends on which variant
/// the envelope turns out to be: a typed payload on success, the literal
/// string `"error"` on failure. [`RawEnvelope::resolve`] performs the split.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    #[serde(default)]
    pub code: String,
    pub error_code: ErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub page_no: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

impl RawEnvelope {
    /// Whether the envelope carries the success sentinel.
    pub fn is_success(&self) -> bool {
        self.error_code.is_success()
    }

    /// Resolve the union into a typed success envelope or the remote failure.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error if the envelope claims success but
    /// its `result` payload does not match `T`.
    pub fn resolve<T: DeserializeOwned>(self) -> Result<EnvelopeOutcome<T>, serde_json::Error> {
        if !self.is_success() {
            return Ok(EnvelopeOutcome::Failure(RemoteError {
                code: self.error_code,
                message: self.message,
            }));
        }

        let result: T = serde_json::from_value(self.result)?;
        Ok(EnvelopeOutcome::Success(Envelope {
            code: self.code,
            error_code: self.error_code,
            message: self.message,
            result,
            count: self.count,
            page_no: self.page_no,
            page_size: self.page_size,
        }))
    }
}

/// Resolved form of a 2xx envelope.
#[derive(Debug, Clone)]
pub enum EnvelopeOutcome<T> {
    /// The sentinel matched and the payload parsed as `T`.
    Success(Envelope<T>),
    /// Transport succeeded but the provider reported a failure.
    Failure(RemoteError),
}

/// A validated success envelope, relayed to the dashboard as-is.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub code: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub result: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_no: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

/// Application-level failure reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
}

/// Best-effort parse of a non-2xx response body.
///
/// Failure bodies usually follow the envelope shape with `result: "error"`,
/// but nothing is guaranteed, so every field is optional. The dispatcher
/// falls back to a generic status message when no usable `message` is here.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub error_code: Option<ErrorCode>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The remote message, if one was actually provided.
    pub fn remote_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}
