//! Request signing for the iwinv API.
//!
//! Every outbound call carries three authentication headers derived from the
//! caller's credential pair:
//!
//! - `X-iwinv-Timestamp`: decimal seconds since the Unix epoch
//! - `X-iwinv-Credential`: the access key, verbatim
//! - `X-iwinv-Signature`: lowercase hex HMAC-SHA256 of `timestamp + path`,
//!   keyed by the secret key
//!
//! The signature covers the request *path only* — never the query string and
//! never the body. Two requests to the same path with different query
//! parameters carry the same signature for the same timestamp.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request timestamp (decimal epoch seconds).
pub const HEADER_TIMESTAMP: &str = "x-iwinv-timestamp";

/// Header carrying the access key.
pub const HEADER_CREDENTIAL: &str = "x-iwinv-credential";

/// Header carrying the request signature.
pub const HEADER_SIGNATURE: &str = "x-iwinv-signature";

/// Compute the request signature for a given timestamp and path.
///
/// The signed message is the UTF-8 concatenation `timestamp + path`, e.g.
/// `1700000000/v1/zones`. The digest is rendered as lowercase hex, two
/// characters per byte.
///
/// Pure and deterministic: identical inputs always produce identical
/// signatures, and changing any input changes the output. The secret is not
/// retained beyond the call.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the HMAC cannot be initialized. HMAC
/// accepts keys of any length, so this does not occur for string secrets.
pub fn sign(timestamp_secs: u64, path: &str, secret_key: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| AppError::Internal(format!("failed to initialize HMAC: {e}")))?;

    mac.update(timestamp_secs.to_string().as_bytes());
    mac.update(path.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Assemble the authentication header set for one request.
///
/// Produces the three `x-iwinv-*` headers plus `Content-Type:
/// application/json`. The timestamp is supplied by the caller (the dispatcher
/// reads it from the injected clock) so this function stays pure.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] if the access key contains bytes that are
/// not permitted in an HTTP header value.
pub fn build_headers(
    access_key: &str,
    secret_key: &str,
    path: &str,
    timestamp_secs: u64,
) -> AppResult<HeaderMap> {
    let signature = sign(timestamp_secs, path, secret_key)?;

    let credential = HeaderValue::from_str(access_key).map_err(|_| {
        AppError::BadRequest("Access key contains characters not permitted in headers".to_string())
    })?;
    let timestamp = HeaderValue::from_str(&timestamp_secs.to_string()).map_err(|_| {
        AppError::Internal("timestamp produced an invalid header value".to_string())
    })?;
    let signature = HeaderValue::from_str(&signature)
        .map_err(|_| AppError::Internal("signature produced an invalid header value".to_string()))?;

    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(HeaderName::from_static(HEADER_TIMESTAMP), timestamp);
    headers.insert(HeaderName::from_static(HEADER_CREDENTIAL), credential);
    headers.insert(HeaderName::from_static(HEADER_SIGNATURE), signature);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // Fixed parity vector, shared with other implementations of this client.
    const VECTOR_SIGNATURE: &str =
        "492ac79f70e53b00bc8ae2c96155605872cede9336c8b5dc8e5719301a7980d6";

    #[test]
    fn test_sign_matches_published_vector() {
        let signature = sign(1_700_000_000, "/v1/zones", "topsecret").unwrap();
        assert_eq!(signature, VECTOR_SIGNATURE);
    }

    #[test]
    fn test_sign_is_deterministic() {
        let first = sign(1_700_000_000, "/v1/zones", "topsecret").unwrap();
        let second = sign(1_700_000_000, "/v1/zones", "topsecret").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sign_depends_on_timestamp() {
        let signature = sign(1_700_000_001, "/v1/zones", "topsecret").unwrap();
        assert_eq!(
            signature,
            "73c37e0c1fbaaf3202940021caa1cc496baac06a2fea1052441f3344abe55193"
        );
        assert_ne!(signature, VECTOR_SIGNATURE);
    }

    #[test]
    fn test_sign_depends_on_path() {
        let signature = sign(1_700_000_000, "/v1/flavors", "topsecret").unwrap();
        assert_eq!(
            signature,
            "70a730fc4ebded6b2e2a9e0969e6fc0620a10f829d09144f4b36bcf6bb61ff61"
        );
        assert_ne!(signature, VECTOR_SIGNATURE);
    }

    #[test]
    fn test_sign_depends_on_secret() {
        let signature = sign(1_700_000_000, "/v1/zones", "other-secret").unwrap();
        assert_eq!(
            signature,
            "341d7c3f41d0f7ab6501b45239eb4bac277b3e5848805b6be48e52b6b2bb6fb4"
        );
        assert_ne!(signature, VECTOR_SIGNATURE);
    }

    #[test]
    fn test_sign_output_is_lowercase_hex() {
        let signature = sign(0, "/", "k").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(signature, signature.to_lowercase());
    }

    #[test]
    fn test_build_headers_contains_full_set() {
        let headers = build_headers("AKIA123", "topsecret", "/v1/zones", 1_700_000_000).unwrap();

        assert_eq!(headers.get(HEADER_TIMESTAMP).unwrap(), "1700000000");
        assert_eq!(headers.get(HEADER_CREDENTIAL).unwrap(), "AKIA123");
        assert_eq!(headers.get(HEADER_SIGNATURE).unwrap(), VECTOR_SIGNATURE);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_build_headers_rejects_unprintable_access_key() {
        let result = build_headers("bad\nkey", "secret", "/v1/zones", 1_700_000_000);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_build_headers_never_carries_the_secret() {
        let headers = build_headers("AKIA123", "topsecret", "/v1/zones", 1_700_000_000).unwrap();

        for value in headers.values() {
            assert_ne!(value.to_str().unwrap(), "topsecret");
        }
    }
}
