//! Per-request iwinv API credentials.
//!
//! The dashboard stores the key pair in cookies after the user enters it, so
//! every browser request carries both values and the server holds no
//! credential state of its own. The extractor pulls them out of the `Cookie`
//! header; handlers that take [`Credentials`] as an argument therefore reject
//! unauthenticated requests before any upstream work happens.
//!
//! # Security
//!
//! The secret key signs upstream requests and must never appear in logs or
//! responses. `Credentials` deliberately implements [`std::fmt::Debug`] by
//! hand so that tracing a request can never leak it.

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;

use crate::error::AppError;

/// Cookie holding the public access key.
pub const COOKIE_ACCESS_KEY: &str = "accessKey";

/// Cookie holding the signing secret.
pub const COOKIE_SECRET_KEY: &str = "secretKey";

/// An iwinv API key pair extracted from request cookies.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Public identifier, sent upstream as a header and used to key quota windows
    pub access_key: String,
    /// Signing secret; never logged, never echoed back
    pub secret_key: String,
}

impl Credentials {
    /// Create a credential pair directly (primarily for tests).
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl<S> FromRequestParts<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_credentials(parts).ok_or(AppError::MissingCredentials)
    }
}

/// Extract the key pair from the `Cookie` header, if both halves are present
/// and non-empty.
fn extract_credentials(parts: &Parts) -> Option<Credentials> {
    let header = parts.headers.get(COOKIE)?.to_str().ok()?;

    let mut access_key = None;
    let mut secret_key = None;

    for pair in header.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            match name {
                COOKIE_ACCESS_KEY => access_key = Some(value.to_string()),
                COOKIE_SECRET_KEY => secret_key = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let access_key = access_key.filter(|k| !k.is_empty())?;
    let secret_key = secret_key.filter(|k| !k.is_empty())?;

    Some(Credentials {
        access_key,
        secret_key,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use super::*;

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header("cookie", cookie)
            .body(Body::empty())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_extract_both_keys() {
        let parts = parts_with_cookie("accessKey=AK123; secretKey=SK456");
        let creds = extract_credentials(&parts).expect("Should extract credentials");

        assert_eq!(creds.access_key, "AK123");
        assert_eq!(creds.secret_key, "SK456");
    }

    #[test]
    fn test_extract_ignores_surrounding_cookies() {
        let parts =
            parts_with_cookie("theme=dark; accessKey=AK123; session=xyz; secretKey=SK456");
        let creds = extract_credentials(&parts).expect("Should extract credentials");

        assert_eq!(creds.access_key, "AK123");
        assert_eq!(creds.secret_key, "SK456");
    }

    #[test]
    fn test_extract_tolerates_missing_spaces() {
        let parts = parts_with_cookie("accessKey=AK123;secretKey=SK456");
        let creds = extract_credentials(&parts).expect("Should extract credentials");

        assert_eq!(creds.access_key, "AK123");
        assert_eq!(creds.secret_key, "SK456");
    }

    #[test]
    fn test_extract_missing_secret_key() {
        let parts = parts_with_cookie("accessKey=AK123");
        assert!(extract_credentials(&parts).is_none());
    }

    #[test]
    fn test_extract_empty_value_treated_as_missing() {
        let parts = parts_with_cookie("accessKey=AK123; secretKey=");
        assert!(extract_credentials(&parts).is_none());
    }

    #[test]
    fn test_extract_no_cookie_header() {
        let (parts, _) = Request::builder()
            .body(Body::empty())
            .unwrap()
            .into_parts();
        assert!(extract_credentials(&parts).is_none());
    }

    #[tokio::test]
    async fn test_extractor_rejects_with_missing_credentials() {
        let (mut parts, _) = Request::builder()
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let result = Credentials::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_extractor_accepts_valid_cookies() {
        let mut parts = parts_with_cookie("accessKey=AK123; secretKey=SK456");

        let creds = Credentials::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract credentials");
        assert_eq!(creds.access_key, "AK123");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("AK123", "SK456");
        let debug = format!("{creds:?}");

        assert!(debug.contains("AK123"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("SK456"));
    }
}
