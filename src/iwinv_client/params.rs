//! Request descriptors for iwinv API calls.

use axum::http::Method;
use serde_json::Value;

/// One outbound API call, described before dispatch.
///
/// Groups path, method, query parameters, and body so handler code reads as
/// a single expression and new request attributes can be added without
/// breaking call sites.
///
/// Query parameters are kept as an ordered list, not a map: they are appended
/// to the URL in exactly the order they were added. The body is an optional
/// JSON value; when absent, no request payload is sent at all.
///
/// # Example
///
/// ```rust,ignore
/// let request = ApiRequest::get("/v1/instances").with_query("page", "2");
/// let envelope = client.request::<Vec<Instance>>(request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Request path, starting with `/`. Combined with the base URL and signed.
    pub path: String,
    /// HTTP method. Handlers only ever construct GET/POST/PUT/DELETE.
    pub method: Method,
    /// Query parameters in append order. Never part of the signature.
    pub query: Vec<(String, String)>,
    /// JSON body, omitted from the wire entirely when `None`.
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            query: Vec::new(),
            body: None,
        }
    }

    /// Describe a GET request (the default method for dashboard reads).
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Describe a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Describe a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Describe a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one query parameter. Order of calls is preserved on the wire.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
