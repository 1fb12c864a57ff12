//! Per-request context handed to filters, routes and exception handlers.
//!
//! # Responsibilities
//! - Carry method, path, query, headers and body of one inbound request
//! - Expose the params and splat bound by the pattern currently executing
//! - Carry a request ID for log correlation
//!
//! # Design Decisions
//! - Created fresh per request and moved into the worker; never shared
//! - Params are rebound before each filter and before the route, so every
//!   handler sees the captures of its own pattern
//! - Param lookup ignores a leading `:` and ASCII case of the name

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method};
use uuid::Uuid;

use crate::routing::pattern::{param_key, PathMatch};

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The request side of the dispatch context.
#[derive(Debug, Clone)]
pub struct Request {
    id: String,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    splat: Vec<String>,
}

impl Request {
    /// Build a request for `target`, which may include a query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            splat: Vec::new(),
        }
    }

    /// Build from the parts of an axum request and its collected body.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            id,
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body,
            params: HashMap::new(),
            splat: Vec::new(),
        }
    }

    /// Add a header. Invalid names or values are dropped with a warning.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Ignoring invalid request header"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw `Accept` header.
    pub fn accept(&self) -> Option<&str> {
        self.header(header::ACCEPT.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn body(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    /// A named path parameter. `":name"`, `"name"` and `"NAME"` are equivalent.
    pub fn params(&self, name: &str) -> Option<&str> {
        self.params.get(&param_key(name)).map(String::as_str)
    }

    /// All bound path parameters, keyed by lowercased name.
    pub fn all_params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Wildcard captures of the current pattern.
    pub fn splat(&self) -> &[String] {
        &self.splat
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Every value of a repeated query parameter, in order.
    pub fn query_param_values(&self, name: &str) -> Vec<String> {
        self.query_pairs()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }

    fn query_pairs(&self) -> url::form_urlencoded::Parse<'_> {
        url::form_urlencoded::parse(self.query.as_deref().unwrap_or_default().as_bytes())
    }

    /// Replace params and splat with the captures of a new pattern.
    pub(crate) fn bind(&mut self, captures: PathMatch) {
        self.params = captures.params;
        self.splat = captures.splat;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_split_from_path() {
        let req = Request::new(Method::GET, "/search?q=rust&tag=a&tag=b");
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query_string(), Some("q=rust&tag=a&tag=b"));
        assert_eq!(req.query_param("q").as_deref(), Some("rust"));
        assert_eq!(req.query_param_values("tag"), vec!["a", "b"]);
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn test_query_decoding() {
        let req = Request::new(Method::GET, "/s?name=the+dude&x=%2Fslash");
        assert_eq!(req.query_param("name").as_deref(), Some("the dude"));
        assert_eq!(req.query_param("x").as_deref(), Some("/slash"));
    }

    #[test]
    fn test_param_lookup_is_lenient_about_name() {
        let mut req = Request::new(Method::GET, "/paramwithmaj/plop");
        let mut captures = PathMatch::default();
        captures.params.insert("paramwithmaj".to_string(), "plop".to_string());
        req.bind(captures);

        assert_eq!(req.params(":paramWithMaj"), Some("plop"));
        assert_eq!(req.params("paramwithmaj"), Some("plop"));
        assert_eq!(req.params("other"), None);
    }

    #[test]
    fn test_headers_and_body() {
        let req = Request::new(Method::POST, "/poster")
            .with_header("Accept", "application/json")
            .with_header("bad header", "x")
            .with_body("Fo shizzy");

        assert_eq!(req.accept(), Some("application/json"));
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.body(), "Fo shizzy");
    }

    #[test]
    fn test_request_id_from_header() {
        let (parts, _) = axum::http::Request::builder()
            .uri("/hi?x=1")
            .header(X_REQUEST_ID, "abc-123")
            .body(())
            .unwrap()
            .into_parts();
        let req = Request::from_parts(&parts, Bytes::new());
        assert_eq!(req.id(), "abc-123");
        assert_eq!(req.path(), "/hi");
        assert_eq!(req.query_param("x").as_deref(), Some("1"));
    }
}
