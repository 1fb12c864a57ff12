//! Per-request response context.
//!
//! # Responsibilities
//! - Hold status, headers, content type and body while the pipeline runs
//! - Let filters and handlers mutate them in sequence
//! - Convert the finalized context into an axum response
//!
//! # Design Decisions
//! - Status defaults to 200, content type to `text/html; charset=utf-8`
//! - Headers are kept as plain strings and validated only at conversion,
//!   so handlers never deal with header parsing errors
//! - Invalid headers are dropped with a warning rather than failing the reply
//! - `Content-Type` set through any header method becomes the content type,
//!   so the reply never carries two of them
//! - `header` replaces earlier values of a name; `append_header` keeps them
//!   (repeated `Set-Cookie`)

use axum::body::Body as AxumBody;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;

/// Content type used when nothing else was set.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No body was produced.
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(s) => s.is_empty(),
            Body::Bytes(b) => b.is_empty(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Empty => &[],
            Body::Text(s) => s.as_bytes(),
            Body::Bytes(b) => b,
        }
    }

    /// The body as text, lossily decoded when it holds bytes.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Bytes(b)
    }
}

/// The response side of the dispatch context.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            content_type: None,
            body: Body::Empty,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Set a header, replacing any earlier value with the same name.
    pub fn header(&mut self, name: &str, value: impl Into<String>) {
        if is_content_type(name) {
            self.set_type(value);
            return;
        }
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// Add a header value, keeping earlier values with the same name.
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        if is_content_type(name) {
            self.set_type(value);
            return;
        }
        self.headers.push((name.to_string(), value.into()));
    }

    /// Look up a header set on this response. The first value wins.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        if is_content_type(name) {
            return self.content_type.as_deref();
        }
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Set the `Content-Type` of the reply.
    pub fn set_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Redirect with `302 Found`.
    pub fn redirect(&mut self, location: &str) {
        self.redirect_with(location, StatusCode::FOUND);
    }

    /// Redirect with a caller-chosen status.
    pub fn redirect_with(&mut self, location: &str, status: StatusCode) {
        self.header(header::LOCATION.as_str(), location);
        self.status = status;
    }

    /// Drop the body, keeping status and headers. Used for HEAD requests.
    pub(crate) fn clear_body(&mut self) {
        self.body = Body::Empty;
    }
}

fn is_content_type(name: &str) -> bool {
    name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str())
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(AxumBody::from(match self.body {
            Body::Empty => Vec::new(),
            Body::Text(s) => s.into_bytes(),
            Body::Bytes(b) => b,
        }));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        let content_type = self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        for (name, value) in &self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let res = Response::new();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.body().is_empty());
        assert_eq!(res.content_type(), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_header_replaces_same_name() {
        let mut res = Response::new();
        res.header("after", "one");
        res.header("After", "foobar");
        assert_eq!(res.headers().len(), 1);
        assert_eq!(res.get_header("after"), Some("foobar"));
    }

    #[test]
    fn test_redirect() {
        let mut res = Response::new();
        res.redirect("/news/world");
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.get_header("location"), Some("/news/world"));

        res.redirect_with("/moved", StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.get_header("Location"), Some("/moved"));
    }

    #[test]
    fn test_body_conversions() {
        assert_eq!(Body::from("x"), Body::Text("x".into()));
        assert_eq!(Body::from(()), Body::Empty);
        assert_eq!(Body::from(vec![104, 105]).to_text(), "hi");
        assert!(Body::Text(String::new()).is_empty());
    }

    #[test]
    fn test_into_axum_response() {
        let mut res = Response::new();
        res.set_status(StatusCode::CREATED);
        res.set_type("application/json");
        res.header("after", "foobar");
        res.header("bad header", "x");
        res.set_body("{}");

        let axum_res = res.into_response();
        assert_eq!(axum_res.status(), StatusCode::CREATED);
        assert_eq!(axum_res.headers()["content-type"], "application/json");
        assert_eq!(axum_res.headers()["after"], "foobar");
        assert_eq!(axum_res.headers().len(), 2);
    }

    #[test]
    fn test_content_type_header_replaces_default() {
        let mut res = Response::new();
        res.header("Content-Type", "application/json");
        assert_eq!(res.content_type(), "application/json");
        assert_eq!(res.get_header("content-type"), Some("application/json"));
        assert!(res.headers().is_empty());

        let axum_res = res.into_response();
        let values: Vec<_> = axum_res.headers().get_all("content-type").iter().collect();
        assert_eq!(values, vec!["application/json"]);
    }

    #[test]
    fn test_append_header_keeps_every_value() {
        let mut res = Response::new();
        res.append_header("Set-Cookie", "a=1");
        res.append_header("set-cookie", "b=2");
        assert_eq!(res.get_header("set-cookie"), Some("a=1"));

        let axum_res = res.into_response();
        let cookies: Vec<_> = axum_res.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);

        let mut res = Response::new();
        res.append_header("CONTENT-TYPE", "text/plain");
        let axum_res = res.into_response();
        let values: Vec<_> = axum_res.headers().get_all("content-type").iter().collect();
        assert_eq!(values, vec!["text/plain"]);
    }
}
