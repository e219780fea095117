//! The parsed inbound request seen by the dispatcher.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;

/// An already-parsed HTTP request.
///
/// Immutable once dispatch starts; routes and the bridge only borrow it.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Value,
}

impl IncomingRequest {
    /// Create a request with no headers and a `null` body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Value::Null,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw URL, including any query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL with any `?query` suffix stripped.
    pub fn path(&self) -> &str {
        match self.url.split_once('?') {
            Some((path, _)) => path,
            None => &self.url,
        }
    }

    pub fn query_string(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, query)| query)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Normalized descriptor handed to the execution engine.
    pub fn descriptor(&self) -> RequestDescriptor {
        RequestDescriptor {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
        }
    }
}

/// Method, URL and headers of a request, detached from its body.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_strips_query_string() {
        let req = IncomingRequest::new(Method::GET, "/graphql?query=%7B__typename%7D");
        assert_eq!(req.path(), "/graphql");
        assert_eq!(req.query_string(), Some("query=%7B__typename%7D"));
    }

    #[test]
    fn path_without_query() {
        let req = IncomingRequest::new(Method::POST, "/graphql");
        assert_eq!(req.path(), "/graphql");
        assert_eq!(req.query_string(), None);
    }

    #[test]
    fn empty_query_string_is_some() {
        let req = IncomingRequest::new(Method::GET, "/graphql?");
        assert_eq!(req.path(), "/graphql");
        assert_eq!(req.query_string(), Some(""));
    }

    #[test]
    fn descriptor_copies_method_url_and_headers() {
        let req = IncomingRequest::new(Method::POST, "/graphql?x=1")
            .with_header(http::header::AUTHORIZATION, HeaderValue::from_static("Bearer t"))
            .with_body(serde_json::json!({"query": "{ a }"}));

        let descriptor = req.descriptor();
        assert_eq!(descriptor.method, Method::POST);
        assert_eq!(descriptor.url, "/graphql?x=1");
        assert_eq!(descriptor.headers.get(http::header::AUTHORIZATION).unwrap(), "Bearer t");
    }
}
