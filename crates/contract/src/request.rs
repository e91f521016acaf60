//! Request descriptions.
//!
//! [`HttpRequestBuilder`] collects a method, a target URI, headers, query
//! parameters and an optional JSON body, and produces an immutable
//! [`HttpRequest`]. Authorization is attached per request with
//! [`HttpRequestBuilder::with_bearer_token`]; no client state is involved.
//!
//! ```rust
//! use hyperiot_contract::request::HttpRequestBuilder;
//!
//! let request = HttpRequestBuilder::get()
//!     .with_uri("/hprojects")
//!     .with_parameter("delta", "10")
//!     .with_parameter("page", "1")
//!     .with_content_type_header("application/json")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.uri(), "/hprojects");
//! assert_eq!(request.query().len(), 2);
//! ```

use http::{HeaderMap, HeaderName, HeaderValue, Method, header};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ContractError, ContractResult};

/// Scheme used by HyperIoT in the `Authorization` header.
pub const AUTHORIZATION_SCHEME: &str = "JWT";

/// An immutable description of an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    uri: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl HttpRequest {
    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the target URI, relative to the service base or absolute.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the JSON body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns a short `METHOD uri` label used in logs and diagnostics.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.uri)
    }
}

/// Builder for [`HttpRequest`].
///
/// Builder methods never fail; problems (missing URI, invalid header, body
/// that does not serialize) are reported by [`HttpRequestBuilder::build`].
#[derive(Debug, Clone)]
pub struct HttpRequestBuilder {
    method: Method,
    uri: Option<String>,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Result<Value, String>>,
}

impl HttpRequestBuilder {
    /// Starts a request with the given method.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            uri: None,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Starts a GET request.
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// Starts a POST request.
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Starts a PUT request.
    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// Starts a DELETE request.
    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Sets the target URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Adds a header. Repeated names are all sent.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the `Content-Type` header.
    pub fn with_content_type_header(self, content_type: &str) -> Self {
        self.with_header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Attaches `Authorization: JWT <token>`.
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_authorization(format!("{} {}", AUTHORIZATION_SCHEME, token))
    }

    /// Sets a raw `Authorization` header value.
    pub fn with_authorization(self, value: impl Into<String>) -> Self {
        self.with_header(header::AUTHORIZATION.as_str(), value)
    }

    /// Adds a query parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body from any serializable value.
    pub fn with_json_body<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_value(body).map_err(|e| e.to_string()));
        self
    }

    /// Builds the immutable request.
    pub fn build(self) -> ContractResult<HttpRequest> {
        let uri = self
            .uri
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ContractError::InvalidRequest("request has no URI".to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ContractError::InvalidRequest(format!("invalid header name: {}", name))
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|_| {
                ContractError::InvalidRequest(format!("invalid value for header {}", name))
            })?;
            headers.append(header_name, header_value);
        }

        let body = self
            .body
            .transpose()
            .map_err(|e| ContractError::InvalidRequest(format!("body does not serialize: {}", e)))?;

        Ok(HttpRequest {
            method: self.method,
            uri,
            headers,
            query: self.query,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_minimal_get() {
        let request = HttpRequestBuilder::get().with_uri("/hprojects/1").build().unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.uri(), "/hprojects/1");
        assert!(request.headers().is_empty());
        assert!(request.body().is_none());
        assert_eq!(request.label(), "GET /hprojects/1");
    }

    #[test]
    fn test_missing_uri_is_rejected() {
        let err = HttpRequestBuilder::post().build().unwrap_err();
        assert!(matches!(err, ContractError::InvalidRequest(_)));
    }

    #[test]
    fn test_bearer_token_uses_jwt_scheme() {
        let request = HttpRequestBuilder::get()
            .with_uri("/hprojects/all")
            .with_bearer_token("abc.def.ghi")
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "JWT abc.def.ghi"
        );
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let err = HttpRequestBuilder::get()
            .with_uri("/x")
            .with_header("X-Broken", "line\nbreak")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("X-Broken"));
    }

    #[test]
    fn test_json_body_and_query() {
        let request = HttpRequestBuilder::put()
            .with_uri("/hprojects")
            .with_content_type_header("application/json")
            .with_parameter("delta", "10")
            .with_json_body(&json!({"name": "Project"}))
            .build()
            .unwrap();
        assert_eq!(request.body().unwrap()["name"], "Project");
        assert_eq!(request.query(), &[("delta".to_string(), "10".to_string())]);
        assert_eq!(
            request.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_builder_is_reusable_by_clone() {
        let base = HttpRequestBuilder::get().with_uri("/hprojects/all");
        let first = base.clone().with_bearer_token("one").build().unwrap();
        let second = base.with_bearer_token("two").build().unwrap();
        assert_ne!(
            first.headers().get(header::AUTHORIZATION),
            second.headers().get(header::AUTHORIZATION)
        );
    }
}
