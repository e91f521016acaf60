//! Captured HTTP responses.

use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ContractResult;

/// A fully read HTTP response.
///
/// The body is kept as text so that validators can distinguish an empty body
/// from an empty JSON document.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl HttpResponse {
    /// Creates a response from its parts.
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Returns the status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> ContractResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Deserializes the body into an entity.
    pub fn entity<T: DeserializeOwned>(&self) -> ContractResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, HeaderMap::new(), "").is_success());
        assert!(HttpResponse::new(204, HeaderMap::new(), "").is_success());
        assert!(!HttpResponse::new(403, HeaderMap::new(), "").is_success());
    }

    #[test]
    fn test_json_parsing() {
        let response = HttpResponse::new(200, HeaderMap::new(), r#"{"id": 7}"#);
        assert_eq!(response.json().unwrap()["id"], 7);
    }

    #[test]
    fn test_empty_body_is_not_json() {
        let response = HttpResponse::new(200, HeaderMap::new(), "");
        assert!(response.json().is_err());
        assert!(response.body().is_empty());
    }
}
