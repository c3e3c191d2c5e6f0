//! Serialized HTTP response types stored in the cache
//!
//! A `StoredResponse` captures status, headers, and raw body bytes so a
//! cached static asset can be replayed byte-for-byte. `CachedResponse` wraps
//! a stored response with the timestamp recorded at write time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content-Type header value for synthesized JSON responses
const CONTENT_TYPE_JSON: &str = "application/json";

/// Content-Type header value for synthesized HTML responses
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// A serialized HTTP response: status, headers, and raw body bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl StoredResponse {
    /// Creates a response from parts
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a JSON response with the given status code
    ///
    /// Used for synthesized fallback payloads. Serialization of
    /// `serde_json::Value` does not fail, so this is infallible.
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())],
            body: value.to_string().into_bytes(),
        }
    }

    /// Creates an HTML response with the given status code
    pub fn html(status: u16, markup: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), CONTENT_TYPE_HTML.to_string())],
            body: markup.as_bytes().to_vec(),
        }
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body decoded as UTF-8, with invalid sequences replaced
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A response read back from the cache, with its write timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    /// The stored response
    pub response: StoredResponse,
    /// When the response was written to the cache
    pub cached_at: DateTime<Utc>,
}
