//! HTTP client for the TripMate backend and asset hosts
//!
//! Wraps `reqwest` so the rest of the layer deals in `StoredResponse`
//! values, which can be cached and replayed as-is. No timeouts are layered
//! on top of the transport; a hang or refusal surfaces as a request error
//! and the caller falls back to cache.

use reqwest::{Client, Method};
use serde_json::Value;
use thiserror::Error;

use crate::store::StoredResponse;

/// Errors that can occur when talking to the network
#[derive(Debug, Error)]
pub enum NetError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Request method was not a valid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Network access is disabled for this run
    #[error("Network access is disabled")]
    Offline,
}

/// HTTP client producing cacheable responses
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    /// Creates a client with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Creates a client wrapping a custom `reqwest::Client`
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL with GET and captures the full response
    ///
    /// # Returns
    /// * `Ok(StoredResponse)` for any HTTP response, success or not
    /// * `Err(NetError)` only when the transport fails
    pub async fn get(&self, url: &str) -> Result<StoredResponse, NetError> {
        let response = self.client.get(url).send().await?;
        Ok(into_stored(response).await?)
    }

    /// Sends a JSON payload with POST and captures the full response
    pub async fn post_json(&self, url: &str, payload: &Value) -> Result<StoredResponse, NetError> {
        let response = self.client.post(url).json(payload).send().await?;
        Ok(into_stored(response).await?)
    }

    /// Sends a request with an arbitrary method, without touching any cache
    ///
    /// Used for requests the offline layer passes through untouched.
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<StoredResponse, NetError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| NetError::InvalidMethod(method.to_string()))?;
        let mut request = self.client.request(method, url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        let response = request.send().await?;
        Ok(into_stored(response).await?)
    }

    /// Checks whether a URL is reachable
    ///
    /// Any HTTP response counts as reachable, including error statuses; only
    /// a transport failure reports the network as down.
    pub async fn probe(&self, url: &str) -> bool {
        self.client.get(url).send().await.is_ok()
    }
}

/// Drains a `reqwest` response into a serializable form
///
/// Header values that are not valid UTF-8 are skipped; the offline layer
/// replays what it stores as text.
async fn into_stored(response: reqwest::Response) -> Result<StoredResponse, reqwest::Error> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.bytes().await?.to_vec();
    Ok(StoredResponse::new(status, headers, body))
}
