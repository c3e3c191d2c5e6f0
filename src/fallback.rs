//! Synthetic offline payloads for API endpoint families
//!
//! When an API request fails with nothing usable in the cache, the router
//! answers with a degraded payload instead of an error: the right shape for
//! the endpoint, empty result lists, and an `offline` marker the frontend
//! can surface. The catalog is part of the configuration so deployments can
//! adjust payloads without touching router code.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Message attached to every synthesized offline payload
const OFFLINE_MESSAGE: &str = "You're offline. Showing saved suggestions until you reconnect.";

/// City names offered by the offline city search
///
/// A search that cannot reach the backend still returns suggestions, so the
/// planner stays usable for trip sketching.
pub const OFFLINE_CITY_NAMES: [&str; 12] = [
    "Paris",
    "Rome",
    "Barcelona",
    "London",
    "Amsterdam",
    "Prague",
    "Vienna",
    "Lisbon",
    "Tokyo",
    "Kyoto",
    "New York",
    "Sydney",
];

/// A single fallback rule, matched against the request path by substring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRule {
    /// Substring the request path must contain
    pub contains: String,
    /// Payload returned when the rule matches
    pub payload: Value,
}

/// Ordered catalog of synthetic payloads for offline API responses
///
/// Rules are checked in order and the first match wins, so more specific
/// paths belong earlier. The default payload terminates every lookup, which
/// is what lets the router promise that API requests never hard-fail
/// offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackCatalog {
    /// Rules checked in order against the request path
    pub rules: Vec<FallbackRule>,
    /// Payload used when no rule matches
    pub default: Value,
}

impl FallbackCatalog {
    /// Resolves the fallback payload for a request path
    ///
    /// # Arguments
    /// * `path` - The URL path of the failed request (e.g. `/api/cities/search`)
    ///
    /// # Returns
    /// The payload of the first matching rule, or the catalog default.
    pub fn resolve(&self, path: &str) -> &Value {
        self.rules
            .iter()
            .find(|rule| path.contains(&rule.contains))
            .map(|rule| &rule.payload)
            .unwrap_or(&self.default)
    }
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        let city_names: Vec<Value> = OFFLINE_CITY_NAMES
            .iter()
            .map(|name| Value::String((*name).to_string()))
            .collect();

        Self {
            rules: vec![
                FallbackRule {
                    contains: "/api/cities".to_string(),
                    payload: json!({
                        "cities": city_names,
                        "places": [],
                        "offline": true,
                        "message": OFFLINE_MESSAGE,
                    }),
                },
                FallbackRule {
                    contains: "/api/attractions".to_string(),
                    payload: json!({
                        "attractions": [],
                        "offline": true,
                        "message": OFFLINE_MESSAGE,
                    }),
                },
                FallbackRule {
                    contains: "/api/itineraries".to_string(),
                    payload: json!({
                        "itineraries": [],
                        "offline": true,
                        "message": OFFLINE_MESSAGE,
                    }),
                },
                FallbackRule {
                    contains: "/api/health".to_string(),
                    payload: json!({
                        "status": "degraded",
                        "offline": true,
                        "message": OFFLINE_MESSAGE,
                    }),
                },
            ],
            default: json!({
                "offline": true,
                "message": OFFLINE_MESSAGE,
            }),
        }
    }
}
