//! Request routing: classification and per-class caching strategies
//!
//! Every GET request is classified into one of four classes, each with its
//! own strategy:
//!
//! * static assets are served cache-first and fetched once
//! * API data is network-first, falling back to the cached copy and then to
//!   a synthesized payload from the fallback catalog
//! * page shells are network-first, falling back to the cached page and then
//!   to the configured default shell
//! * everything else is network-first with cache fallback only
//!
//! Non-GET requests are never intercepted. The network itself is passed in
//! as a closure so callers decide how a fetch happens.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use url::{Origin, Url};

use crate::config::OfflineConfig;
use crate::net::NetError;
use crate::store::{CacheStore, NamespaceKind, StoreError, StoredResponse};

/// File extensions classified as static assets
///
/// HTML is deliberately absent: documents are page shells, not assets.
const ASSET_EXTENSIONS: [&str; 14] = [
    "js", "css", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2", "ttf",
    "json",
];

/// Errors that can occur while routing a request
#[derive(Debug, Error)]
pub enum RouteError {
    /// The request URL could not be parsed
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// `route` was handed a non-GET request, which the layer never intercepts
    #[error("Request method {0} is not intercepted")]
    NotIntercepted(String),

    /// The network is unreachable and no cached copy or fallback applies
    #[error("Not available offline: {0}")]
    NotAvailableOffline(String),

    /// Cache read failed
    #[error("Cache operation failed: {0}")]
    Store(#[from] StoreError),
}

/// What a GET request is asking for, which decides its caching strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Scripts, styles, fonts, images: immutable build artifacts
    StaticAsset,
    /// Backend API data
    ApiData,
    /// An HTML document for a navigation
    PageShell,
    /// Any other GET request
    Other,
}

impl RequestClass {
    /// The cache partition responses of this class are stored in
    ///
    /// Uncategorized requests share the pages partition; only real
    /// navigations receive the synthetic shell fallback.
    pub fn namespace_kind(self) -> NamespaceKind {
        match self {
            RequestClass::StaticAsset => NamespaceKind::Static,
            RequestClass::ApiData => NamespaceKind::Api,
            RequestClass::PageShell | RequestClass::Other => NamespaceKind::Pages,
        }
    }

    /// Short name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            RequestClass::StaticAsset => "static-asset",
            RequestClass::ApiData => "api-data",
            RequestClass::PageShell => "page-shell",
            RequestClass::Other => "other",
        }
    }
}

/// Where a routed response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Fresh from the network
    Network,
    /// Replayed from the cache
    Cache,
    /// Synthesized offline fallback
    Fallback,
}

impl ServedFrom {
    /// Short name used in logs and CLI output
    pub fn as_str(self) -> &'static str {
        match self {
            ServedFrom::Network => "network",
            ServedFrom::Cache => "cache",
            ServedFrom::Fallback => "fallback",
        }
    }
}

/// A request as seen by the router
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    url: Url,
    accept: Option<String>,
}

impl Request {
    /// Creates a request from a method and URL
    pub fn new(method: &str, url: &str) -> Result<Self, RouteError> {
        let parsed = Url::parse(url).map_err(|_| RouteError::InvalidUrl(url.to_string()))?;
        Ok(Self {
            method: method.to_uppercase(),
            url: parsed,
            accept: None,
        })
    }

    /// Creates a GET request
    pub fn get(url: &str) -> Result<Self, RouteError> {
        Self::new("GET", url)
    }

    /// Attaches an Accept header value, used to recognize navigations
    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    /// The request method, uppercased
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The parsed request URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn is_get(&self) -> bool {
        self.method == "GET"
    }

    fn accepts_html(&self) -> bool {
        self.accept
            .as_deref()
            .map(|a| a.contains("text/html"))
            .unwrap_or(false)
    }
}

/// Response produced by routing, tagged with its source
#[derive(Debug, Clone)]
pub struct Routed {
    /// The response to hand back
    pub response: StoredResponse,
    /// The request class the router assigned
    pub class: RequestClass,
    /// Whether the response came from the network, the cache, or a fallback
    pub source: ServedFrom,
    /// Original fetch time, when served from cache
    pub cached_at: Option<DateTime<Utc>>,
}

/// Routes GET requests through the cache according to their class
pub struct Router<S> {
    store: Arc<S>,
    config: Arc<OfflineConfig>,
    /// Origin of `site_base`, used to recognize the app's own navigations
    site_origin: Option<Origin>,
    /// Origins whose responses are treated as static assets
    asset_origins: Vec<Origin>,
}

impl<S: CacheStore> Router<S> {
    /// Creates a router over a store and configuration
    ///
    /// Unparseable origin entries in the configuration are skipped with a
    /// warning rather than failing construction.
    pub fn new(store: Arc<S>, config: Arc<OfflineConfig>) -> Self {
        let site_origin = match Url::parse(&config.site_base) {
            Ok(url) => Some(url.origin()),
            Err(e) => {
                warn!(site_base = %config.site_base, error = %e, "unparseable site_base in config");
                None
            }
        };
        let asset_origins = config
            .asset_hosts
            .iter()
            .filter_map(|host| match Url::parse(host) {
                Ok(url) => Some(url.origin()),
                Err(e) => {
                    warn!(host = %host, error = %e, "skipping unparseable asset host in config");
                    None
                }
            })
            .collect();

        Self {
            store,
            config,
            site_origin,
            asset_origins,
        }
    }

    /// Classifies a request, or returns `None` for non-GET methods
    ///
    /// Classification order: API prefix, then asset extension or asset host,
    /// then navigation heuristics, and `Other` as the remainder.
    pub fn classify(&self, request: &Request) -> Option<RequestClass> {
        if !request.is_get() {
            return None;
        }
        let url = request.url();
        let path = url.path();

        if path.starts_with(&self.config.api_prefix) {
            return Some(RequestClass::ApiData);
        }
        if has_asset_extension(path) || self.asset_origins.contains(&url.origin()) {
            return Some(RequestClass::StaticAsset);
        }
        if request.accepts_html() {
            return Some(RequestClass::PageShell);
        }
        // Extensionless paths on our own origin are navigations
        if Some(url.origin()) == self.site_origin {
            return Some(RequestClass::PageShell);
        }
        Some(RequestClass::Other)
    }

    /// Routes a GET request, calling `fetch` when the strategy needs the
    /// network
    ///
    /// # Arguments
    /// * `request` - The request to route; must be a GET
    /// * `fetch` - Performs the network fetch for this URL when invoked
    ///
    /// # Returns
    /// * `Ok(Routed)` with the response and its source
    /// * `Err(RouteError::NotIntercepted)` when handed a non-GET request
    /// * `Err(RouteError::NotAvailableOffline)` when every source misses
    pub async fn route<F, Fut>(&self, request: &Request, fetch: F) -> Result<Routed, RouteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StoredResponse, NetError>>,
    {
        let class = self
            .classify(request)
            .ok_or_else(|| RouteError::NotIntercepted(request.method().to_string()))?;
        let namespace = self.config.namespace(class.namespace_kind());
        let key = request.url().as_str().to_string();

        debug!(key = %key, class = class.as_str(), "routing request");
        match class {
            RequestClass::StaticAsset => self.cache_first(&namespace, &key, class, fetch).await,
            RequestClass::ApiData => {
                let path = request.url().path().to_string();
                self.network_first_api(&namespace, &key, &path, class, fetch)
                    .await
            }
            RequestClass::PageShell => self.network_first_shell(&namespace, &key, class, fetch).await,
            RequestClass::Other => self.network_first_plain(&namespace, &key, class, fetch).await,
        }
    }

    /// Cache-first: serve the cached copy if present, otherwise fetch once
    /// and cache the result
    async fn cache_first<F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        class: RequestClass,
        fetch: F,
    ) -> Result<Routed, RouteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StoredResponse, NetError>>,
    {
        if let Some(cached) = self.store.get(namespace, key)? {
            return Ok(Routed {
                response: cached.response,
                class,
                source: ServedFrom::Cache,
                cached_at: Some(cached.cached_at),
            });
        }

        match fetch().await {
            Ok(response) => {
                self.cache_success(namespace, key, &response);
                Ok(Routed {
                    response,
                    class,
                    source: ServedFrom::Network,
                    cached_at: None,
                })
            }
            Err(e) => {
                debug!(key = %key, error = %e, "asset fetch failed with empty cache");
                Err(RouteError::NotAvailableOffline(key.to_string()))
            }
        }
    }

    /// Network-first for API data: fresh network copy, then cache, then the
    /// fallback catalog. Never a hard failure.
    async fn network_first_api<F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        path: &str,
        class: RequestClass,
        fetch: F,
    ) -> Result<Routed, RouteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StoredResponse, NetError>>,
    {
        match fetch().await {
            Ok(response) => {
                self.cache_success(namespace, key, &response);
                Ok(Routed {
                    response,
                    class,
                    source: ServedFrom::Network,
                    cached_at: None,
                })
            }
            Err(e) => {
                debug!(key = %key, error = %e, "API fetch failed, falling back");
                if let Some(cached) = self.store.get(namespace, key)? {
                    return Ok(Routed {
                        response: cached.response,
                        class,
                        source: ServedFrom::Cache,
                        cached_at: Some(cached.cached_at),
                    });
                }
                let payload = self.config.fallbacks.resolve(path);
                Ok(Routed {
                    response: StoredResponse::json(200, payload),
                    class,
                    source: ServedFrom::Fallback,
                    cached_at: None,
                })
            }
        }
    }

    /// Network-first for navigations: fresh page, then cached page, then the
    /// configured default shell
    async fn network_first_shell<F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        class: RequestClass,
        fetch: F,
    ) -> Result<Routed, RouteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StoredResponse, NetError>>,
    {
        match fetch().await {
            Ok(response) => {
                self.cache_success(namespace, key, &response);
                Ok(Routed {
                    response,
                    class,
                    source: ServedFrom::Network,
                    cached_at: None,
                })
            }
            Err(e) => {
                debug!(key = %key, error = %e, "navigation fetch failed, falling back");
                if let Some(cached) = self.store.get(namespace, key)? {
                    return Ok(Routed {
                        response: cached.response,
                        class,
                        source: ServedFrom::Cache,
                        cached_at: Some(cached.cached_at),
                    });
                }
                // Precached pages live in the static namespace
                let static_namespace = self.config.namespace(NamespaceKind::Static);
                if let Some(cached) = self.store.get(&static_namespace, key)? {
                    return Ok(Routed {
                        response: cached.response,
                        class,
                        source: ServedFrom::Cache,
                        cached_at: Some(cached.cached_at),
                    });
                }
                Ok(Routed {
                    response: StoredResponse::html(200, &self.config.default_shell),
                    class,
                    source: ServedFrom::Fallback,
                    cached_at: None,
                })
            }
        }
    }

    /// Network-first with cache fallback only, for uncategorized requests
    async fn network_first_plain<F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        class: RequestClass,
        fetch: F,
    ) -> Result<Routed, RouteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StoredResponse, NetError>>,
    {
        match fetch().await {
            Ok(response) => {
                self.cache_success(namespace, key, &response);
                Ok(Routed {
                    response,
                    class,
                    source: ServedFrom::Network,
                    cached_at: None,
                })
            }
            Err(e) => {
                debug!(key = %key, error = %e, "fetch failed, trying cache");
                if let Some(cached) = self.store.get(namespace, key)? {
                    return Ok(Routed {
                        response: cached.response,
                        class,
                        source: ServedFrom::Cache,
                        cached_at: Some(cached.cached_at),
                    });
                }
                Err(RouteError::NotAvailableOffline(key.to_string()))
            }
        }
    }

    /// Caches a 2xx response, logging instead of failing when the write
    /// cannot complete
    fn cache_success(&self, namespace: &str, key: &str, response: &StoredResponse) {
        if !response.is_success() {
            return;
        }
        if let Err(e) = self.store.put(namespace, key, response) {
            warn!(namespace, key, error = %e, "failed to cache response");
        }
    }
}

/// Whether the final path segment carries a static asset extension
fn has_asset_extension(path: &str) -> bool {
    let segment = path.rsplit('/').next().unwrap_or("");
    match segment.rsplit_once('.') {
        Some((_, ext)) => ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
