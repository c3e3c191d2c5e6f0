//! Install and activation lifecycle
//!
//! Install precaches the configured manifest into the static namespace so
//! the app shell works on the first offline visit. Activation deletes every
//! namespace whose version tag is not part of the current set and starts
//! serving immediately; there is no migration between cache versions, old
//! namespaces are simply dropped.

use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::OfflineConfig;
use crate::net::NetError;
use crate::store::{CacheStore, NamespaceKind, StoreError, StoredResponse};

/// Lifecycle phase of the offline layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Precaching the configured manifest
    Installing,
    /// Install finished, not yet serving requests
    Waiting,
    /// Stale versions swept, serving requests
    Active,
}

impl Phase {
    /// Short name used in logs and CLI output
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Installing => "installing",
            Phase::Waiting => "waiting",
            Phase::Active => "active",
        }
    }
}

/// Outcome of an install precache run
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Number of URLs in the precache manifest
    pub requested: usize,
    /// Number of responses written to the cache
    pub cached: usize,
    /// URLs that could not be fetched or stored
    pub failed: Vec<String>,
}

impl InstallReport {
    /// Whether every manifest entry was cached
    pub fn complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of an activation sweep
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    /// Stale namespaces that were deleted
    pub removed: Vec<String>,
    /// The namespace set now in effect
    pub kept: Vec<String>,
}

/// Precaches the configured manifest
///
/// All fetches run concurrently and every response is stored in the static
/// namespace, including cross-origin entries. Failures are logged and
/// reported, never fatal: a single unreachable asset must not abort the
/// install.
///
/// # Arguments
/// * `store` - Cache store to precache into
/// * `config` - Supplies the manifest and the namespace version
/// * `fetch` - Performs the network fetch for one URL
pub async fn install<S, F, Fut>(store: &S, config: &OfflineConfig, fetch: F) -> InstallReport
where
    S: CacheStore,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<StoredResponse, NetError>>,
{
    let urls = config.precache_urls();
    let namespace = config.namespace(NamespaceKind::Static);

    let fetches = urls.iter().map(|url| fetch(url.clone()));
    let results: Vec<Result<StoredResponse, NetError>> = join_all(fetches).await;

    let mut report = InstallReport {
        requested: urls.len(),
        cached: 0,
        failed: Vec::new(),
    };
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(response) if response.is_success() => match store.put(&namespace, url, &response) {
                Ok(()) => report.cached += 1,
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to store precached response");
                    report.failed.push(url.clone());
                }
            },
            Ok(response) => {
                warn!(url = %url, status = response.status, "precache fetch returned an error status");
                report.failed.push(url.clone());
            }
            Err(e) => {
                warn!(url = %url, error = %e, "precache fetch failed");
                report.failed.push(url.clone());
            }
        }
    }

    info!(
        requested = report.requested,
        cached = report.cached,
        failed = report.failed.len(),
        "install precache finished"
    );
    report
}

/// Sweeps namespaces left over from previous cache versions
///
/// Deletes every namespace whose tag is not in the current set. Runs to
/// completion before the layer reports itself active, so a request can never
/// observe a stale version afterwards.
pub fn activate<S: CacheStore>(
    store: &S,
    config: &OfflineConfig,
) -> Result<ActivateReport, StoreError> {
    let kept = config.current_namespaces();
    let mut removed = Vec::new();

    for namespace in store.list_namespaces()? {
        if !kept.contains(&namespace) {
            store.remove_namespace(&namespace)?;
            info!(namespace = %namespace, "removed stale cache namespace");
            removed.push(namespace);
        }
    }

    Ok(ActivateReport { removed, kept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn asset(body: &str) -> StoredResponse {
        StoredResponse::new(200, Vec::new(), body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_install_precaches_whole_manifest_into_static_namespace() {
        let store = MemoryStore::new();
        let config = OfflineConfig::default();

        let report = install(&store, &config, |_url| async { Ok(asset("content")) }).await;

        assert_eq!(report.requested, config.precache.len());
        assert_eq!(report.cached, report.requested);
        assert!(report.complete());

        let namespace = config.namespace(NamespaceKind::Static);
        for url in config.precache_urls() {
            assert!(
                store
                    .get(&namespace, &url)
                    .expect("Get should not error")
                    .is_some(),
                "{} should be precached",
                url
            );
        }
    }

    #[tokio::test]
    async fn test_install_records_failures_without_aborting() {
        let store = MemoryStore::new();
        let config = OfflineConfig {
            precache: vec![
                "/app.js".to_string(),
                "/flaky.css".to_string(),
                "/index.html".to_string(),
            ],
            ..OfflineConfig::default()
        };

        let report = install(&store, &config, |url| async move {
            if url.contains("flaky") {
                Err(NetError::Offline)
            } else {
                Ok(asset("ok"))
            }
        })
        .await;

        assert_eq!(report.requested, 3);
        assert_eq!(report.cached, 2);
        assert_eq!(report.failed, vec!["https://tripmate.example/flaky.css".to_string()]);
        assert!(!report.complete());
    }

    #[tokio::test]
    async fn test_install_counts_error_statuses_as_failures() {
        let store = MemoryStore::new();
        let config = OfflineConfig {
            precache: vec!["/missing.js".to_string()],
            ..OfflineConfig::default()
        };

        let report = install(&store, &config, |_url| async {
            Ok(StoredResponse::new(404, Vec::new(), Vec::new()))
        })
        .await;

        assert_eq!(report.cached, 0);
        assert_eq!(report.failed.len(), 1);

        let namespace = config.namespace(NamespaceKind::Static);
        assert!(store
            .get(&namespace, "https://tripmate.example/missing.js")
            .expect("Get should not error")
            .is_none());
    }

    #[tokio::test]
    async fn test_install_precaches_cross_origin_entries() {
        let store = MemoryStore::new();
        let config = OfflineConfig {
            precache: vec!["https://unpkg.com/leaflet@1.9.4/dist/leaflet.css".to_string()],
            ..OfflineConfig::default()
        };

        let report = install(&store, &config, |_url| async { Ok(asset("/* css */")) }).await;

        assert_eq!(report.cached, 1);
        let namespace = config.namespace(NamespaceKind::Static);
        assert!(store
            .get(&namespace, "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css")
            .expect("Get should not error")
            .is_some());
    }

    #[test]
    fn test_activate_removes_only_stale_namespaces() {
        let store = MemoryStore::new();
        let config = OfflineConfig {
            version: "v2".to_string(),
            ..OfflineConfig::default()
        };

        // Entries from the previous version and the current one
        let old_response = StoredResponse::json(200, &json!({"cities": ["Paris"]}));
        store
            .put("static-v1", "https://tripmate.example/app.js", &old_response)
            .expect("Put should succeed");
        store
            .put("api-v1", "https://api.tripmate.example/api/cities", &old_response)
            .expect("Put should succeed");
        store
            .put("static-v2", "https://tripmate.example/app.js", &old_response)
            .expect("Put should succeed");

        let report = activate(&store, &config).expect("Activate should succeed");

        let mut removed = report.removed.clone();
        removed.sort();
        assert_eq!(removed, vec!["api-v1".to_string(), "static-v1".to_string()]);
        assert_eq!(
            store.list_namespaces().expect("List should succeed"),
            vec!["static-v2".to_string()]
        );
    }

    #[test]
    fn test_activate_on_empty_store_removes_nothing() {
        let store = MemoryStore::new();
        let config = OfflineConfig::default();

        let report = activate(&store, &config).expect("Activate should succeed");

        assert!(report.removed.is_empty());
        assert_eq!(report.kept.len(), 3);
    }

    #[test]
    fn test_activate_is_idempotent() {
        let store = MemoryStore::new();
        let config = OfflineConfig::default();
        store
            .put("static-v0", "https://tripmate.example/a", &asset("x"))
            .expect("Put should succeed");

        let first = activate(&store, &config).expect("First activate should succeed");
        let second = activate(&store, &config).expect("Second activate should succeed");

        assert_eq!(first.removed, vec!["static-v0".to_string()]);
        assert!(second.removed.is_empty());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Installing.as_str(), "installing");
        assert_eq!(Phase::Waiting.as_str(), "waiting");
        assert_eq!(Phase::Active.as_str(), "active");
    }
}
