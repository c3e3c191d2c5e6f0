//! In-memory cache store
//!
//! Backs the same `CacheStore` trait as the disk store with a map guarded by
//! a mutex. Nothing survives the process; intended for tests and for running
//! the layer without touching the filesystem.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use super::response::{CachedResponse, StoredResponse};
use super::traits::{CacheStore, NamespaceSize, SizeReport, StoreError};

/// Cache store holding all entries in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Namespace tag to entries keyed by request URL
    spaces: Mutex<HashMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, HashMap<String, CachedResponse>>>, StoreError>
    {
        self.spaces
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl CacheStore for MemoryStore {
    fn put(&self, namespace: &str, key: &str, response: &StoredResponse) -> Result<(), StoreError> {
        let mut spaces = self.locked()?;
        spaces.entry(namespace.to_string()).or_default().insert(
            key.to_string(),
            CachedResponse {
                response: response.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<CachedResponse>, StoreError> {
        let spaces = self.locked()?;
        Ok(spaces.get(namespace).and_then(|entries| entries.get(key)).cloned())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<bool, StoreError> {
        let mut spaces = self.locked()?;
        Ok(spaces
            .get_mut(namespace)
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false))
    }

    fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let spaces = self.locked()?;
        let mut namespaces: Vec<String> = spaces.keys().cloned().collect();
        namespaces.sort();
        Ok(namespaces)
    }

    fn remove_namespace(&self, namespace: &str) -> Result<bool, StoreError> {
        let mut spaces = self.locked()?;
        Ok(spaces.remove(namespace).is_some())
    }

    fn size_report(&self) -> Result<SizeReport, StoreError> {
        let spaces = self.locked()?;
        let mut report = SizeReport::default();
        let mut namespaces: Vec<_> = spaces.iter().collect();
        namespaces.sort_by(|a, b| a.0.cmp(b.0));
        for (namespace, entries) in namespaces {
            report.namespaces.push(NamespaceSize {
                namespace: namespace.clone(),
                entries: entries.len() as u64,
                bytes: entries
                    .values()
                    .map(|e| e.response.body.len() as u64)
                    .sum(),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response(body: &str) -> StoredResponse {
        StoredResponse::new(200, Vec::new(), body.as_bytes().to_vec())
    }

    #[test]
    fn test_put_then_get_returns_same_response() {
        let store = MemoryStore::new();
        let original = sample_response("body bytes");

        store
            .put("static-v1", "https://tripmate.example/app.js", &original)
            .expect("Put should succeed");

        let cached = store
            .get("static-v1", "https://tripmate.example/app.js")
            .expect("Get should not error")
            .expect("Entry should exist");
        assert_eq!(cached.response, original);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryStore::new();
        let key = "https://tripmate.example/app.js";

        store
            .put("static-v1", key, &sample_response("v1"))
            .expect("Put should succeed");
        store
            .put("static-v2", key, &sample_response("v2"))
            .expect("Put should succeed");

        let v1 = store
            .get("static-v1", key)
            .expect("Get should not error")
            .expect("v1 entry should exist");
        let v2 = store
            .get("static-v2", key)
            .expect("Get should not error")
            .expect("v2 entry should exist");
        assert_eq!(v1.response.body, b"v1".to_vec());
        assert_eq!(v2.response.body, b"v2".to_vec());
    }

    #[test]
    fn test_remove_namespace_drops_every_entry() {
        let store = MemoryStore::new();

        store
            .put("api-v1", "https://api.tripmate.example/api/cities", &sample_response("a"))
            .expect("Put should succeed");
        store
            .put("api-v1", "https://api.tripmate.example/api/places", &sample_response("b"))
            .expect("Put should succeed");

        assert!(store.remove_namespace("api-v1").expect("Remove should succeed"));
        assert!(store
            .get("api-v1", "https://api.tripmate.example/api/cities")
            .expect("Get should not error")
            .is_none());
        assert!(!store.remove_namespace("api-v1").expect("Second remove should succeed"));
    }

    #[test]
    fn test_size_report_uses_body_length() {
        let store = MemoryStore::new();

        store
            .put("static-v1", "https://tripmate.example/a", &sample_response("12345"))
            .expect("Put should succeed");

        let report = store.size_report().expect("Report should succeed");
        assert_eq!(report.total_entries(), 1);
        assert_eq!(report.total_bytes(), 5);
    }

    #[test]
    fn test_delete_only_touches_named_entry() {
        let store = MemoryStore::new();

        store
            .put("static-v1", "https://tripmate.example/a", &sample_response("a"))
            .expect("Put should succeed");
        store
            .put("static-v1", "https://tripmate.example/b", &sample_response("b"))
            .expect("Put should succeed");

        assert!(store
            .delete("static-v1", "https://tripmate.example/a")
            .expect("Delete should succeed"));
        assert!(store
            .get("static-v1", "https://tripmate.example/b")
            .expect("Get should not error")
            .is_some());
    }
}
