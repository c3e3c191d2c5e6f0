//! Disk-backed cache store
//!
//! Persists each cached response as a JSON file under an XDG-compliant cache
//! directory (`~/.cache/tripcache/store/` on Linux). Namespaces map to
//! subdirectories, so removing a namespace is a single directory removal.
//! Entry file names are SHA-256 hashes of the request URL, which keeps
//! arbitrary URLs (slashes, query strings) out of the filesystem.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

use super::response::{CachedResponse, StoredResponse};
use super::traits::{CacheStore, NamespaceSize, SizeReport, StoreError};

/// On-disk representation of a single cache entry
///
/// The original key is recorded alongside the response because the file name
/// is a one-way hash of it.
#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry {
    /// The request URL this entry was stored under
    key: String,
    /// When the entry was written
    cached_at: DateTime<Utc>,
    /// The serialized response
    response: StoredResponse,
}

/// Cache store that persists responses as JSON files on disk
///
/// Layout: `<root>/<namespace>/<sha256(key)>.json`. Directories are created
/// lazily on the first write into a namespace.
#[derive(Debug, Clone)]
pub struct DiskStore {
    /// Directory holding one subdirectory per namespace
    root: PathBuf,
}

impl DiskStore {
    /// Opens the store at the XDG-compliant cache location
    ///
    /// Uses `~/.cache/tripcache/store/` on Linux, or the equivalent path on
    /// other platforms.
    ///
    /// # Returns
    /// * `Ok(DiskStore)` on success
    /// * `Err(StoreError::NoCacheDir)` if no cache directory can be determined
    pub fn open() -> Result<Self, StoreError> {
        let project_dirs = ProjectDirs::from("", "", "tripcache").ok_or(StoreError::NoCacheDir)?;
        let root = project_dirs.cache_dir().join("store");
        Ok(Self { root })
    }

    /// Opens a store rooted at a custom directory
    ///
    /// Useful for testing or when a specific cache location is configured.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the directory holding a namespace's entries
    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    /// Returns the path of the entry file for a key within a namespace
    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace).join(entry_file_name(key))
    }
}

/// Hashes a cache key into a fixed-length file name
fn entry_file_name(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{}.json", hex::encode(hasher.finalize()))
}

impl CacheStore for DiskStore {
    fn put(&self, namespace: &str, key: &str, response: &StoredResponse) -> Result<(), StoreError> {
        fs::create_dir_all(self.namespace_dir(namespace))?;

        let entry = DiskEntry {
            key: key.to_string(),
            cached_at: Utc::now(),
            response: response.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)?;

        fs::write(self.entry_path(namespace, key), json)?;
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<CachedResponse>, StoreError> {
        let path = self.entry_path(namespace, key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // A corrupt entry counts as a miss rather than an error, so one bad
        // file cannot wedge a request that could still go to the network.
        match serde_json::from_str::<DiskEntry>(&content) {
            Ok(entry) => Ok(Some(CachedResponse {
                response: entry.response,
                cached_at: entry.cached_at,
            })),
            Err(e) => {
                warn!(namespace, key, error = %e, "discarding unreadable cache entry");
                Ok(None)
            }
        }
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<bool, StoreError> {
        match fs::remove_file(self.entry_path(namespace, key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut namespaces = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                namespaces.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        namespaces.sort();
        Ok(namespaces)
    }

    fn remove_namespace(&self, namespace: &str) -> Result<bool, StoreError> {
        match fs::remove_dir_all(self.namespace_dir(namespace)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn size_report(&self) -> Result<SizeReport, StoreError> {
        let mut report = SizeReport::default();
        for namespace in self.list_namespaces()? {
            let mut entries = 0u64;
            let mut bytes = 0u64;
            for file in fs::read_dir(self.namespace_dir(&namespace))? {
                let file = file?;
                if file.file_type()?.is_file() {
                    entries += 1;
                    bytes += file.metadata()?.len();
                }
            }
            report.namespaces.push(NamespaceSize {
                namespace,
                entries,
                bytes,
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (DiskStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DiskStore::with_root(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    fn sample_response(body: &str) -> StoredResponse {
        StoredResponse::new(
            200,
            vec![("content-type".to_string(), "text/plain".to_string())],
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_put_creates_file_in_namespace_directory() {
        let (store, temp_dir) = create_test_store();

        store
            .put("static-v1", "https://tripmate.example/app.js", &sample_response("console.log(1)"))
            .expect("Put should succeed");

        let namespace_dir = temp_dir.path().join("static-v1");
        assert!(namespace_dir.exists(), "Namespace directory should exist");
        let files: Vec<_> = fs::read_dir(&namespace_dir)
            .expect("Should read namespace dir")
            .collect();
        assert_eq!(files.len(), 1, "Namespace should hold one entry file");
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();

        let result = store
            .get("static-v1", "https://tripmate.example/missing.js")
            .expect("Get should not error");

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_get_returns_stored_response_byte_identical() {
        let (store, _temp_dir) = create_test_store();
        let original = StoredResponse::new(
            200,
            vec![("content-type".to_string(), "application/octet-stream".to_string())],
            vec![0x00, 0x01, 0xfe, 0xff],
        );

        store
            .put("static-v1", "https://tripmate.example/blob", &original)
            .expect("Put should succeed");

        let cached = store
            .get("static-v1", "https://tripmate.example/blob")
            .expect("Get should not error")
            .expect("Entry should exist");

        assert_eq!(cached.response, original, "Stored bytes should match exactly");
    }

    #[test]
    fn test_keys_with_url_characters_map_to_safe_file_names() {
        let (store, temp_dir) = create_test_store();
        let key = "https://api.tripmate.example/api/cities/search?query=par/is&limit=10";

        store
            .put("api-v1", key, &sample_response("{}"))
            .expect("Put should succeed");

        let cached = store
            .get("api-v1", key)
            .expect("Get should not error")
            .expect("Entry should exist");
        assert_eq!(cached.response.body, b"{}".to_vec());

        // The raw URL must not appear in the directory tree
        for file in fs::read_dir(temp_dir.path().join("api-v1")).expect("Should read dir") {
            let name = file.expect("Dir entry").file_name();
            assert!(!name.to_string_lossy().contains('?'));
            assert!(!name.to_string_lossy().contains("https"));
        }
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let (store, _temp_dir) = create_test_store();
        let key = "https://tripmate.example/index.html";

        store
            .put("pages-v1", key, &sample_response("first"))
            .expect("First put should succeed");
        store
            .put("pages-v1", key, &sample_response("second"))
            .expect("Second put should succeed");

        let cached = store
            .get("pages-v1", key)
            .expect("Get should not error")
            .expect("Entry should exist");
        assert_eq!(cached.response.body, b"second".to_vec());
    }

    #[test]
    fn test_delete_removes_entry_and_reports_outcome() {
        let (store, _temp_dir) = create_test_store();
        let key = "https://tripmate.example/app.js";

        store
            .put("static-v1", key, &sample_response("x"))
            .expect("Put should succeed");

        assert!(store.delete("static-v1", key).expect("Delete should not error"));
        assert!(!store.delete("static-v1", key).expect("Second delete should not error"));
        assert!(store
            .get("static-v1", key)
            .expect("Get should not error")
            .is_none());
    }

    #[test]
    fn test_list_namespaces_returns_sorted_directories() {
        let (store, _temp_dir) = create_test_store();

        store
            .put("static-v2", "https://tripmate.example/a", &sample_response("a"))
            .expect("Put should succeed");
        store
            .put("api-v2", "https://tripmate.example/b", &sample_response("b"))
            .expect("Put should succeed");

        let namespaces = store.list_namespaces().expect("List should succeed");
        assert_eq!(namespaces, vec!["api-v2".to_string(), "static-v2".to_string()]);
    }

    #[test]
    fn test_list_namespaces_empty_when_root_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DiskStore::with_root(temp_dir.path().join("never-written"));

        let namespaces = store.list_namespaces().expect("List should succeed");
        assert!(namespaces.is_empty());
    }

    #[test]
    fn test_remove_namespace_deletes_all_entries_wholesale() {
        let (store, temp_dir) = create_test_store();

        for i in 0..5 {
            let key = format!("https://tripmate.example/asset-{}.css", i);
            store
                .put("static-v1", &key, &sample_response("body"))
                .expect("Put should succeed");
        }

        assert!(store
            .remove_namespace("static-v1")
            .expect("Remove should not error"));
        assert!(!temp_dir.path().join("static-v1").exists());
        assert!(!store
            .remove_namespace("static-v1")
            .expect("Second remove should not error"));
    }

    #[test]
    fn test_corrupt_entry_is_treated_as_miss() {
        let (store, temp_dir) = create_test_store();
        let key = "https://tripmate.example/app.js";

        store
            .put("static-v1", key, &sample_response("ok"))
            .expect("Put should succeed");

        // Clobber the entry file with invalid JSON
        let path = temp_dir
            .path()
            .join("static-v1")
            .join(entry_file_name(key));
        fs::write(&path, "{ not json").expect("Should overwrite entry file");

        let result = store.get("static-v1", key).expect("Get should not error");
        assert!(result.is_none(), "Corrupt entry should read as a miss");
    }

    #[test]
    fn test_size_report_counts_entries_and_bytes() {
        let (store, _temp_dir) = create_test_store();

        store
            .put("static-v1", "https://tripmate.example/a", &sample_response("aaaa"))
            .expect("Put should succeed");
        store
            .put("static-v1", "https://tripmate.example/b", &sample_response("bb"))
            .expect("Put should succeed");
        store
            .put("api-v1", "https://api.tripmate.example/api/cities", &sample_response("{}"))
            .expect("Put should succeed");

        let report = store.size_report().expect("Report should succeed");
        assert_eq!(report.namespaces.len(), 2);
        assert_eq!(report.total_entries(), 3);
        assert!(report.total_bytes() > 0);

        let static_ns = report
            .namespaces
            .iter()
            .find(|n| n.namespace == "static-v1")
            .expect("static-v1 should be reported");
        assert_eq!(static_ns.entries, 2);
    }

    #[test]
    fn test_cached_at_timestamp_is_recorded() {
        let (store, _temp_dir) = create_test_store();
        let key = "https://tripmate.example/app.js";

        let before = Utc::now();
        store
            .put("static-v1", key, &sample_response("x"))
            .expect("Put should succeed");
        let after = Utc::now();

        let cached = store
            .get("static-v1", key)
            .expect("Get should not error")
            .expect("Entry should exist");

        assert!(cached.cached_at >= before, "cached_at should be after write started");
        assert!(cached.cached_at <= after, "cached_at should be before write finished");
    }

    #[test]
    fn test_open_uses_xdg_compliant_path() {
        if let Ok(store) = DiskStore::open() {
            let path_str = store.root.to_string_lossy();
            assert!(
                path_str.contains("tripcache"),
                "Cache path should contain project name"
            );
        }
        // Test passes if open() fails (e.g., no home directory in CI)
    }
}
