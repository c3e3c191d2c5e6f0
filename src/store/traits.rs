//! Storage backend trait for versioned response caches
//!
//! Defines the `CacheStore` trait implemented by the disk and in-memory
//! backends, plus the size report types returned by `size_report`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::response::{CachedResponse, StoredResponse};

/// Errors that can occur when reading or writing the cache
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a cache entry
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No cache directory could be determined for this platform
    #[error("No cache directory available (no home directory?)")]
    NoCacheDir,

    /// A lock guarding the in-memory store was poisoned
    #[error("Cache lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Storage backend for cached responses, partitioned into named namespaces
///
/// Namespaces are flat string tags (e.g. `static-v3`). Entries within a
/// namespace are keyed by request URL and hold a serialized response. There
/// is no per-entry expiry: an entry lives until it is overwritten, deleted,
/// or its whole namespace is removed.
pub trait CacheStore: Send + Sync {
    /// Writes a response under the given namespace and key, overwriting any
    /// previous entry
    fn put(&self, namespace: &str, key: &str, response: &StoredResponse) -> Result<(), StoreError>;

    /// Reads the entry for a key, if present
    fn get(&self, namespace: &str, key: &str) -> Result<Option<CachedResponse>, StoreError>;

    /// Removes a single entry
    ///
    /// # Returns
    /// * `Ok(true)` if an entry existed and was removed
    /// * `Ok(false)` if there was nothing to remove
    fn delete(&self, namespace: &str, key: &str) -> Result<bool, StoreError>;

    /// Lists every namespace that currently holds entries
    fn list_namespaces(&self) -> Result<Vec<String>, StoreError>;

    /// Deletes a namespace and all of its entries in one step
    ///
    /// # Returns
    /// * `Ok(true)` if the namespace existed and was removed
    /// * `Ok(false)` if there was nothing to remove
    fn remove_namespace(&self, namespace: &str) -> Result<bool, StoreError>;

    /// Reports entry counts and stored sizes per namespace
    fn size_report(&self) -> Result<SizeReport, StoreError>;
}

/// Entry count and stored size for a single namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceSize {
    /// Namespace tag, including its version suffix
    pub namespace: String,
    /// Number of entries stored
    pub entries: u64,
    /// Total size of the stored entries in bytes
    pub bytes: u64,
}

/// Cache usage summary across all namespaces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeReport {
    /// Per-namespace breakdown, sorted by namespace tag
    pub namespaces: Vec<NamespaceSize>,
}

impl SizeReport {
    /// Total number of entries across all namespaces
    pub fn total_entries(&self) -> u64 {
        self.namespaces.iter().map(|n| n.entries).sum()
    }

    /// Total stored bytes across all namespaces
    pub fn total_bytes(&self) -> u64 {
        self.namespaces.iter().map(|n| n.bytes).sum()
    }
}
