//! Deferred write queue for offline saves
//!
//! Writes that happen while offline are appended here instead of being sent,
//! one JSON file per entry. When connectivity returns the queue is drained
//! serially in insertion order: an entry is removed only after its endpoint
//! acknowledges the replay, and a failed entry is left untouched for the
//! next drain. There is no retry backoff; draining happens when the caller
//! says the network is back.

use std::fs;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::net::NetError;
use crate::store::StoredResponse;

/// Process-local tiebreaker for entries queued within the same millisecond
static QUEUE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Errors that can occur when persisting or draining the queue
#[derive(Debug, Error)]
pub enum SyncError {
    /// Filesystem operation failed
    #[error("Queue I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a queue entry
    #[error("Failed to serialize queue entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No data directory could be determined for this platform
    #[error("No data directory available (no home directory?)")]
    NoQueueDir,
}

/// A write captured while offline, waiting to be replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedWrite {
    /// Queue-assigned identifier; sorts in insertion order
    pub id: String,
    /// API path the write was destined for
    pub endpoint: String,
    /// The JSON body to send
    pub payload: Value,
    /// When the write was queued
    pub queued_at: DateTime<Utc>,
    /// Whether the endpoint has acknowledged the replay
    pub synced: bool,
}

/// Outcome of draining the queue once
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrainReport {
    /// Entries acknowledged and removed, marked `synced`
    pub synced: Vec<QueuedWrite>,
    /// Ids of entries that failed and remain queued
    pub failed: Vec<String>,
}

/// Durable FIFO queue of deferred writes
///
/// Entries are JSON files named by id, so insertion order is directory
/// order. The queue has a single owner; drains are expected to be triggered
/// one at a time, when connectivity returns.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    /// Directory holding one file per queued write
    dir: PathBuf,
}

impl SyncQueue {
    /// Opens the queue at the XDG-compliant data location
    ///
    /// Uses `~/.local/share/tripcache/queue/` on Linux. The queue lives
    /// under the data directory rather than the cache directory so clearing
    /// caches cannot drop unsent writes.
    pub fn open_default() -> Result<Self, SyncError> {
        let project_dirs = ProjectDirs::from("", "", "tripcache").ok_or(SyncError::NoQueueDir)?;
        Self::open(project_dirs.data_dir().join("queue"))
    }

    /// Opens a queue rooted at a custom directory, creating it if needed
    pub fn open(dir: PathBuf) -> Result<Self, SyncError> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Appends a write to the queue
    ///
    /// # Arguments
    /// * `endpoint` - API path the write should be replayed to
    /// * `payload` - JSON body of the write
    ///
    /// # Returns
    /// The persisted entry, with its assigned id.
    pub fn enqueue(&self, endpoint: &str, payload: Value) -> Result<QueuedWrite, SyncError> {
        let entry = QueuedWrite {
            id: next_id(),
            endpoint: endpoint.to_string(),
            payload,
            queued_at: Utc::now(),
            synced: false,
        };
        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(self.entry_path(&entry.id), json)?;
        debug!(id = %entry.id, endpoint = %entry.endpoint, "queued offline write");
        Ok(entry)
    }

    /// Returns all queued writes in insertion order
    ///
    /// An entry that cannot be parsed is skipped with a warning and left on
    /// disk for inspection; one bad file must not block the rest of the
    /// queue.
    pub fn pending(&self) -> Result<Vec<QueuedWrite>, SyncError> {
        let mut names: Vec<String> = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();

        let mut writes = Vec::with_capacity(names.len());
        for name in names {
            let path = self.dir.join(&name);
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<QueuedWrite>(&content) {
                Ok(write) => writes.push(write),
                Err(e) => warn!(file = %name, error = %e, "skipping unreadable queue entry"),
            }
        }
        Ok(writes)
    }

    /// Number of queued writes
    pub fn len(&self) -> Result<usize, SyncError> {
        Ok(self.pending()?.len())
    }

    /// Whether the queue holds no writes
    pub fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len()? == 0)
    }

    /// Removes an entry by id
    ///
    /// # Returns
    /// * `Ok(true)` if the entry existed and was removed
    /// * `Ok(false)` if there was nothing to remove
    pub fn remove(&self, id: &str) -> Result<bool, SyncError> {
        match fs::remove_file(self.entry_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Replays queued writes in insertion order
    ///
    /// Entries are sent one at a time; each is removed only after `send`
    /// returns a 2xx acknowledgement. A failed entry stays queued untouched
    /// and the drain moves on to the next, so a single dead endpoint cannot
    /// block the rest.
    ///
    /// # Arguments
    /// * `send` - Sends one entry to its endpoint
    pub async fn drain<F, Fut>(&self, send: F) -> Result<DrainReport, SyncError>
    where
        F: Fn(QueuedWrite) -> Fut,
        Fut: Future<Output = Result<StoredResponse, NetError>>,
    {
        let entries = self.pending()?;
        let mut report = DrainReport::default();

        for entry in entries {
            match send(entry.clone()).await {
                Ok(response) if response.is_success() => {
                    self.remove(&entry.id)?;
                    debug!(id = %entry.id, endpoint = %entry.endpoint, "queued write replayed");
                    let mut synced = entry;
                    synced.synced = true;
                    report.synced.push(synced);
                }
                Ok(response) => {
                    warn!(
                        id = %entry.id,
                        status = response.status,
                        "sync replay rejected, entry retained"
                    );
                    report.failed.push(entry.id);
                }
                Err(e) => {
                    warn!(id = %entry.id, error = %e, "sync replay failed, entry retained");
                    report.failed.push(entry.id);
                }
            }
        }

        if !report.synced.is_empty() || !report.failed.is_empty() {
            info!(
                synced = report.synced.len(),
                failed = report.failed.len(),
                "sync queue drained"
            );
        }
        Ok(report)
    }
}

/// Generates an id that sorts lexicographically in insertion order
fn next_id() -> String {
    let seq = QUEUE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{:020}-{:06}", Utc::now().timestamp_millis(), seq)
}
