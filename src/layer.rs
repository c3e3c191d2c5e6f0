//! The offline layer context
//!
//! `OfflineLayer` owns the pieces as one explicitly constructed object: the
//! store, the router over it, the sync queue, the HTTP client, and the
//! lifecycle phase. Nothing here is global state; tests assemble a layer
//! around an in-memory store and a scripted network.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::OfflineConfig;
use crate::control::{ControlMessage, ControlReply};
use crate::lifecycle::{self, ActivateReport, InstallReport, Phase};
use crate::net::{ApiClient, NetError};
use crate::router::{Request, RouteError, Routed, Router};
use crate::store::{CacheStore, DiskStore, NamespaceKind, StoreError, StoredResponse};
use crate::sync::{DrainReport, QueuedWrite, SyncError, SyncQueue};

/// Errors surfaced by layer operations
#[derive(Debug, Error)]
pub enum LayerError {
    /// Cache store operation failed
    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    /// Sync queue operation failed
    #[error("Sync queue error: {0}")]
    Sync(#[from] SyncError),

    /// Request routing failed
    #[error("Routing error: {0}")]
    Route(#[from] RouteError),

    /// Direct network operation failed
    #[error("Network error: {0}")]
    Net(#[from] NetError),
}

/// Outcome of saving a write through the layer
#[derive(Debug)]
pub enum SaveOutcome {
    /// The backend accepted the write directly; its response
    Sent(StoredResponse),
    /// The write was captured into the queue for later replay
    Queued(QueuedWrite),
}

/// The assembled offline layer
pub struct OfflineLayer<S> {
    config: Arc<OfflineConfig>,
    store: Arc<S>,
    router: Router<S>,
    queue: SyncQueue,
    api: ApiClient,
    phase: Phase,
    /// When set, every network attempt fails immediately
    force_offline: bool,
}

impl OfflineLayer<DiskStore> {
    /// Opens a layer with on-disk storage at the configured or default paths
    pub fn open(config: OfflineConfig) -> Result<Self, LayerError> {
        let store = match &config.cache_dir {
            Some(dir) => DiskStore::with_root(dir.join("store")),
            None => DiskStore::open()?,
        };
        let queue = match &config.cache_dir {
            Some(dir) => SyncQueue::open(dir.join("queue"))?,
            None => SyncQueue::open_default()?,
        };
        Ok(Self::assemble(config, store, queue))
    }
}

impl<S: CacheStore> OfflineLayer<S> {
    /// Assembles a layer from explicit parts
    ///
    /// Lets tests combine an in-memory store with a queue in a temporary
    /// directory.
    pub fn with_parts(config: OfflineConfig, store: S, queue: SyncQueue) -> Self {
        Self::assemble(config, store, queue)
    }

    fn assemble(config: OfflineConfig, store: S, queue: SyncQueue) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(store);
        let router = Router::new(store.clone(), config.clone());
        Self {
            config,
            store,
            router,
            queue,
            api: ApiClient::new(),
            phase: Phase::Installing,
            force_offline: false,
        }
    }

    /// Disables network access, forcing every strategy down its offline path
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.force_offline = offline;
        self
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The active configuration
    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// The underlying cache store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The deferred write queue
    pub fn queue(&self) -> &SyncQueue {
        &self.queue
    }

    /// Precaches the configured manifest and moves to the waiting phase
    ///
    /// Failures are recorded in the report, never fatal.
    pub async fn install(&mut self) -> InstallReport {
        self.phase = Phase::Installing;
        let api = self.api.clone();
        let offline = self.force_offline;
        let report = lifecycle::install(self.store.as_ref(), &self.config, move |url| {
            let api = api.clone();
            async move {
                if offline {
                    return Err(NetError::Offline);
                }
                api.get(&url).await
            }
        })
        .await;
        self.phase = Phase::Waiting;
        report
    }

    /// Sweeps stale cache versions and begins serving
    pub fn activate(&mut self) -> Result<ActivateReport, LayerError> {
        let report = lifecycle::activate(self.store.as_ref(), &self.config)?;
        self.phase = Phase::Active;
        Ok(report)
    }

    /// Routes a GET request through the cache strategies
    ///
    /// Non-GET requests are not intercepted by the layer; send those with
    /// `passthrough` or `save`.
    pub async fn fetch(&self, request: &Request) -> Result<Routed, LayerError> {
        let api = self.api.clone();
        let url = request.url().as_str().to_string();
        let offline = self.force_offline;
        let routed = self
            .router
            .route(request, move || async move {
                if offline {
                    return Err(NetError::Offline);
                }
                api.get(&url).await
            })
            .await?;
        Ok(routed)
    }

    /// Sends a request directly, bypassing every cache
    pub async fn passthrough(
        &self,
        method: &str,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<StoredResponse, LayerError> {
        if self.force_offline {
            return Err(NetError::Offline.into());
        }
        Ok(self.api.send(method, url, payload).await?)
    }

    /// Saves a write: sent directly when the network accepts it, queued when
    /// it does not
    ///
    /// # Arguments
    /// * `endpoint` - API path of the write (e.g. `/api/itineraries`)
    /// * `payload` - JSON body to send
    pub async fn save(&self, endpoint: &str, payload: Value) -> Result<SaveOutcome, LayerError> {
        if !self.force_offline {
            let url = self.config.api_url(endpoint);
            match self.api.post_json(&url, &payload).await {
                Ok(response) => return Ok(SaveOutcome::Sent(response)),
                Err(e) => {
                    debug!(endpoint = %endpoint, error = %e, "direct save failed, queueing write")
                }
            }
        }
        let entry = self.queue.enqueue(endpoint, payload)?;
        Ok(SaveOutcome::Queued(entry))
    }

    /// Whether the backend health endpoint is currently reachable
    pub async fn is_online(&self) -> bool {
        if self.force_offline {
            return false;
        }
        self.api.probe(&self.config.health_url()).await
    }

    /// Replays the deferred write queue
    ///
    /// Meant to be called once when connectivity returns; entries that still
    /// fail remain queued for the next call.
    pub async fn sync(&self) -> Result<DrainReport, LayerError> {
        let api = self.api.clone();
        let config = self.config.clone();
        let offline = self.force_offline;
        let report = self
            .queue
            .drain(move |entry| {
                let api = api.clone();
                let url = config.api_url(&entry.endpoint);
                async move {
                    if offline {
                        return Err(NetError::Offline);
                    }
                    api.post_json(&url, &entry.payload).await
                }
            })
            .await?;
        Ok(report)
    }

    /// Applies a control message and produces its reply
    pub fn handle_message(&mut self, message: ControlMessage) -> Result<ControlReply, LayerError> {
        match message {
            ControlMessage::SkipWaiting => {
                if self.phase != Phase::Active {
                    self.activate()?;
                }
                Ok(ControlReply::Ack)
            }
            ControlMessage::CacheRecord { key, payload } => {
                let namespace = self.config.namespace(NamespaceKind::Api);
                self.store
                    .put(&namespace, &key, &StoredResponse::json(200, &payload))?;
                Ok(ControlReply::Ack)
            }
            ControlMessage::ClearAll => {
                for namespace in self.store.list_namespaces()? {
                    self.store.remove_namespace(&namespace)?;
                }
                Ok(ControlReply::Ack)
            }
            ControlMessage::ReportCacheSize => {
                Ok(ControlReply::CacheSize(self.store.size_report()?))
            }
        }
    }
}
