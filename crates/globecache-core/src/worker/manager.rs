//! The offline cache manager.
//!
//! `OfflineCacheManager` reacts to the host's lifecycle events:
//!
//! - install: pre-cache the static asset list into `<version>-static`
//! - activate: delete every partition that is not from the current version
//! - fetch: stale-while-revalidate against `<version>-runtime`
//! - message: `SKIP_WAITING` and `CACHE_URLS`
//! - sync: best-effort refresh of one designated resource
//!
//! Handlers hold no state between events apart from the lifecycle signals.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tracing::{debug, error, info, warn};

use super::lifecycle::{Lifecycle, WorkerState};
use super::message::ClientMessage;
use super::wait_until::WaitUntil;
use crate::config::WorkerConfig;
use crate::error::{truncate_url, WorkerError, WorkerResult};
use crate::models::{Request, Response};
use crate::network::Fetcher;
use crate::storage::CacheStorage;

/// Status a network response must have to be written to the runtime partition
const CACHEABLE_STATUS: u16 = 200;

/// A lifecycle event delivered by the host.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    /// Raw data posted by a page
    Message(serde_json::Value),
    /// Background sync trigger with its tag
    Sync(String),
}

/// How a fetch interception was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself
    PassThrough,
    /// Stored response served immediately while a refresh runs in the background
    Cached(Response),
    /// Nothing was cached; this is the network's answer
    Network(Response),
    /// Nothing was cached and the network failed; synthesized offline page
    Offline(Response),
}

impl FetchOutcome {
    /// The response handed back to the page, if the worker answered
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Cached(r) | FetchOutcome::Network(r) | FetchOutcome::Offline(r) => Some(r),
        }
    }
}

/// Per-URL result of a bulk cache warm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    SkipWaiting,
    Warmed(WarmReport),
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The resource was fetched and parsed; `records` counts top-level items
    Completed { records: usize },
    Failed(String),
    /// The tag is not one this worker handles
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed,
    Activated { deleted: Vec<String> },
    Fetch(FetchOutcome),
    Message(MessageOutcome),
    Sync(SyncOutcome),
}

/// Clone is cheap - all shared parts sit behind Arc.
#[derive(Clone)]
pub struct OfflineCacheManager {
    config: Arc<WorkerConfig>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: Arc<Lifecycle>,
}

impl OfflineCacheManager {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            fetcher,
            lifecycle: Arc::new(Lifecycle::default()),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Route one event to its handler
    pub async fn dispatch(
        &self,
        event: WorkerEvent,
        wait_until: &mut WaitUntil,
    ) -> WorkerResult<EventOutcome> {
        match event {
            WorkerEvent::Install => self.install().await.map(|_| EventOutcome::Installed),
            WorkerEvent::Activate => self
                .activate()
                .await
                .map(|deleted| EventOutcome::Activated { deleted }),
            WorkerEvent::Fetch(request) => self
                .handle_fetch(request, wait_until)
                .await
                .map(EventOutcome::Fetch),
            WorkerEvent::Message(data) => self.handle_message(&data).await.map(EventOutcome::Message),
            WorkerEvent::Sync(tag) => Ok(EventOutcome::Sync(self.handle_sync(&tag).await)),
        }
    }

    // ===== Install =====

    /// Pre-cache every static asset. All-or-nothing: if any asset fails to
    /// fetch, nothing from this attempt is stored and the install fails.
    pub async fn install(&self) -> WorkerResult<()> {
        info!(version = %self.config.version, "Installing");
        self.lifecycle.set_state(WorkerState::Installing);

        match self.precache_static().await {
            Ok(count) => {
                info!(assets = count, "Installed successfully");
                self.lifecycle.set_state(WorkerState::Installed);
                self.lifecycle.skip_waiting();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Installation failed");
                self.lifecycle.set_state(WorkerState::Redundant);
                Err(WorkerError::Install(Box::new(e)))
            }
        }
    }

    async fn precache_static(&self) -> WorkerResult<usize> {
        let partition = self.config.static_cache_name();
        self.storage.open(&partition).await?;

        info!(partition = %partition, "Caching static assets");
        let requests = self
            .config
            .static_assets
            .iter()
            .map(|path| self.config.resolve(path).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(requests.iter().map(|request| self.fetch_ok(request))).await?;

        let entries: Vec<_> = requests
            .iter()
            .map(Request::cache_key)
            .zip(responses)
            .collect();
        let count = entries.len();
        self.storage.put_all(&partition, entries).await?;
        Ok(count)
    }

    /// Fetch for storing via add/addAll semantics: non-2xx is a failure
    async fn fetch_ok(&self, request: &Request) -> WorkerResult<Response> {
        let response = self.fetcher.fetch(request).await?;
        if !response.is_ok() {
            return Err(WorkerError::BadStatus {
                url: request.url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }

    // ===== Activate =====

    /// Delete every partition not belonging to the current version, then
    /// claim all clients. Returns the deleted names.
    pub async fn activate(&self) -> WorkerResult<Vec<String>> {
        info!("Activating");
        self.lifecycle.set_state(WorkerState::Activating);

        let old: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| !self.config.is_current_partition(name))
            .collect();

        try_join_all(old.iter().map(|name| async move {
            info!(partition = %name, "Deleting old cache");
            self.storage.delete(name).await
        }))
        .await?;

        self.lifecycle.set_state(WorkerState::Activated);
        info!(deleted = old.len(), "Activated successfully, offline ready");
        self.lifecycle.claim_clients();
        Ok(old)
    }

    // ===== Fetch =====

    /// Answer a request with stale-while-revalidate.
    ///
    /// With a runtime-cache hit the stored response is returned at once and
    /// the network refresh is registered on `wait_until`. Without one, the
    /// network leg is awaited.
    pub async fn handle_fetch(
        &self,
        request: Request,
        wait_until: &mut WaitUntil,
    ) -> WorkerResult<FetchOutcome> {
        if !request.is_interceptable() {
            return Ok(FetchOutcome::PassThrough);
        }

        let partition = self.config.runtime_cache_name();
        self.storage.open(&partition).await?;
        let cached = self
            .storage
            .match_request(&partition, &request.cache_key())
            .await?;

        match cached {
            Some(response) => {
                let worker = self.clone();
                wait_until.spawn(async move {
                    let url = truncate_url(request.url.as_str());
                    if let Err(e) = worker.revalidate(partition, request).await {
                        debug!(url = %url, error = %e, "Background refresh failed");
                    }
                });
                Ok(FetchOutcome::Cached(response))
            }
            None => self.revalidate(partition, request).await,
        }
    }

    /// The network leg: fetch, store a 200 copy, fall back to the offline
    /// page for HTML requests when the network is down.
    async fn revalidate(&self, partition: String, request: Request) -> WorkerResult<FetchOutcome> {
        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if response.status == CACHEABLE_STATUS {
                    self.storage
                        .put(&partition, request.cache_key(), response.clone())
                        .await?;
                }
                Ok(FetchOutcome::Network(response))
            }
            Err(e) => {
                info!(url = %truncate_url(request.url.as_str()), "Fetch failed");
                if request.accepts_html() {
                    Ok(FetchOutcome::Offline(Response::html(&self.config.offline_page)))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    // ===== Message =====

    pub async fn handle_message(&self, data: &serde_json::Value) -> WorkerResult<MessageOutcome> {
        match ClientMessage::parse(data)? {
            Some(ClientMessage::SkipWaiting) => {
                self.lifecycle.skip_waiting();
                Ok(MessageOutcome::SkipWaiting)
            }
            Some(ClientMessage::CacheUrls { urls }) => {
                self.warm(&urls).await.map(MessageOutcome::Warmed)
            }
            None => {
                debug!("Ignoring unrecognized message");
                Ok(MessageOutcome::Ignored)
            }
        }
    }

    /// Fetch and store each URL in the runtime partition. Best-effort: a
    /// failing URL is reported and does not stop the others. Storage errors
    /// still fail the whole warm.
    pub async fn warm(&self, urls: &[String]) -> WorkerResult<WarmReport> {
        let partition = self.config.runtime_cache_name();
        self.storage.open(&partition).await?;

        let results = join_all(urls.iter().map(|url| async move {
            let request = Request::get(self.config.resolve(url)?);
            let response = self.fetch_ok(&request).await?;
            Ok::<_, WorkerError>((request, response))
        }))
        .await;

        let mut report = WarmReport::default();
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok((request, response)) => {
                    self.storage
                        .put(&partition, request.cache_key(), response)
                        .await?;
                    report.cached.push(url.clone());
                }
                Err(e) => {
                    warn!(url = %truncate_url(url), error = %e, "Failed to warm cache entry");
                    report.failed.push((url.clone(), e.to_string()));
                }
            }
        }
        info!(cached = report.cached.len(), failed = report.failed.len(), "Cache warm finished");
        Ok(report)
    }

    // ===== Background sync =====

    /// Re-fetch the sync resource and parse it as JSON. Nothing is stored;
    /// failures are logged only.
    pub async fn handle_sync(&self, tag: &str) -> SyncOutcome {
        if tag != self.config.sync_tag {
            debug!(tag, "Ignoring sync for unknown tag");
            return SyncOutcome::Ignored;
        }

        match self.fetch_sync_resource().await {
            Ok(records) => {
                info!(records, "Background sync completed");
                SyncOutcome::Completed { records }
            }
            Err(e) => {
                error!(error = %e, "Background sync failed");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    async fn fetch_sync_resource(&self) -> WorkerResult<usize> {
        let request = Request::get(self.config.resolve(&self.config.sync_resource)?);
        let response = self.fetcher.fetch(&request).await?;
        let data: serde_json::Value = response.json()?;
        Ok(match data {
            serde_json::Value::Array(items) => items.len(),
            serde_json::Value::Object(fields) => fields.len(),
            _ => 1,
        })
    }
}
