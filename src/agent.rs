//! The background cache agent.
//!
//! The agent owns the cache-generation lifecycle and decides, per intercepted
//! request, whether to answer from the cache or the network. It runs in an
//! execution context isolated from the pages it controls; its only side
//! effects are cache mutation and the stale-data broadcast.
//!
//! # Lifecycle
//!
//! ```text
//! Installing ──► Waiting ──► Activating ──► Active ──► Redundant
//!     │             ▲            │             │
//!     │ resolve     │ readiness  │ delete all  │ route every
//!     │ generation, │ signaled   │ stores not  │ intercepted
//!     │ precache    │ at once    │ on the      │ request
//!     │ manifest    │            │ keep-list   │
//! ```
//!
//! Install resolves the current generation, derives the store pair, and
//! precaches the manifest; a single entry failing is logged and skipped.
//! Activation snapshots the existing store names once and deletes everything
//! outside `{static-current, dynamic-current}`, then claims all open pages
//! without waiting for a reload. A superseded agent goes `Redundant` and
//! refuses further events.

use crate::config::AgentConfig;
use crate::error::{DugoutError, Result};
use crate::events::{PageChannel, PageMessage};
use crate::generation::{self, Generation, StoreNames};
use crate::net::Fetch;
use crate::routes::{Router, Strategy};
use crate::store::CacheBackend;
use crate::types::{FetchRequest, RequestMode, StoredResponse};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle state of a cache agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Resolving the generation and precaching the manifest.
    Installing,
    /// Installed and ready to activate.
    Waiting,
    /// Sweeping superseded stores and claiming pages.
    Activating,
    /// Intercepting requests.
    Active,
    /// Superseded by a newer agent; no longer receives events.
    Redundant,
}

/// The background interception agent.
pub struct CacheAgent {
    id: Uuid,
    config: AgentConfig,
    router: Router,
    generation: Generation,
    stores: StoreNames,
    backend: Arc<dyn CacheBackend>,
    fetcher: Arc<dyn Fetch>,
    pages: PageChannel,
    state: RwLock<AgentState>,
}

impl CacheAgent {
    /// Install a new agent: resolve the generation, open the store pair, and
    /// precache the manifest.
    ///
    /// Readiness is signaled immediately on return (the agent does not wait
    /// for existing pages to close); call [`activate`](Self::activate) next.
    pub async fn install(
        config: AgentConfig,
        backend: Arc<dyn CacheBackend>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        info!(agent = %id, "Installing cache agent");

        let generation = generation::resolve(fetcher.as_ref(), &config).await;
        let stores = StoreNames::for_generation(&generation);

        backend.open(&stores.static_store).await?;
        backend.open(&stores.dynamic_store).await?;

        for path in config.manifest.precache_paths() {
            if let Err(e) =
                Self::precache_entry(backend.as_ref(), fetcher.as_ref(), &stores, path).await
            {
                // One bad manifest entry never aborts the install
                warn!(path, error = %e, "Skipping manifest entry");
            }
        }

        info!(agent = %id, generation = %generation, "Install complete, readiness signaled");

        let pages = PageChannel::new(config.page_buffer);
        Ok(Self {
            id,
            router: Router::standard(&config),
            config,
            generation,
            stores,
            backend,
            fetcher,
            pages,
            state: RwLock::new(AgentState::Waiting),
        })
    }

    async fn precache_entry(
        backend: &dyn CacheBackend,
        fetcher: &dyn Fetch,
        stores: &StoreNames,
        path: &str,
    ) -> Result<()> {
        let request = FetchRequest::get(path);
        let response = fetcher
            .fetch(&request)
            .await
            .map_err(|e| DugoutError::AssetPrecache {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(DugoutError::AssetPrecache {
                path: path.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }

        backend.put(&stores.static_store, path, response).await
    }

    /// Activate the agent: delete every store not on the keep-list and take
    /// control of all open pages immediately.
    pub async fn activate(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state != AgentState::Waiting {
                return Err(DugoutError::InvalidState(format!(
                    "cannot activate from {:?}",
                    *state
                )));
            }
            *state = AgentState::Activating;
        }

        let keep = self.stores.keep_list();
        // Single snapshot of existing names; everything outside the pair is garbage
        let existing = self.backend.list_stores().await?;
        for name in existing {
            if !keep.contains(&name.as_str()) {
                self.backend.delete_store(&name).await?;
                info!(agent = %self.id, store = %name, "Deleted superseded store");
            }
        }

        info!(agent = %self.id, generation = %self.generation, "Claimed controlled pages");
        *self.state.write().await = AgentState::Active;
        Ok(())
    }

    /// Route an intercepted request and produce its response.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<StoredResponse> {
        {
            let state = self.state.read().await;
            if *state != AgentState::Active {
                return Err(DugoutError::InvalidState(format!(
                    "agent is {:?}, not Active",
                    *state
                )));
            }
        }

        let strategy = self.router.classify(request.path(), &self.config.manifest);
        debug!(agent = %self.id, url = %request.url, strategy = ?strategy, "Routing request");

        match strategy {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::VersionRefresh => self.version_refresh(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::OfflineFallback => self.offline_fallback(request).await,
        }
    }

    /// Prediction API: network first, cached copy plus one broadcast on
    /// network failure.
    async fn network_first(&self, request: &FetchRequest) -> Result<StoredResponse> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.backend
                        .put(&self.stores.dynamic_store, request.cache_key(), response.clone())
                        .await?;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Prediction fetch failed, trying cache");
                match self
                    .backend
                    .lookup(&self.stores.dynamic_store, request.cache_key())
                    .await?
                {
                    Some(cached) => {
                        self.pages.post(PageMessage::using_cached_data());
                        Ok(cached)
                    }
                    None => self.offline_fallback(request).await,
                }
            }
        }
    }

    /// Version descriptor: network first, success refreshes the static copy.
    async fn version_refresh(&self, request: &FetchRequest) -> Result<StoredResponse> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.backend
                        .put(&self.stores.static_store, request.cache_key(), response.clone())
                        .await?;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Version fetch failed, trying cache");
                match self
                    .backend
                    .lookup(&self.stores.static_store, request.cache_key())
                    .await?
                {
                    Some(cached) => Ok(cached),
                    None => self.offline_fallback(request).await,
                }
            }
        }
    }

    /// Team logos: cache first, long-lived; failures become an explicit
    /// not-found response rather than an error.
    async fn cache_first(&self, request: &FetchRequest) -> Result<StoredResponse> {
        if let Some(cached) = self
            .backend
            .lookup(&self.stores.static_store, request.cache_key())
            .await?
        {
            return Ok(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) if response.is_success() => {
                self.backend
                    .put(&self.stores.static_store, request.cache_key(), response.clone())
                    .await?;
                Ok(response)
            }
            Ok(response) => {
                debug!(url = %request.url, status = response.status, "Logo fetch non-200");
                Ok(StoredResponse::not_found())
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Logo fetch failed");
                Ok(StoredResponse::not_found())
            }
        }
    }

    /// Manifest assets: serve cached immediately, refresh in the background.
    async fn stale_while_revalidate(&self, request: &FetchRequest) -> Result<StoredResponse> {
        let cached = self
            .backend
            .lookup(&self.stores.static_store, request.cache_key())
            .await?;

        if let Some(cached) = cached {
            let backend = Arc::clone(&self.backend);
            let fetcher = Arc::clone(&self.fetcher);
            let store = self.stores.static_store.clone();
            let request = request.clone();

            // Fire-and-forget refresh; failures are logged only
            tokio::spawn(async move {
                match fetcher.fetch(&request).await {
                    Ok(response) if response.is_success() => {
                        if let Err(e) =
                            backend.put(&store, request.cache_key(), response).await
                        {
                            warn!(url = %request.url, error = %e, "Revalidation store failed");
                        }
                    }
                    Ok(response) => {
                        debug!(url = %request.url, status = response.status, "Revalidation non-200");
                    }
                    Err(e) => {
                        debug!(url = %request.url, error = %e, "Revalidation fetch failed");
                    }
                }
            });

            return Ok(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.backend
                        .put(&self.stores.static_store, request.cache_key(), response.clone())
                        .await?;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Asset fetch failed with empty cache");
                self.offline_fallback(request).await
            }
        }
    }

    /// Last resort: cached shell document for navigations, explicit failure
    /// for everything else.
    async fn offline_fallback(&self, request: &FetchRequest) -> Result<StoredResponse> {
        if request.mode == RequestMode::Navigate {
            if let Some(shell) = self
                .backend
                .lookup(&self.stores.static_store, &self.config.shell_path)
                .await?
            {
                debug!(url = %request.url, "Serving cached shell to offline navigation");
                return Ok(shell);
            }
        }
        Err(DugoutError::OfflineUnavailable(request.url.clone()))
    }

    /// Evict one dynamic-store entry so the next request for it goes to the
    /// network. Returns whether an entry was removed.
    ///
    /// May race a concurrent network-first repopulation of the same key; the
    /// outcome is at-least-once invalidation with eventual convergence.
    pub async fn evict_dynamic(&self, key: &str) -> Result<bool> {
        let removed = self
            .backend
            .delete_entry(&self.stores.dynamic_store, key)
            .await?;
        debug!(agent = %self.id, key, removed, "Evicted dynamic entry");
        Ok(removed)
    }

    /// Mark this agent superseded by a newer installed agent.
    pub async fn supersede(&self) {
        info!(agent = %self.id, "Agent superseded, going redundant");
        *self.state.write().await = AgentState::Redundant;
    }

    /// Attach a page to the broadcast channel.
    pub fn subscribe_pages(&self) -> broadcast::Receiver<PageMessage> {
        self.pages.subscribe()
    }

    /// Number of currently controlled pages.
    pub fn controlled_pages(&self) -> usize {
        self.pages.controlled_pages()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> AgentState {
        *self.state.read().await
    }

    /// The generation this agent serves.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// The store pair this agent owns.
    pub fn store_names(&self) -> &StoreNames {
        &self.stores
    }
}
