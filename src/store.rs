//! Cache store abstraction.
//!
//! The host platform provides durable, versioned, named key→response storage;
//! [`CacheBackend`] is the seam the agent talks to. [`MemoryBackend`] is the
//! in-crate reference implementation, used by hosts without a native store
//! and by the test suite.
//!
//! All writes are idempotent overwrites, which is what the agent's
//! correctness relies on in the absence of a mutual-exclusion primitive.

use crate::error::Result;
use crate::types::StoredResponse;
use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Named key→response storage.
///
/// Store names are minted per cache generation; the agent is the only writer.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Open (create if absent) a named store.
    async fn open(&self, store: &str) -> Result<()>;

    /// Look up a response by key. A miss is `Ok(None)`, not an error.
    async fn lookup(&self, store: &str, key: &str) -> Result<Option<StoredResponse>>;

    /// Store a response under a key, overwriting any previous entry. Creates
    /// the store if it does not exist yet.
    async fn put(&self, store: &str, key: &str, response: StoredResponse) -> Result<()>;

    /// Delete a single entry. Returns whether an entry was removed.
    async fn delete_entry(&self, store: &str, key: &str) -> Result<bool>;

    /// Delete an entire named store. Returns whether the store existed.
    async fn delete_store(&self, store: &str) -> Result<bool>;

    /// List all store names, as a single snapshot.
    async fn list_stores(&self) -> Result<Vec<String>>;
}

/// Statistics for the in-memory backend.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Total lookup hits.
    pub hits: u64,
    /// Total lookup misses.
    pub misses: u64,
    /// Current number of stores.
    pub stores: usize,
    /// Current number of entries across all stores.
    pub entries: usize,
}

impl StoreStats {
    /// Calculate hit ratio.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Configuration for the in-memory backend.
#[derive(Debug, Clone)]
pub struct MemoryBackendConfig {
    /// Maximum entries per named store; least-recently-used entries are
    /// evicted beyond this.
    pub max_entries_per_store: usize,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            max_entries_per_store: 512,
        }
    }
}

/// In-memory reference implementation of [`CacheBackend`].
pub struct MemoryBackend {
    stores: RwLock<HashMap<String, LruCache<String, StoredResponse>>>,
    max_entries: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryBackend {
    /// Create a new backend.
    pub fn new(config: MemoryBackendConfig) -> Self {
        let max_entries =
            NonZeroUsize::new(config.max_entries_per_store).unwrap_or(NonZeroUsize::MIN);
        Self {
            stores: RwLock::new(HashMap::new()),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get backend statistics.
    pub async fn stats(&self) -> StoreStats {
        let stores = self.stores.read().await;
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: stores.len(),
            entries: stores.values().map(|s| s.len()).sum(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryBackendConfig::default())
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn open(&self, store: &str) -> Result<()> {
        let mut stores = self.stores.write().await;
        stores
            .entry(store.to_string())
            .or_insert_with(|| LruCache::new(self.max_entries));
        Ok(())
    }

    async fn lookup(&self, store: &str, key: &str) -> Result<Option<StoredResponse>> {
        let mut stores = self.stores.write().await;
        let found = stores
            .get_mut(store)
            .and_then(|entries| entries.get(key).cloned());

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    async fn put(&self, store: &str, key: &str, response: StoredResponse) -> Result<()> {
        let mut stores = self.stores.write().await;
        let entries = stores
            .entry(store.to_string())
            .or_insert_with(|| LruCache::new(self.max_entries));
        entries.put(key.to_string(), response);
        Ok(())
    }

    async fn delete_entry(&self, store: &str, key: &str) -> Result<bool> {
        let mut stores = self.stores.write().await;
        Ok(stores
            .get_mut(store)
            .and_then(|entries| entries.pop(key))
            .is_some())
    }

    async fn delete_store(&self, store: &str) -> Result<bool> {
        let mut stores = self.stores.write().await;
        Ok(stores.remove(store).is_some())
    }

    async fn list_stores(&self) -> Result<Vec<String>> {
        let stores = self.stores.read().await;
        Ok(stores.keys().cloned().collect())
    }
}
