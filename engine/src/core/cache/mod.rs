//! Read Cache
//!
//! Per-track cache for collaborator reads. The cache is an injected object
//! owned by the source that uses it; callers invalidate explicitly before a
//! fresh load and after a successful save.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::TrackKey;

/// Cache statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Track-keyed cache of read results
#[derive(Clone, Debug)]
pub struct ReadCache<V> {
    entries: Arc<RwLock<HashMap<TrackKey, V>>>,
    stats: Arc<RwLock<CacheStats>>,
    enabled: bool,
}

impl<V: Clone + Send + Sync> Default for ReadCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> ReadCache<V> {
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// Creates a cache; a disabled cache never stores anything
    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn get(&self, key: &TrackKey) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let value = self.entries.read().await.get(key).cloned();
        let mut stats = self.stats.write().await;
        if value.is_some() {
            stats.hits += 1;
            debug!(%key, "read cache hit");
        } else {
            stats.misses += 1;
        }
        value
    }

    pub async fn put(&self, key: &TrackKey, value: V) {
        if !self.enabled {
            return;
        }
        self.entries.write().await.insert(key.clone(), value);
    }

    /// Drops the entry for `key`
    pub async fn invalidate(&self, key: &TrackKey) {
        let removed = self.entries.write().await.remove(key).is_some();
        self.stats.write().await.invalidations += 1;
        if removed {
            debug!(%key, "read cache entry invalidated");
        }
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.read().await;
        stats.entries = self.len().await;
        stats
    }
}
