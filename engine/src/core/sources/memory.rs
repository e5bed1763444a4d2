//! In-memory Sources

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TextSource, TimingStore};
use crate::core::lyrics::LyricLine;
use crate::core::persistence::{restore_lines, SaveReceipt, SaveRequest};
use crate::core::{CoreError, CoreResult, TrackKey};

// =============================================================================
// Memory Text Source
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryTextSource {
    texts: RwLock<HashMap<TrackKey, String>>,
}

impl MemoryTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: &TrackKey, text: &str) {
        self.texts.write().await.insert(key.clone(), text.to_string());
    }
}

#[async_trait]
impl TextSource for MemoryTextSource {
    async fn load_track_text(&self, key: &TrackKey) -> CoreResult<String> {
        self.texts
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::TextNotFound(key.to_string()))
    }
}

// =============================================================================
// Memory Timing Store
// =============================================================================

/// Timing store kept in memory.
///
/// Saves can be made to fail on demand, and invalidations are counted so
/// callers can verify cache discipline.
#[derive(Debug, Default)]
pub struct MemoryTimingStore {
    documents: RwLock<HashMap<TrackKey, SaveRequest>>,
    fail_saves: AtomicBool,
    invalidations: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryTimingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds stored timings for `key`
    pub async fn insert(&self, key: &TrackKey, lines: Vec<LyricLine>, authorship: Option<&str>) {
        self.documents.write().await.insert(
            key.clone(),
            SaveRequest {
                lines,
                authorship: authorship.map(str::to_string),
            },
        );
    }

    /// Returns what is currently stored for `key`
    pub async fn stored(&self, key: &TrackKey) -> Option<SaveRequest> {
        self.documents.read().await.get(key).cloned()
    }

    /// Makes subsequent saves report failure
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimingStore for MemoryTimingStore {
    async fn load_lines(&self, key: &TrackKey) -> CoreResult<Vec<LyricLine>> {
        Ok(self
            .documents
            .read()
            .await
            .get(key)
            .map(|doc| restore_lines(doc.lines.clone()))
            .unwrap_or_default())
    }

    async fn load_authorship(&self, key: &TrackKey) -> CoreResult<Option<String>> {
        Ok(self
            .documents
            .read()
            .await
            .get(key)
            .and_then(|doc| doc.authorship.clone()))
    }

    async fn save(&self, key: &TrackKey, request: &SaveRequest) -> CoreResult<SaveReceipt> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Ok(SaveReceipt::failed("Timing store unavailable"));
        }
        self.documents
            .write()
            .await
            .insert(key.clone(), request.clone());
        Ok(SaveReceipt::ok())
    }

    async fn invalidate_cache(&self, _key: &TrackKey) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}
