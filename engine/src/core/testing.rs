//! Test Collaborators
//!
//! Sources whose reads can be held open, so tests can interleave loads
//! deterministically.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::lyrics::LyricLine;
use crate::core::persistence::{SaveReceipt, SaveRequest};
use crate::core::sources::{MemoryTimingStore, TextSource, TimingStore};
use crate::core::{CoreError, CoreResult, TrackKey};

// =============================================================================
// Gated Text Source
// =============================================================================

/// Text source that blocks reads of selected tracks until released
#[derive(Default)]
pub struct GatedTextSource {
    texts: HashMap<TrackKey, String>,
    gates: HashMap<TrackKey, Arc<Notify>>,
}

impl GatedTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, key: &TrackKey, text: &str) -> Self {
        self.texts.insert(key.clone(), text.to_string());
        self
    }

    /// Holds reads of `key` until the returned gate is notified
    pub fn gate(&mut self, key: &TrackKey) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.insert(key.clone(), Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl TextSource for GatedTextSource {
    async fn load_track_text(&self, key: &TrackKey) -> CoreResult<String> {
        if let Some(gate) = self.gates.get(key) {
            gate.notified().await;
        }
        self.texts
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::TextNotFound(key.to_string()))
    }
}

// =============================================================================
// Slow Timing Store
// =============================================================================

/// Memory store whose authorship reads take `authorship_delay`, and whose
/// saves can be held until a gate is released. With `save_error` set, a
/// released save fails with `SourceUnavailable`.
pub struct SlowTimingStore {
    pub inner: MemoryTimingStore,
    pub authorship_delay: Duration,
    pub save_gate: Option<Arc<Notify>>,
    pub save_error: Option<String>,
}

impl SlowTimingStore {
    pub fn new(inner: MemoryTimingStore, authorship_delay: Duration) -> Self {
        Self {
            inner,
            authorship_delay,
            save_gate: None,
            save_error: None,
        }
    }
}

#[async_trait]
impl TimingStore for SlowTimingStore {
    async fn load_lines(&self, key: &TrackKey) -> CoreResult<Vec<LyricLine>> {
        self.inner.load_lines(key).await
    }

    async fn load_authorship(&self, key: &TrackKey) -> CoreResult<Option<String>> {
        tokio::time::sleep(self.authorship_delay).await;
        self.inner.load_authorship(key).await
    }

    async fn save(&self, key: &TrackKey, request: &SaveRequest) -> CoreResult<SaveReceipt> {
        if let Some(gate) = &self.save_gate {
            gate.notified().await;
        }
        if let Some(message) = &self.save_error {
            return Err(CoreError::SourceUnavailable(message.clone()));
        }
        self.inner.save(key, request).await
    }

    async fn invalidate_cache(&self, key: &TrackKey) {
        self.inner.invalidate_cache(key).await;
    }
}

/// Timing store whose every read fails
pub struct FailingTimingStore;

#[async_trait]
impl TimingStore for FailingTimingStore {
    async fn load_lines(&self, _key: &TrackKey) -> CoreResult<Vec<LyricLine>> {
        Err(CoreError::SourceUnavailable("timings offline".to_string()))
    }

    async fn load_authorship(&self, _key: &TrackKey) -> CoreResult<Option<String>> {
        Err(CoreError::SourceUnavailable("timings offline".to_string()))
    }

    async fn save(&self, _key: &TrackKey, _request: &SaveRequest) -> CoreResult<SaveReceipt> {
        Err(CoreError::SourceUnavailable("timings offline".to_string()))
    }

    async fn invalidate_cache(&self, _key: &TrackKey) {}
}
