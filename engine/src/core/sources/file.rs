//! File-backed Sources
//!
//! Storage layout under a root directory:
//!
//! ```text
//! {root}/texts/{album}/{track}/{lang}.txt
//! {root}/timings/{album}/{track}/{lang}.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{TextSource, TimingStore};
use crate::core::cache::ReadCache;
use crate::core::fs::{atomic_write_json_pretty, read_json_if_exists};
use crate::core::lyrics::LyricLine;
use crate::core::persistence::{SaveReceipt, SaveRequest, TimingDocument};
use crate::core::{CoreError, CoreResult, TrackKey};

/// Directory holding raw lyric text files
pub const TEXTS_DIR_NAME: &str = "texts";

/// Directory holding timing documents
pub const TIMINGS_DIR_NAME: &str = "timings";

fn track_file(base: &Path, key: &TrackKey, extension: &str) -> PathBuf {
    base.join(&key.album_id)
        .join(&key.track_id)
        .join(format!("{}.{}", key.language, extension))
}

// =============================================================================
// File Text Source
// =============================================================================

/// Reads lyric text from `{root}/texts/...`
#[derive(Clone, Debug)]
pub struct FileTextSource {
    texts_dir: PathBuf,
    cache: ReadCache<String>,
}

impl FileTextSource {
    pub fn new(root: &Path) -> Self {
        Self::with_cache(root, ReadCache::new())
    }

    pub fn with_cache(root: &Path, cache: ReadCache<String>) -> Self {
        Self {
            texts_dir: root.join(TEXTS_DIR_NAME),
            cache,
        }
    }

    /// Returns the text file path for a track
    pub fn text_path(&self, key: &TrackKey) -> PathBuf {
        track_file(&self.texts_dir, key, "txt")
    }

    pub fn cache(&self) -> &ReadCache<String> {
        &self.cache
    }
}

#[async_trait]
impl TextSource for FileTextSource {
    async fn load_track_text(&self, key: &TrackKey) -> CoreResult<String> {
        key.validate()?;
        if let Some(text) = self.cache.get(key).await {
            return Ok(text);
        }

        let path = self.text_path(key);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::TextNotFound(key.to_string()));
            }
            Err(e) => return Err(CoreError::IoError(e)),
        };

        debug!(%key, path = %path.display(), "loaded lyric text");
        self.cache.put(key, text.clone()).await;
        Ok(text)
    }

    async fn invalidate_cache(&self, key: &TrackKey) {
        self.cache.invalidate(key).await;
    }
}

// =============================================================================
// File Timing Store
// =============================================================================

/// Stores timing documents under `{root}/timings/...`
#[derive(Clone, Debug)]
pub struct FileTimingStore {
    timings_dir: PathBuf,
    cache: ReadCache<Option<TimingDocument>>,
}

impl FileTimingStore {
    pub fn new(root: &Path) -> Self {
        Self::with_cache(root, ReadCache::new())
    }

    pub fn with_cache(root: &Path, cache: ReadCache<Option<TimingDocument>>) -> Self {
        Self {
            timings_dir: root.join(TIMINGS_DIR_NAME),
            cache,
        }
    }

    /// Returns the timing document path for a track
    pub fn timing_path(&self, key: &TrackKey) -> PathBuf {
        track_file(&self.timings_dir, key, "json")
    }

    pub fn cache(&self) -> &ReadCache<Option<TimingDocument>> {
        &self.cache
    }

    /// Loads the stored document, if any
    pub async fn load_document(&self, key: &TrackKey) -> CoreResult<Option<TimingDocument>> {
        key.validate()?;
        if let Some(document) = self.cache.get(key).await {
            return Ok(document);
        }

        let document: Option<TimingDocument> =
            read_json_if_exists(&self.timing_path(key)).await?;
        if let Some(document) = &document {
            document.validate()?;
        }

        self.cache.put(key, document.clone()).await;
        Ok(document)
    }
}

#[async_trait]
impl TimingStore for FileTimingStore {
    async fn load_lines(&self, key: &TrackKey) -> CoreResult<Vec<LyricLine>> {
        Ok(self
            .load_document(key)
            .await?
            .map(TimingDocument::into_lines)
            .unwrap_or_default())
    }

    async fn load_authorship(&self, key: &TrackKey) -> CoreResult<Option<String>> {
        Ok(self
            .load_document(key)
            .await?
            .and_then(|document| document.authorship))
    }

    async fn save(&self, key: &TrackKey, request: &SaveRequest) -> CoreResult<SaveReceipt> {
        key.validate()?;

        let path = self.timing_path(key);
        let document = TimingDocument::from_request(request);
        let revision = document.revision.clone();

        let write_path = path.clone();
        tokio::task::spawn_blocking(move || atomic_write_json_pretty(&write_path, &document))
            .await
            .map_err(|e| CoreError::Internal(format!("Timing write task failed: {}", e)))??;

        info!(%key, %revision, lines = request.lines.len(), "saved timing document");
        Ok(SaveReceipt::ok())
    }

    async fn invalidate_cache(&self, key: &TrackKey) {
        self.cache.invalidate(key).await;
    }
}
