//! Collaborator Interfaces
//!
//! The engine reads lyric text and stored timings through these traits.
//!
//! - `file.rs`   - filesystem-backed sources
//! - `memory.rs` - in-memory sources for tooling and tests

use async_trait::async_trait;

use crate::core::lyrics::LyricLine;
use crate::core::persistence::{SaveReceipt, SaveRequest};
use crate::core::{CoreResult, TrackKey};

mod file;
mod memory;

pub use file::{FileTextSource, FileTimingStore, TEXTS_DIR_NAME, TIMINGS_DIR_NAME};
pub use memory::{MemoryTextSource, MemoryTimingStore};

// =============================================================================
// Text Source
// =============================================================================

/// Supplies the raw multi-line lyric text of a track
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Loads the opaque lyric text for `key`
    async fn load_track_text(&self, key: &TrackKey) -> CoreResult<String>;

    /// Drops any cached text for `key`
    async fn invalidate_cache(&self, _key: &TrackKey) {}
}

// =============================================================================
// Timing Store
// =============================================================================

/// Stores timed lines and the authorship string of a track
#[async_trait]
pub trait TimingStore: Send + Sync {
    /// Loads previously saved lines; an unknown track yields an empty list
    async fn load_lines(&self, key: &TrackKey) -> CoreResult<Vec<LyricLine>>;

    /// Loads the stored authorship string
    async fn load_authorship(&self, key: &TrackKey) -> CoreResult<Option<String>>;

    /// Persists lines and authorship
    async fn save(&self, key: &TrackKey, request: &SaveRequest) -> CoreResult<SaveReceipt>;

    /// Drops any cached reads for `key`
    async fn invalidate_cache(&self, key: &TrackKey);
}
