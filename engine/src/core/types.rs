//! LyricSync Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{fs::validate_path_id_component, CoreError, CoreResult};

// =============================================================================
// ID Types
// =============================================================================

/// Album identifier (catalog-assigned)
pub type AlbumId = String;

/// Track identifier (catalog-assigned)
pub type TrackId = String;

/// Language code (e.g. "en", "ko", "ja")
pub type LanguageCode = String;

/// Load epoch; increases every time the editor opens or switches track
pub type Epoch = u64;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Normalizes a duration reported by the host clock.
///
/// Hosts report `NaN` until audio metadata has loaded; non-finite and
/// negative values are treated as unknown.
pub fn known_duration(raw: f64) -> Option<TimeSec> {
    if raw.is_finite() && raw >= 0.0 {
        Some(raw)
    } else {
        None
    }
}

// =============================================================================
// Track Identity
// =============================================================================

/// Identity of the lyric sheet being edited: (album, track, language).
///
/// All loaded and edited state is scoped to exactly one key at a time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackKey {
    pub album_id: AlbumId,
    pub track_id: TrackId,
    pub language: LanguageCode,
}

impl TrackKey {
    pub fn new(album_id: &str, track_id: &str, language: &str) -> Self {
        Self {
            album_id: album_id.to_string(),
            track_id: track_id.to_string(),
            language: language.to_string(),
        }
    }

    /// Validates every component for use as a storage path segment
    pub fn validate(&self) -> CoreResult<()> {
        validate_path_id_component(&self.album_id, "albumId")
            .and_then(|_| validate_path_id_component(&self.track_id, "trackId"))
            .and_then(|_| validate_path_id_component(&self.language, "language"))
            .map_err(CoreError::InvalidTrackKey)
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.album_id, self.track_id, self.language)
    }
}

// =============================================================================
// Edit Targets
// =============================================================================

/// Which bound of a line a timing operation stamps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeField {
    Start,
    End,
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeField::Start => write!(f, "startTime"),
            TimeField::End => write!(f, "endTime"),
        }
    }
}
