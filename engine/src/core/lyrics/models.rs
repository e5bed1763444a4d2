//! Lyric Line Models
//!
//! A lyric sheet is an ordered list of [`LyricLine`]s. Duplicate texts are
//! expected (a repeated chorus), so lines are identified by position, never
//! by text alone.

use serde::{Deserialize, Serialize};

use crate::core::TimeSec;

// =============================================================================
// Lyric Line
// =============================================================================

/// One text unit with its start and optional end time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    /// Line text (trimmed)
    pub text: String,
    /// Start time in seconds; `0.0` means not yet synced
    #[serde(default)]
    pub start_time: TimeSec,
    /// End time in seconds; `None` leaves the line open-ended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TimeSec>,
}

impl LyricLine {
    pub fn new(text: &str, start_time: TimeSec, end_time: Option<TimeSec>) -> Self {
        Self {
            text: text.to_string(),
            start_time,
            end_time,
        }
    }

    /// Creates a line that has not been synced yet
    pub fn unsynced(text: &str) -> Self {
        Self::new(text, 0.0, None)
    }

    /// Creates an open-ended line starting at `start_time`
    pub fn timed(text: &str, start_time: TimeSec) -> Self {
        Self::new(text, start_time, None)
    }

    /// Sets the end time
    pub fn with_end(mut self, end_time: TimeSec) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Returns true if the line has a real start time
    pub fn is_synced(&self) -> bool {
        self.start_time > 0.0
    }

    /// Returns true if the text is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Copies the timing of `other` while keeping this line's text
    pub fn with_timing_of(mut self, other: &LyricLine) -> Self {
        self.start_time = other.start_time;
        self.end_time = other.end_time;
        self
    }
}

// =============================================================================
// Authorship Line
// =============================================================================

/// Returns the index of the authorship line.
///
/// The authorship line is always last; it is recognised when the last line's
/// text equals the (trimmed, non-empty) authorship string.
pub fn authorship_index(lines: &[LyricLine], authorship: Option<&str>) -> Option<usize> {
    let authorship = authorship.map(str::trim).filter(|a| !a.is_empty())?;
    let last = lines.len().checked_sub(1)?;
    (lines[last].text.trim() == authorship).then_some(last)
}
