//! Timing Editor
//!
//! Holds the working line set for one track and applies user edits to it.
//!
//! # State Machine
//!
//! ```text
//! Idle -> Loading -> Ready(clean) -> Ready(dirty) -> Saving -> Ready(clean)
//!                                                          \-> Ready(dirty) + error
//! ```
//!
//! Edits stay allowed while a save is in flight. Every edit bumps a revision
//! counter; a successful save only marks the editor clean when no edit
//! happened after the save started.

use serde::Serialize;

use crate::core::lyrics::{authorship_index, LyricLine};
use crate::core::persistence::{prepare_save, SaveRequest};
use crate::core::reconcile;
use crate::core::{CoreError, CoreResult, TimeField, TimeSec, TrackKey};

// =============================================================================
// State
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorState {
    #[default]
    Idle,
    Loading,
    Ready,
    Saving,
}

/// Payload captured when a save starts
#[derive(Clone, Debug, PartialEq)]
pub struct SaveTicket {
    pub key: TrackKey,
    pub request: SaveRequest,
    /// Edit revision the request was built from
    pub revision: u64,
}

/// Read-only view of the editor for presentation
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub key: Option<TrackKey>,
    pub state: EditorState,
    pub lines: Vec<LyricLine>,
    pub authorship: String,
    pub duration: Option<TimeSec>,
    pub dirty: bool,
    pub saved: bool,
    pub last_error: Option<String>,
}

// =============================================================================
// Editor
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct Editor {
    key: Option<TrackKey>,
    lines: Vec<LyricLine>,
    authorship: String,
    duration: Option<TimeSec>,
    state: EditorState,
    dirty: bool,
    saved: bool,
    last_error: Option<String>,
    revision: u64,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Clears all visible state and enters `Loading` for `key`
    pub fn begin_loading(&mut self, key: TrackKey) {
        *self = Self {
            key: Some(key),
            state: EditorState::Loading,
            ..Self::default()
        };
    }

    /// Installs reconciled lines and enters `Ready(clean)`
    pub fn finish_loading(&mut self, lines: Vec<LyricLine>, authorship: &str) -> CoreResult<()> {
        if self.state != EditorState::Loading {
            return Err(self.invalid_state("finish loading"));
        }

        self.lines = lines;
        self.authorship = authorship.trim().to_string();
        self.state = EditorState::Ready;
        self.dirty = false;
        self.saved = false;
        self.last_error = None;

        if let Some(duration) = self.duration {
            reconcile::apply_duration(&mut self.lines, &self.authorship, duration);
        }
        Ok(())
    }

    /// Records the track duration and forces the authorship line to end there.
    ///
    /// Does not mark the editor dirty: the value is derived from the audio.
    pub fn apply_duration(&mut self, duration: TimeSec) -> bool {
        self.duration = Some(duration);
        reconcile::apply_duration(&mut self.lines, &self.authorship, duration)
    }

    // -------------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------------

    /// Stamps `field` of line `index` with `now`.
    ///
    /// Stamping a start also closes the previous line at the same instant,
    /// except on the authorship line, whose end is pinned to the duration.
    pub fn set_line_time(&mut self, index: usize, field: TimeField, now: TimeSec) -> CoreResult<()> {
        self.ensure_editable("set line time")?;
        self.ensure_index(index)?;
        if !now.is_finite() || now < 0.0 {
            return Err(CoreError::InvalidTime(now));
        }

        let is_authorship = self.authorship_index() == Some(index);
        match field {
            TimeField::Start => {
                self.lines[index].start_time = now;
                if is_authorship {
                    if let Some(duration) = self.duration {
                        self.lines[index].end_time = Some(duration);
                    }
                } else if index > 0 {
                    self.lines[index - 1].end_time = Some(now);
                }
            }
            TimeField::End => {
                self.lines[index].end_time = match (is_authorship, self.duration) {
                    (true, Some(duration)) => Some(duration),
                    _ => Some(now),
                };
            }
        }

        self.mark_dirty();
        Ok(())
    }

    /// Removes the end time of line `index`.
    ///
    /// Returns `false` without changes for the authorship line or a line
    /// that is already open-ended.
    pub fn clear_end_time(&mut self, index: usize) -> CoreResult<bool> {
        self.ensure_editable("clear end time")?;
        self.ensure_index(index)?;

        if self.authorship_index() == Some(index) {
            return Ok(false);
        }
        if self.lines[index].end_time.take().is_none() {
            return Ok(false);
        }

        self.mark_dirty();
        Ok(true)
    }

    /// Returns the start time of line `index` (seek target)
    pub fn line_start(&self, index: usize) -> CoreResult<TimeSec> {
        self.ensure_index(index)?;
        Ok(self.lines[index].start_time)
    }

    // -------------------------------------------------------------------------
    // Saving
    // -------------------------------------------------------------------------

    /// Enters `Saving` and captures the payload to persist
    pub fn begin_save(&mut self) -> CoreResult<SaveTicket> {
        if self.state != EditorState::Ready {
            return Err(self.invalid_state("save"));
        }
        let key = self
            .key
            .clone()
            .ok_or_else(|| CoreError::InvalidState("No track is open".to_string()))?;

        self.state = EditorState::Saving;
        self.last_error = None;

        Ok(SaveTicket {
            key,
            request: prepare_save(&self.lines, &self.authorship),
            revision: self.revision,
        })
    }

    /// Applies the outcome of the save started at `revision`.
    ///
    /// Returns `true` when the editor is clean afterwards.
    pub fn finish_save(&mut self, revision: u64, result: Result<(), String>) -> CoreResult<bool> {
        if self.state != EditorState::Saving {
            return Err(self.invalid_state("finish save"));
        }
        self.state = EditorState::Ready;

        match result {
            Ok(()) => {
                if revision == self.revision {
                    self.dirty = false;
                    self.saved = true;
                }
                Ok(!self.dirty)
            }
            Err(message) => {
                self.last_error = Some(message);
                Ok(false)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn key(&self) -> Option<&TrackKey> {
        self.key.as_ref()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn authorship(&self) -> &str {
        &self.authorship
    }

    pub fn duration(&self) -> Option<TimeSec> {
        self.duration
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Index of the authorship line, if present
    pub fn authorship_index(&self) -> Option<usize> {
        authorship_index(&self.lines, Some(&self.authorship))
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            key: self.key.clone(),
            state: self.state,
            lines: self.lines.clone(),
            authorship: self.authorship.clone(),
            duration: self.duration,
            dirty: self.dirty,
            saved: self.saved,
            last_error: self.last_error.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.saved = false;
        self.revision += 1;
    }

    fn ensure_editable(&self, action: &str) -> CoreResult<()> {
        match self.state {
            EditorState::Ready | EditorState::Saving => Ok(()),
            _ => Err(self.invalid_state(action)),
        }
    }

    fn ensure_index(&self, index: usize) -> CoreResult<()> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(CoreError::LineOutOfRange {
                index,
                len: self.lines.len(),
            })
        }
    }

    fn invalid_state(&self, action: &str) -> CoreError {
        CoreError::InvalidState(format!("Cannot {} while {:?}", action, self.state))
    }
}
