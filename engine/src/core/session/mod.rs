//! Sync Session
//!
//! Facade tying the load coordinator, the editor, and the host clock
//! together. This is the surface a host (UI shell, CLI) talks to.

use std::sync::Arc;

use crate::core::editor::EditorSnapshot;
use crate::core::loader::{LoadCoordinator, LoadOutcome, LoadTicket, SaveOutcome};
use crate::core::playback::{AudioClock, ClockEvent, PlaybackMatcher};
use crate::core::settings::EngineSettings;
use crate::core::sources::{TextSource, TimingStore};
use crate::core::{CoreResult, Epoch, TimeField, TimeSec, TrackKey};

#[derive(Clone)]
pub struct SyncSession {
    coordinator: LoadCoordinator,
    clock: Arc<dyn AudioClock>,
    matcher: PlaybackMatcher,
}

impl SyncSession {
    pub fn new(
        text_source: Arc<dyn TextSource>,
        timing_store: Arc<dyn TimingStore>,
        clock: Arc<dyn AudioClock>,
    ) -> Self {
        Self::with_settings(text_source, timing_store, clock, &EngineSettings::default())
    }

    pub fn with_settings(
        text_source: Arc<dyn TextSource>,
        timing_store: Arc<dyn TimingStore>,
        clock: Arc<dyn AudioClock>,
        settings: &EngineSettings,
    ) -> Self {
        let coordinator = LoadCoordinator::new(text_source, timing_store, Arc::clone(&clock))
            .with_authorship_timeout(settings.authorship_timeout());
        Self {
            coordinator,
            clock,
            matcher: PlaybackMatcher::new(settings.playback.start_guard_sec),
        }
    }

    // -------------------------------------------------------------------------
    // Loading / Saving
    // -------------------------------------------------------------------------

    /// Opens `key`, replacing whatever was loaded
    pub async fn open(&self, key: TrackKey) -> CoreResult<LoadOutcome> {
        self.coordinator.open(key).await
    }

    /// Synchronous half of [`open`](Self::open); clears visible state now
    pub fn begin_open(&self, key: TrackKey) -> CoreResult<LoadTicket> {
        self.coordinator.begin(key)
    }

    /// Asynchronous half of [`open`](Self::open)
    pub async fn finish_open(&self, ticket: &LoadTicket) -> CoreResult<LoadOutcome> {
        self.coordinator.load(ticket).await
    }

    pub async fn save(&self) -> CoreResult<SaveOutcome> {
        self.coordinator.save().await
    }

    // -------------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------------

    /// Stamps `field` of line `index` with the clock's current time
    pub fn set_line_time(&self, index: usize, field: TimeField) -> CoreResult<TimeSec> {
        let now = self.clock.current_time();
        self.coordinator
            .with_editor(|editor| editor.set_line_time(index, field, now))?;
        Ok(now)
    }

    pub fn clear_end_time(&self, index: usize) -> CoreResult<bool> {
        self.coordinator
            .with_editor(|editor| editor.clear_end_time(index))
    }

    /// Seeks the clock to the start of line `index`
    pub fn seek_to_line(&self, index: usize) -> CoreResult<TimeSec> {
        let start = self
            .coordinator
            .with_editor(|editor| editor.line_start(index))?;
        self.clock.seek(start);
        Ok(start)
    }

    // -------------------------------------------------------------------------
    // Playback
    // -------------------------------------------------------------------------

    /// Applies a host clock notification and returns the line to highlight
    pub fn handle_clock_event(&self, event: &ClockEvent) -> Option<usize> {
        if let Some(duration) = event.known_duration() {
            self.coordinator
                .with_editor(|editor| editor.apply_duration(duration));
        }
        self.active_index()
    }

    /// Line to highlight at the clock's current position
    pub fn active_index(&self) -> Option<usize> {
        let current_time = self.clock.current_time();
        let is_playing = self.clock.is_playing();
        self.coordinator.with_editor(|editor| {
            self.matcher.active_index(
                editor.lines(),
                Some(editor.authorship()),
                current_time,
                is_playing,
            )
        })
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> EditorSnapshot {
        self.coordinator.snapshot()
    }

    pub fn epoch(&self) -> Epoch {
        self.coordinator.current_epoch()
    }

    pub fn clock(&self) -> &Arc<dyn AudioClock> {
        &self.clock
    }
}
