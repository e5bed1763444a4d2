//! Audio Clock
//!
//! The host environment owns audio playback. The engine only reads its time
//! signal and issues transport commands, so the clock is a trait.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::core::{known_duration, TimeSec};

// =============================================================================
// Clock Trait
// =============================================================================

/// Playback clock owned by the host (audio element, native player, ...)
pub trait AudioClock: Send + Sync {
    /// Current playback position in seconds
    fn current_time(&self) -> TimeSec;

    /// Track duration, `None` until metadata has loaded
    fn duration(&self) -> Option<TimeSec>;

    /// Whether audio is currently playing
    fn is_playing(&self) -> bool;

    fn play(&self);

    fn pause(&self);

    fn seek(&self, time: TimeSec);
}

/// Notifications forwarded from the host clock
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClockEvent {
    /// Playback position advanced
    #[serde(rename_all = "camelCase")]
    TimeUpdate { current_time: TimeSec },
    /// Audio metadata loaded; raw duration may be NaN
    LoadedMetadata { duration: TimeSec },
    /// Playback reached the end of the track
    Ended,
}

impl ClockEvent {
    /// Returns the normalized duration for `LoadedMetadata` events
    pub fn known_duration(&self) -> Option<TimeSec> {
        match self {
            ClockEvent::LoadedMetadata { duration } => known_duration(*duration),
            _ => None,
        }
    }
}

// =============================================================================
// Manual Clock
// =============================================================================

#[derive(Debug, Default)]
struct ClockState {
    current_time: TimeSec,
    duration: Option<TimeSec>,
    playing: bool,
}

/// In-process clock driven by explicit calls.
///
/// Used by the CLI (stamping at a given time) and by tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    state: Mutex<ClockState>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock whose metadata is already loaded
    pub fn with_duration(duration: TimeSec) -> Self {
        let clock = Self::new();
        clock.set_duration(duration);
        clock
    }

    /// Moves the playhead without changing the play state
    pub fn set_time(&self, time: TimeSec) {
        self.state().current_time = time.max(0.0);
    }

    /// Sets the raw duration (NaN and negative values mean unknown)
    pub fn set_duration(&self, duration: TimeSec) {
        self.state().duration = known_duration(duration);
    }

    /// Advances the playhead by `delta` seconds, clamped to the duration
    pub fn advance(&self, delta: TimeSec) {
        let mut state = self.state();
        let next = (state.current_time + delta).max(0.0);
        state.current_time = match state.duration {
            Some(duration) => next.min(duration),
            None => next,
        };
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        // A panicked holder cannot leave the plain-data state inconsistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AudioClock for ManualClock {
    fn current_time(&self) -> TimeSec {
        self.state().current_time
    }

    fn duration(&self) -> Option<TimeSec> {
        self.state().duration
    }

    fn is_playing(&self) -> bool {
        self.state().playing
    }

    fn play(&self) {
        self.state().playing = true;
    }

    fn pause(&self) {
        self.state().playing = false;
    }

    fn seek(&self, time: TimeSec) {
        self.set_time(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_transport() {
        let clock = ManualClock::new();
        assert!(!clock.is_playing());
        assert_eq!(clock.duration(), None);

        clock.play();
        clock.advance(3.5);
        assert!(clock.is_playing());
        assert_eq!(clock.current_time(), 3.5);

        clock.pause();
        clock.seek(1.0);
        assert!(!clock.is_playing());
        assert_eq!(clock.current_time(), 1.0);
    }

    #[test]
    fn test_manual_clock_clamps_to_duration() {
        let clock = ManualClock::with_duration(10.0);
        clock.advance(25.0);
        assert_eq!(clock.current_time(), 10.0);

        clock.seek(-4.0);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn test_nan_duration_is_unknown() {
        let clock = ManualClock::new();
        clock.set_duration(f64::NAN);
        assert_eq!(clock.duration(), None);
    }

    #[test]
    fn test_clock_event_duration() {
        let event = ClockEvent::LoadedMetadata { duration: 201.3 };
        assert_eq!(event.known_duration(), Some(201.3));
        assert_eq!(
            ClockEvent::LoadedMetadata { duration: f64::NAN }.known_duration(),
            None
        );
        assert_eq!(ClockEvent::Ended.known_duration(), None);
    }

    #[test]
    fn test_clock_event_serialization() {
        let json = serde_json::to_string(&ClockEvent::TimeUpdate { current_time: 1.5 }).unwrap();
        assert_eq!(json, r#"{"type":"timeUpdate","currentTime":1.5}"#);

        let parsed: ClockEvent =
            serde_json::from_str(r#"{"type":"loadedMetadata","duration":200.0}"#).unwrap();
        assert_eq!(parsed, ClockEvent::LoadedMetadata { duration: 200.0 });
    }
}
