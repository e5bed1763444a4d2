//! Playback Module
//!
//! - `clock.rs`   - host-owned audio clock abstraction
//! - `matcher.rs` - active-line computation for highlighting

mod clock;
mod matcher;

pub use clock::{AudioClock, ClockEvent, ManualClock};
pub use matcher::{active_index, PlaybackMatcher, DEFAULT_START_GUARD_SEC};
