//! Active Line Matching
//!
//! Computes which line should be highlighted for the current playback time.
//!
//! Lines are NOT assumed to be sorted: unsynced lines keep `0.0` while later
//! lines may already carry real times, so matching is a linear scan.

use crate::core::lyrics::{authorship_index, LyricLine};
use crate::core::TimeSec;

/// Default tolerance (seconds) around the first line's start during which a
/// paused player shows no highlight.
pub const DEFAULT_START_GUARD_SEC: TimeSec = 0.05;

/// Returns the active line index using the default start guard
pub fn active_index(
    lines: &[LyricLine],
    authorship: Option<&str>,
    current_time: TimeSec,
    is_playing: bool,
) -> Option<usize> {
    PlaybackMatcher::default().active_index(lines, authorship, current_time, is_playing)
}

/// Line matcher with a configurable start guard
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackMatcher {
    start_guard_sec: TimeSec,
}

impl Default for PlaybackMatcher {
    fn default() -> Self {
        Self {
            start_guard_sec: DEFAULT_START_GUARD_SEC,
        }
    }
}

impl PlaybackMatcher {
    pub fn new(start_guard_sec: TimeSec) -> Self {
        Self { start_guard_sec }
    }

    pub fn start_guard_sec(&self) -> TimeSec {
        self.start_guard_sec
    }

    /// Returns the index of the line sung at `current_time`, if any.
    ///
    /// - Nothing is highlighted until at least one non-authorship line has a
    ///   start time above zero.
    /// - While paused at (or within the guard of) the first line's start,
    ///   nothing is highlighted.
    /// - A line is active on `[start, effective_end)`, where the effective
    ///   end is its own end time, else the next line's start, else infinity.
    pub fn active_index(
        &self,
        lines: &[LyricLine],
        authorship: Option<&str>,
        current_time: TimeSec,
        is_playing: bool,
    ) -> Option<usize> {
        let first = lines.first()?;
        let authorship_at = authorship_index(lines, authorship);

        let any_synced = lines
            .iter()
            .enumerate()
            .any(|(i, line)| Some(i) != authorship_at && line.is_synced());
        if !any_synced {
            return None;
        }

        if !is_playing && current_time <= first.start_time + self.start_guard_sec {
            return None;
        }

        if current_time < first.start_time {
            return None;
        }

        lines.iter().enumerate().position(|(i, line)| {
            let effective_end = line
                .end_time
                .or_else(|| lines.get(i + 1).map(|next| next.start_time))
                .unwrap_or(TimeSec::INFINITY);
            line.start_time <= current_time && current_time < effective_end
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synced_sheet() -> Vec<LyricLine> {
        vec![
            LyricLine::timed("One", 2.0),
            LyricLine::timed("Two", 5.0),
            LyricLine::timed("Three", 9.0).with_end(12.0),
            LyricLine::timed("Four", 14.0),
        ]
    }

    #[test]
    fn test_nothing_synced_returns_none() {
        let lines = vec![LyricLine::unsynced("One"), LyricLine::unsynced("Two")];
        assert_eq!(active_index(&lines, None, 10.0, true), None);
    }

    #[test]
    fn test_synced_authorship_alone_does_not_count() {
        let lines = vec![
            LyricLine::unsynced("One"),
            LyricLine::new("Credits", 120.0, Some(200.0)),
        ];
        let matcher = PlaybackMatcher::default();
        assert_eq!(matcher.active_index(&lines, Some("Credits"), 150.0, true), None);
        // Without knowing the authorship it is an ordinary synced line.
        assert_eq!(matcher.active_index(&lines, None, 150.0, true), Some(1));
    }

    #[test]
    fn test_default_matcher_excludes_authorship() {
        let lines = vec![
            LyricLine::unsynced("One"),
            LyricLine::new("Credits", 120.0, Some(200.0)),
        ];
        assert_eq!(active_index(&lines, Some("Credits"), 150.0, true), None);
    }

    #[test]
    fn test_no_flash_while_paused_at_start() {
        let lines = vec![LyricLine::timed("One", 0.0), LyricLine::timed("Two", 3.0)];
        assert_eq!(active_index(&lines, None, 0.03, false), None);
        assert_eq!(active_index(&lines, None, 0.03, true), Some(0));
    }

    #[test]
    fn test_paused_guard_relative_to_first_start() {
        let lines = synced_sheet();
        assert_eq!(active_index(&lines, None, 2.04, false), None);
        assert_eq!(active_index(&lines, None, 2.5, false), Some(0));
    }

    #[test]
    fn test_before_first_line_returns_none() {
        assert_eq!(active_index(&synced_sheet(), None, 1.0, true), None);
    }

    #[test]
    fn test_effective_end_uses_next_start() {
        let lines = synced_sheet();
        assert_eq!(active_index(&lines, None, 2.0, true), Some(0));
        assert_eq!(active_index(&lines, None, 4.99, true), Some(0));
        assert_eq!(active_index(&lines, None, 5.0, true), Some(1));
    }

    #[test]
    fn test_explicit_end_leaves_gap() {
        let lines = synced_sheet();
        assert_eq!(active_index(&lines, None, 11.9, true), Some(2));
        assert_eq!(active_index(&lines, None, 13.0, true), None);
    }

    #[test]
    fn test_open_ended_last_line_stays_active() {
        assert_eq!(active_index(&synced_sheet(), None, 9_999.0, true), Some(3));
    }

    #[test]
    fn test_unsorted_lines_use_linear_scan() {
        // An unsynced line starts at 0.0, so it covers everything up to the
        // next line's start and shadows the zero-length line before it.
        let lines = vec![
            LyricLine::timed("One", 0.0),
            LyricLine::unsynced("Two"),
            LyricLine::timed("Three", 8.0),
        ];
        assert_eq!(active_index(&lines, None, 4.0, true), Some(1));
        assert_eq!(active_index(&lines, None, 8.5, true), Some(2));

        // "Two" ends where the trailing unsynced line starts (0.0), so the
        // open-ended unsynced line wins after 6.0.
        let lines = vec![
            LyricLine::timed("One", 1.0),
            LyricLine::timed("Two", 6.0),
            LyricLine::unsynced("Three"),
        ];
        assert_eq!(active_index(&lines, None, 3.0, true), Some(0));
        assert_eq!(active_index(&lines, None, 7.0, true), Some(2));
    }

    #[test]
    fn test_custom_start_guard() {
        let lines = synced_sheet();
        let matcher = PlaybackMatcher::new(0.5);
        assert_eq!(matcher.active_index(&lines, None, 2.4, false), None);
        assert_eq!(matcher.active_index(&lines, None, 2.4, true), Some(0));
    }

    #[test]
    fn test_empty_sheet() {
        assert_eq!(active_index(&[], None, 1.0, true), None);
    }
}
