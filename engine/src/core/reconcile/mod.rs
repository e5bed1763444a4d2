//! Lyric Reconciliation
//!
//! Merges freshly read lyric text with previously saved timings so that
//! editing the text does not throw away captured time codes.
//!
//! # Algorithm
//!
//! 1. Content is split into trimmed, non-blank lines.
//! 2. The *pool* holds previous lines whose text still occurs in the content.
//! 3. Fast path: pool and content have the same length, so the ordering is
//!    assumed unchanged and timings are mapped positionally.
//! 4. General path: each content line takes an unconsumed pool line with the
//!    same text, preferring one whose pool neighbour matches the content
//!    neighbour; otherwise the first unconsumed match; otherwise it is new.
//! 5. The authorship line is appended last.
//!
//! Three or more identical lines combined with structural edits can still
//! map a timing onto the wrong occurrence. Lines carry no identity beyond
//! their text, so the intended mapping is not recoverable.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::core::lyrics::{authorship_index, LyricLine};
use crate::core::TimeSec;

// =============================================================================
// Content Splitting
// =============================================================================

/// Splits raw lyric text into trimmed, non-blank lines
pub fn split_content(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds the stored authorship line among previously saved lines.
///
/// Returns the last line whose text equals the stored authorship string.
pub fn find_prior_authorship_line<'a>(
    previous_lines: &'a [LyricLine],
    authorship: &str,
) -> Option<&'a LyricLine> {
    let authorship = authorship.trim();
    if authorship.is_empty() {
        return None;
    }
    previous_lines
        .iter()
        .rev()
        .find(|line| line.text.trim() == authorship)
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Counters describing how a reconciliation was resolved
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    /// Positional mapping was used
    pub fast_path: bool,
    /// Content lines that inherited a previous timing
    pub reused: usize,
    /// Content lines that start unsynced
    pub unsynced: usize,
    /// Previous lines whose text no longer occurs
    pub dropped: usize,
}

/// Result of a reconciliation run
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    pub lines: Vec<LyricLine>,
    pub stats: ReconcileStats,
}

/// Reconciles content lines with previous timings.
///
/// The result is aligned 1:1 with the non-blank content lines, followed by
/// the authorship line when `authorship` is non-empty and not already the
/// last content line. Never fails; at worst every line is unsynced.
pub fn reconcile(
    content_lines: &[String],
    previous_lines: &[LyricLine],
    authorship: &str,
    prior_authorship_line: Option<&LyricLine>,
) -> Vec<LyricLine> {
    reconcile_with_stats(
        content_lines,
        previous_lines,
        authorship,
        prior_authorship_line,
    )
    .lines
}

/// Same as [`reconcile`], also reporting how lines were matched
pub fn reconcile_with_stats(
    content_lines: &[String],
    previous_lines: &[LyricLine],
    authorship: &str,
    prior_authorship_line: Option<&LyricLine>,
) -> Reconciliation {
    let content: Vec<&str> = content_lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    let authorship = authorship.trim();
    let appends_authorship = !authorship.is_empty() && content.last() != Some(&authorship);

    // The stored authorship line is re-identified separately, so keep it out
    // of the pool when it will be appended again.
    let skip_index = if appends_authorship {
        authorship_index(previous_lines, Some(authorship))
    } else {
        None
    };

    let present: HashSet<&str> = content.iter().copied().collect();
    let pool: Vec<&LyricLine> = previous_lines
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip_index)
        .map(|(_, line)| line)
        .filter(|line| present.contains(line.text.trim()))
        .collect();

    let mut stats = ReconcileStats {
        dropped: previous_lines.len() - pool.len() - usize::from(skip_index.is_some()),
        ..Default::default()
    };

    let mut lines = if pool.len() == content.len() {
        stats.fast_path = true;
        stats.reused = content.len();
        content
            .iter()
            .zip(&pool)
            .map(|(text, previous)| LyricLine::unsynced(text).with_timing_of(previous))
            .collect::<Vec<_>>()
    } else {
        match_by_context(&content, &pool, &mut stats)
    };

    if appends_authorship {
        let (start_time, end_time) = prior_authorship_line
            .map(|line| (line.start_time, line.end_time))
            .unwrap_or((0.0, None));
        lines.push(LyricLine::new(authorship, start_time, end_time));
    }

    debug!(
        "Reconciled {} content lines against {} previous (fast_path={}, reused={}, unsynced={}, dropped={})",
        content.len(),
        previous_lines.len(),
        stats.fast_path,
        stats.reused,
        stats.unsynced,
        stats.dropped
    );

    Reconciliation { lines, stats }
}

fn match_by_context(
    content: &[&str],
    pool: &[&LyricLine],
    stats: &mut ReconcileStats,
) -> Vec<LyricLine> {
    let mut consumed = vec![false; pool.len()];
    let mut lines = Vec::with_capacity(content.len());

    for (i, text) in content.iter().enumerate() {
        let before = i.checked_sub(1).map(|j| content[j]);
        let after = content.get(i + 1).copied();

        let candidates: Vec<usize> = (0..pool.len())
            .filter(|&p| !consumed[p] && pool[p].text.trim() == *text)
            .collect();

        let chosen = candidates
            .iter()
            .copied()
            .find(|&p| {
                pool_neighbour(pool, p, -1) == before || pool_neighbour(pool, p, 1) == after
            })
            .or_else(|| candidates.first().copied());

        match chosen {
            Some(p) => {
                consumed[p] = true;
                stats.reused += 1;
                lines.push(LyricLine::unsynced(text).with_timing_of(pool[p]));
            }
            None => {
                stats.unsynced += 1;
                lines.push(LyricLine::unsynced(text));
            }
        }
    }

    lines
}

fn pool_neighbour<'a>(pool: &[&'a LyricLine], index: usize, offset: isize) -> Option<&'a str> {
    let neighbour = index.checked_add_signed(offset)?;
    pool.get(neighbour).map(|line| line.text.trim())
}

// =============================================================================
// Duration
// =============================================================================

/// Forces the authorship line to end at the track duration.
///
/// Returns true if an authorship line was found and updated.
pub fn apply_duration(lines: &mut [LyricLine], authorship: &str, duration: TimeSec) -> bool {
    match authorship_index(lines, Some(authorship)) {
        Some(index) => {
            lines[index].end_time = Some(duration);
            true
        }
        None => false,
    }
}
