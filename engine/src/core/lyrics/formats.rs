//! LRC Import and Export
//!
//! LRC is the de-facto interchange format for line-synced lyrics:
//!
//! ```text
//! [ar:Artist]
//! [ti:Title]
//! [00:12.50]First line
//! [00:17.20][01:02.00]Repeated chorus line
//! ```
//!
//! LRC only carries start times, so imported lines are open-ended and the
//! playback matcher ends each one at the next line's start.

use super::LyricLine;
use crate::core::TimeSec;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during LRC parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid time tag (e.g. `[1:xx]`)
    InvalidTimestamp(String),
    /// No timed line found in the input
    NoTimedLines,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            Self::NoTimedLines => write!(f, "No timed lines found"),
        }
    }
}

impl std::error::Error for ParseError {}

// =============================================================================
// Metadata
// =============================================================================

/// Optional ID tags written at the top of an LRC file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LrcMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
}

// =============================================================================
// Export
// =============================================================================

/// Exports lines to LRC, one `[mm:ss.xx]` tag per line.
///
/// Blank and unsynced lines are skipped: a `[00:00.00]` tag would sort them
/// ahead of synced lines on import.
pub fn export_lrc(lines: &[LyricLine], metadata: &LrcMetadata) -> String {
    let mut output = String::new();

    let tags = [
        ("ar", &metadata.artist),
        ("ti", &metadata.title),
        ("la", &metadata.language),
    ];
    for (tag, value) in tags {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            output.push_str(&format!("[{}:{}]\n", tag, value));
        }
    }

    for line in lines.iter().filter(|l| !l.is_blank() && l.is_synced()) {
        output.push_str(&format!(
            "[{}]{}\n",
            format_lrc_timestamp(line.start_time),
            line.text.trim()
        ));
    }

    output
}

/// Formats seconds as `mm:ss.xx` (minutes may exceed 59)
fn format_lrc_timestamp(seconds: TimeSec) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    let minutes = centis / 6000;
    let secs = (centis % 6000) / 100;
    let hundredths = centis % 100;
    format!("{:02}:{:02}.{:02}", minutes, secs, hundredths)
}

// =============================================================================
// Import
// =============================================================================

/// Parses LRC content into lines ordered by start time.
///
/// A line with several time tags yields one entry per tag. ID tags such as
/// `[ar:...]` and untagged lines are ignored.
pub fn parse_lrc(content: &str) -> Result<Vec<LyricLine>, ParseError> {
    let mut parsed: Vec<(TimeSec, usize, String)> = Vec::new();

    for (order, raw) in content.lines().enumerate() {
        let mut rest = raw.trim();
        let mut times = Vec::new();

        while let Some(tag_end) = rest.strip_prefix('[').and_then(|r| r.find(']')) {
            let tag = &rest[1..=tag_end];
            if !tag.starts_with(|c: char| c.is_ascii_digit()) {
                // ID tag ([ar:], [offset:], ...)
                break;
            }
            times.push(parse_lrc_timestamp(tag)?);
            rest = &rest[tag_end + 2..];
        }

        let text = rest.trim();
        if times.is_empty() || text.is_empty() {
            continue;
        }

        for time in times {
            parsed.push((time, order, text.to_string()));
        }
    }

    if parsed.is_empty() {
        return Err(ParseError::NoTimedLines);
    }

    parsed.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    Ok(parsed
        .into_iter()
        .map(|(time, _, text)| LyricLine::timed(&text, time))
        .collect())
}

/// Parses `mm:ss`, `mm:ss.xx` or `mm:ss.xxx` into seconds
fn parse_lrc_timestamp(tag: &str) -> Result<TimeSec, ParseError> {
    let invalid = || ParseError::InvalidTimestamp(tag.to_string());

    let (minutes, seconds) = tag.split_once(':').ok_or_else(invalid)?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;

    if !(0.0..60.0).contains(&seconds) {
        return Err(invalid());
    }

    Ok(minutes as f64 * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lrc_timestamp() {
        assert_eq!(format_lrc_timestamp(0.0), "00:00.00");
        assert_eq!(format_lrc_timestamp(12.5), "00:12.50");
        assert_eq!(format_lrc_timestamp(62.019), "01:02.02");
        assert_eq!(format_lrc_timestamp(3725.0), "62:05.00");
    }

    #[test]
    fn test_export_lrc_with_metadata() {
        let lines = vec![
            LyricLine::timed("First", 12.5),
            LyricLine::unsynced("   "),
            LyricLine::timed("Second", 17.2).with_end(20.0),
        ];
        let metadata = LrcMetadata {
            artist: Some("Artist".to_string()),
            title: Some("Song".to_string()),
            language: None,
        };

        let lrc = export_lrc(&lines, &metadata);
        assert_eq!(
            lrc,
            "[ar:Artist]\n[ti:Song]\n[00:12.50]First\n[00:17.20]Second\n"
        );
    }

    #[test]
    fn test_parse_lrc_basic() {
        let content = "[ar:Artist]\n[00:12.50]First\n\n[00:17.20] Second \n";
        let lines = parse_lrc(content).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], LyricLine::timed("First", 12.5));
        assert_eq!(lines[1].text, "Second");
        assert!((lines[1].start_time - 17.2).abs() < 1e-9);
    }

    #[test]
    fn test_parse_lrc_multiple_tags_are_ordered_by_time() {
        let content = "[00:05.00]Verse\n[00:10.00][00:30.00]Chorus\n[00:20.00]Bridge\n";
        let lines = parse_lrc(content).unwrap();

        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Verse", "Chorus", "Bridge", "Chorus"]);
        assert_eq!(lines[3].start_time, 30.0);
    }

    #[test]
    fn test_parse_lrc_rejects_bad_timestamp() {
        let result = parse_lrc("[00:75.00]Too many seconds");
        assert!(matches!(result, Err(ParseError::InvalidTimestamp(_))));

        let result = parse_lrc("[0x:10.00]Garbage");
        assert!(matches!(result, Err(ParseError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_parse_lrc_without_timed_lines() {
        assert_eq!(parse_lrc("[ti:Song]\nplain text"), Err(ParseError::NoTimedLines));
    }

    #[test]
    fn test_partly_synced_sheet_survives_export_and_import() {
        use crate::core::reconcile::reconcile;

        let lines = vec![
            LyricLine::timed("A", 1.0),
            LyricLine::unsynced("B"),
            LyricLine::timed("C", 5.0),
        ];
        let lrc = export_lrc(&lines, &LrcMetadata::default());
        assert_eq!(lrc, "[00:01.00]A\n[00:05.00]C\n");

        let imported = parse_lrc(&lrc).unwrap();
        let content: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let reconciled = reconcile(&content, &imported, "", None);
        assert_eq!(reconciled, lines);
    }

    #[test]
    fn test_lrc_export_then_parse_keeps_order_and_starts() {
        let lines = vec![
            LyricLine::timed("A", 1.0),
            LyricLine::timed("B", 5.25),
            LyricLine::timed("A", 10.0),
        ];
        let parsed = parse_lrc(&export_lrc(&lines, &LrcMetadata::default())).unwrap();
        assert_eq!(parsed, lines);
    }
}
