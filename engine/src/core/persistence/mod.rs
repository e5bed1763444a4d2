//! Timing Persistence Adapter
//!
//! Shapes the working line set for storage and back.
//!
//! - Blank lines are never persisted.
//! - Start times are clamped to finite, non-negative values.
//! - End times that do not lie after the start are dropped.
//! - The authorship string is stored next to the lines so a later
//!   reconciliation can re-identify the authorship line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::lyrics::LyricLine;
use crate::core::{CoreError, CoreResult};

/// Current on-disk document version
pub const TIMING_DOCUMENT_VERSION: u32 = 1;

// =============================================================================
// Save Request / Receipt
// =============================================================================

/// Lines and authorship handed to a `TimingStore`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub lines: Vec<LyricLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorship: Option<String>,
}

/// Store response for a save
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveReceipt {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
        }
    }

    /// Converts an unsuccessful receipt into `CoreError::SaveFailed`
    pub fn into_result(self) -> CoreResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(CoreError::SaveFailed(
                self.message
                    .unwrap_or_else(|| "Timing store rejected the save".to_string()),
            ))
        }
    }
}

// =============================================================================
// Line Shaping
// =============================================================================

/// Builds the save payload from the working lines
pub fn prepare_save(lines: &[LyricLine], authorship: &str) -> SaveRequest {
    let authorship = authorship.trim();
    SaveRequest {
        lines: sanitize_lines(lines.iter().cloned()),
        authorship: (!authorship.is_empty()).then(|| authorship.to_string()),
    }
}

/// Normalizes lines read back from storage
pub fn restore_lines(lines: Vec<LyricLine>) -> Vec<LyricLine> {
    sanitize_lines(lines.into_iter())
}

fn sanitize_lines(lines: impl Iterator<Item = LyricLine>) -> Vec<LyricLine> {
    lines
        .filter(|line| !line.is_blank())
        .map(|line| {
            let start_time = if line.start_time.is_finite() && line.start_time > 0.0 {
                line.start_time
            } else {
                0.0
            };
            let end_time = line
                .end_time
                .filter(|end| end.is_finite() && *end > start_time);
            LyricLine::new(line.text.trim(), start_time, end_time)
        })
        .collect()
}

// =============================================================================
// Timing Document
// =============================================================================

/// Persisted form of a lyric sheet's timings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingDocument {
    pub version: u32,
    #[serde(default)]
    pub lines: Vec<LyricLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorship: Option<String>,
    /// Unique id of this write
    #[serde(default)]
    pub revision: String,
    pub updated_at: DateTime<Utc>,
}

impl TimingDocument {
    /// Creates a document for a new write
    pub fn from_request(request: &SaveRequest) -> Self {
        Self {
            version: TIMING_DOCUMENT_VERSION,
            lines: request.lines.clone(),
            authorship: request.authorship.clone(),
            revision: ulid::Ulid::new().to_string(),
            updated_at: Utc::now(),
        }
    }

    /// Rejects documents written by a newer engine
    pub fn validate(&self) -> CoreResult<()> {
        if self.version > TIMING_DOCUMENT_VERSION {
            return Err(CoreError::ValidationError(format!(
                "Unsupported timing document version {} (max {})",
                self.version, TIMING_DOCUMENT_VERSION
            )));
        }
        Ok(())
    }

    /// Returns the stored lines, normalized
    pub fn into_lines(self) -> Vec<LyricLine> {
        restore_lines(self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_save_drops_blank_lines() {
        let lines = vec![
            LyricLine::timed("One", 1.0),
            LyricLine::unsynced("   "),
            LyricLine::timed(" Two ", 3.0).with_end(4.0),
        ];

        let request = prepare_save(&lines, "");
        assert_eq!(
            request.lines,
            vec![
                LyricLine::timed("One", 1.0),
                LyricLine::timed("Two", 3.0).with_end(4.0)
            ]
        );
        assert_eq!(request.authorship, None);
    }

    #[test]
    fn test_prepare_save_repairs_bad_times() {
        let lines = vec![
            LyricLine::new("NaN", f64::NAN, Some(2.0)),
            LyricLine::new("Backwards", 5.0, Some(4.0)),
            LyricLine::new("Negative", -1.0, Some(f64::INFINITY)),
        ];

        let request = prepare_save(&lines, "  Credits ");
        assert_eq!(request.lines[0], LyricLine::new("NaN", 0.0, Some(2.0)));
        assert_eq!(request.lines[1], LyricLine::timed("Backwards", 5.0));
        assert_eq!(request.lines[2], LyricLine::unsynced("Negative"));
        assert_eq!(request.authorship.as_deref(), Some("Credits"));
    }

    #[test]
    fn test_receipt_into_result() {
        assert!(SaveReceipt::ok().into_result().is_ok());

        let err = SaveReceipt::failed("quota exceeded").into_result().unwrap_err();
        assert!(matches!(err, CoreError::SaveFailed(msg) if msg == "quota exceeded"));

        let silent = SaveReceipt {
            success: false,
            message: None,
        };
        assert!(matches!(silent.into_result(), Err(CoreError::SaveFailed(_))));
    }

    #[test]
    fn test_document_round_trip_preserves_order_and_timings() {
        let lines = vec![
            LyricLine::timed("A", 0.5).with_end(5.0),
            LyricLine::timed("B", 5.0),
            LyricLine::unsynced(""),
            LyricLine::timed("A", 10.0),
            LyricLine::timed("Credits", 60.0).with_end(180.0),
        ];

        let request = prepare_save(&lines, "Credits");
        let json = serde_json::to_string(&TimingDocument::from_request(&request)).unwrap();
        let document: TimingDocument = serde_json::from_str(&json).unwrap();

        document.validate().unwrap();
        assert_eq!(document.authorship.as_deref(), Some("Credits"));
        assert!(!document.revision.is_empty());

        let expected: Vec<LyricLine> = lines.into_iter().filter(|l| !l.is_blank()).collect();
        assert_eq!(document.into_lines(), expected);
    }

    #[test]
    fn test_document_from_newer_engine_is_rejected() {
        let mut document = TimingDocument::from_request(&SaveRequest::default());
        document.version = TIMING_DOCUMENT_VERSION + 1;
        assert!(matches!(
            document.validate(),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_document_json_shape() {
        let json = r#"{
            "version": 1,
            "lines": [{"text": "Hello", "startTime": 1.5, "endTime": 3.0}, {"text": "World"}],
            "updatedAt": "2024-05-01T10:00:00Z"
        }"#;
        let document: TimingDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.authorship, None);
        assert_eq!(
            document.into_lines(),
            vec![
                LyricLine::timed("Hello", 1.5).with_end(3.0),
                LyricLine::unsynced("World")
            ]
        );
    }
}
