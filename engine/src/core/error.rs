//! LyricSync Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

use super::TimeSec;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Track Errors
    // =========================================================================
    #[error("Invalid track key: {0}")]
    InvalidTrackKey(String),

    #[error("Lyric text not found: {0}")]
    TextNotFound(String),

    // =========================================================================
    // Editor Errors
    // =========================================================================
    #[error("Line index {index} out of range ({len} lines)")]
    LineOutOfRange { index: usize, len: usize },

    #[error("Invalid time value: {0}")]
    InvalidTime(TimeSec),

    #[error("Invalid editor state: {0}")]
    InvalidState(String),

    #[error("Failed to save timings: {0}")]
    SaveFailed(String),

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convert to a user-facing message (editor status line, CLI output)
    pub fn to_display_message(&self) -> String {
        self.to_string()
    }
}
