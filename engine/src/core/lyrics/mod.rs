//! Lyric Data Module
//!
//! - `models.rs`  - `LyricLine` and authorship-line identification
//! - `formats.rs` - LRC import/export
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::core::lyrics::{export_lrc, parse_lrc, LrcMetadata, LyricLine};
//!
//! let lines = vec![LyricLine::timed("Hello", 1.0), LyricLine::timed("World", 3.5)];
//! let lrc = export_lrc(&lines, &LrcMetadata::default());
//! let parsed = parse_lrc(&lrc)?;
//! ```

mod formats;
mod models;

pub use formats::{export_lrc, parse_lrc, LrcMetadata, ParseError};
pub use models::{authorship_index, LyricLine};
