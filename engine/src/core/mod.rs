//! LyricSync Core Engine
//!
//! Line-level lyric timing: reconciliation of edited text with saved
//! timings, active-line matching against a host clock, the timing editor,
//! and epoch-guarded loading.

pub mod cache;
pub mod editor;
pub mod fs;
pub mod loader;
pub mod lyrics;
pub mod persistence;
pub mod playback;
pub mod reconcile;
pub mod session;
pub mod settings;
pub mod sources;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
pub(crate) mod testing;
