//! LyricSync Core Library
//!
//! Engine for attaching line-level time codes to song lyrics and keeping
//! them across later edits of the lyric text.
//!
//! The host owns audio playback and storage; the engine talks to them
//! through the [`core::sources::TextSource`], [`core::sources::TimingStore`]
//! and [`core::playback::AudioClock`] traits. [`core::session::SyncSession`]
//! is the entry point for hosts.

pub mod core;

pub use crate::core::session::SyncSession;
pub use crate::core::{CoreError, CoreResult, TimeField, TrackKey};
