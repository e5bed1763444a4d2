//! Load Coordinator
//!
//! Opens a track into the editor and saves it back, discarding results that
//! belong to a superseded open.
//!
//! Every open bumps a load epoch synchronously, before any await. The epoch
//! is incremented and checked while holding the editor lock, so a stale load
//! can never commit after a newer open has cleared the editor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::editor::{Editor, EditorSnapshot};
use crate::core::playback::AudioClock;
use crate::core::reconcile::{
    find_prior_authorship_line, reconcile_with_stats, split_content, ReconcileStats,
};
use crate::core::sources::{TextSource, TimingStore};
use crate::core::{CoreError, CoreResult, Epoch, TrackKey};

/// Default authorship read timeout
pub const DEFAULT_AUTHORSHIP_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Outcomes
// =============================================================================

/// Handle for a started load
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub epoch: Epoch,
    pub key: TrackKey,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum LoadOutcome {
    /// Reconciled lines are now visible
    Committed { epoch: Epoch, stats: ReconcileStats },
    /// A newer open started; nothing was changed
    Superseded { epoch: Epoch },
}

impl LoadOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, LoadOutcome::Committed { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SaveOutcome {
    /// Stored; `clean` is false when edits arrived during the save
    Saved { clean: bool },
    /// The editor switched track while the save was in flight
    Superseded,
}

// =============================================================================
// Load Coordinator
// =============================================================================

#[derive(Clone)]
pub struct LoadCoordinator {
    editor: Arc<Mutex<Editor>>,
    epoch: Arc<AtomicU64>,
    text_source: Arc<dyn TextSource>,
    timing_store: Arc<dyn TimingStore>,
    clock: Arc<dyn AudioClock>,
    authorship_timeout: Duration,
}

impl LoadCoordinator {
    pub fn new(
        text_source: Arc<dyn TextSource>,
        timing_store: Arc<dyn TimingStore>,
        clock: Arc<dyn AudioClock>,
    ) -> Self {
        Self {
            editor: Arc::new(Mutex::new(Editor::new())),
            epoch: Arc::new(AtomicU64::new(0)),
            text_source,
            timing_store,
            clock,
            authorship_timeout: DEFAULT_AUTHORSHIP_TIMEOUT,
        }
    }

    pub fn with_authorship_timeout(mut self, timeout: Duration) -> Self {
        self.authorship_timeout = timeout;
        self
    }

    pub fn current_epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current_epoch() == epoch
    }

    /// Runs `f` against the editor under its lock
    pub fn with_editor<R>(&self, f: impl FnOnce(&mut Editor) -> R) -> R {
        f(&mut self.lock_editor())
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        self.lock_editor().snapshot()
    }

    fn lock_editor(&self) -> MutexGuard<'_, Editor> {
        self.editor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Starts an open: bumps the epoch, clears visible state, and resets the
    /// clock. Runs to completion without suspending.
    ///
    /// Keys are not validated here; sources that map keys onto paths reject
    /// unsafe segments on read.
    pub fn begin(&self, key: TrackKey) -> CoreResult<LoadTicket> {
        let epoch = {
            let mut editor = self.lock_editor();
            let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            editor.begin_loading(key.clone());
            epoch
        };

        self.clock.pause();
        self.clock.seek(0.0);

        debug!(%key, epoch, "load started");
        Ok(LoadTicket { epoch, key })
    }

    /// Fetches, reconciles, and commits the load for `ticket`.
    ///
    /// Source failures degrade to empty values. A ticket whose epoch is no
    /// longer current yields `Superseded` without touching any state.
    pub async fn load(&self, ticket: &LoadTicket) -> CoreResult<LoadOutcome> {
        let LoadTicket { epoch, key } = ticket;
        let epoch = *epoch;
        let superseded = || -> CoreResult<LoadOutcome> {
            warn!(%key, epoch, "discarding superseded load");
            Ok(LoadOutcome::Superseded { epoch })
        };

        if !self.is_current(epoch) {
            return superseded();
        }

        self.text_source.invalidate_cache(key).await;
        self.timing_store.invalidate_cache(key).await;

        let (text, previous, authorship) = tokio::join!(
            self.text_source.load_track_text(key),
            self.timing_store.load_lines(key),
            tokio::time::timeout(
                self.authorship_timeout,
                self.timing_store.load_authorship(key)
            ),
        );

        if !self.is_current(epoch) {
            return superseded();
        }

        let text = text.unwrap_or_else(|e| {
            warn!(%key, "lyric text unavailable, using empty text: {}", e);
            String::new()
        });
        let previous = previous.unwrap_or_else(|e| {
            warn!(%key, "stored timings unavailable, starting unsynced: {}", e);
            Vec::new()
        });
        let authorship = match authorship {
            Ok(Ok(authorship)) => authorship.unwrap_or_default(),
            Ok(Err(e)) => {
                warn!(%key, "authorship unavailable: {}", e);
                String::new()
            }
            Err(_) => {
                let err = CoreError::Timeout(format!(
                    "authorship read exceeded {} ms",
                    self.authorship_timeout.as_millis()
                ));
                warn!(%key, "authorship unavailable: {}", err);
                String::new()
            }
        };

        let content = split_content(&text);
        let prior = find_prior_authorship_line(&previous, &authorship).cloned();
        let result = reconcile_with_stats(&content, &previous, &authorship, prior.as_ref());

        {
            let mut editor = self.lock_editor();
            if !self.is_current(epoch) {
                drop(editor);
                return superseded();
            }
            editor.finish_loading(result.lines, &authorship)?;
            if let Some(duration) = self.clock.duration() {
                editor.apply_duration(duration);
            }
        }

        info!(
            %key,
            epoch,
            reused = result.stats.reused,
            unsynced = result.stats.unsynced,
            dropped = result.stats.dropped,
            "lyrics loaded"
        );
        Ok(LoadOutcome::Committed {
            epoch,
            stats: result.stats,
        })
    }

    /// Begins and completes an open
    pub async fn open(&self, key: TrackKey) -> CoreResult<LoadOutcome> {
        let ticket = self.begin(key)?;
        self.load(&ticket).await
    }

    // -------------------------------------------------------------------------
    // Saving
    // -------------------------------------------------------------------------

    /// Saves the working lines of the open track.
    ///
    /// On success the cache for the track is invalidated and the clock is
    /// paused at 0. On failure the editor stays dirty and the error carries
    /// the store's message.
    pub async fn save(&self) -> CoreResult<SaveOutcome> {
        let (epoch, ticket) = {
            let mut editor = self.lock_editor();
            (self.current_epoch(), editor.begin_save()?)
        };
        let key = &ticket.key;

        let stored = match self.timing_store.save(key, &ticket.request).await {
            Ok(receipt) => receipt.into_result(),
            Err(e) => Err(e),
        };

        if stored.is_ok() {
            self.timing_store.invalidate_cache(key).await;
        }

        let mut editor = self.lock_editor();
        if !self.is_current(epoch) {
            warn!(%key, epoch, "track switched during save; result not applied");
            return match stored {
                Ok(()) => Ok(SaveOutcome::Superseded),
                Err(e) => Err(CoreError::SaveFailed(save_failure_message(e))),
            };
        }

        match stored {
            Ok(()) => {
                let clean = editor.finish_save(ticket.revision, Ok(()))?;
                drop(editor);

                self.clock.pause();
                self.clock.seek(0.0);

                info!(%key, lines = ticket.request.lines.len(), clean, "timings saved");
                Ok(SaveOutcome::Saved { clean })
            }
            Err(e) => {
                let message = save_failure_message(e);
                editor.finish_save(ticket.revision, Err(message.clone()))?;
                warn!(%key, "save failed: {}", message);
                Err(CoreError::SaveFailed(message))
            }
        }
    }
}

/// Message carried by `SaveFailed`; a store's own `SaveFailed` is not rewrapped
fn save_failure_message(error: CoreError) -> String {
    match error {
        CoreError::SaveFailed(message) => message,
        other => other.to_display_message(),
    }
}
