//! Engine Settings
//!
//! Persistent engine settings with:
//! - Atomic file writes (temp file + rename)
//! - Tolerant normalization (bad values are clamped, never fatal)
//! - Advisory file locking against concurrent writers
//!
//! Storage location: {config_dir}/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::fs::atomic_write_json_pretty;
use crate::core::playback::DEFAULT_START_GUARD_SEC;
use crate::core::{CoreError, CoreResult, TimeSec};

/// Settings schema version
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform data/config dirs
pub const APP_DIR_NAME: &str = "lyricsync";

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub loading: LoadingSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            loading: LoadingSettings::default(),
            playback: PlaybackSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.loading.authorship_timeout_ms = self.loading.authorship_timeout_ms.clamp(100, 60_000);

        self.playback.start_guard_sec = if self.playback.start_guard_sec.is_finite() {
            self.playback.start_guard_sec.clamp(0.0, 1.0)
        } else {
            DEFAULT_START_GUARD_SEC
        };

        if self
            .storage
            .root_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            self.storage.root_dir = None;
        }
    }

    /// Authorship load timeout
    pub fn authorship_timeout(&self) -> Duration {
        Duration::from_millis(self.loading.authorship_timeout_ms)
    }

    /// Storage root, falling back to the platform data directory
    pub fn resolved_root_dir(&self) -> PathBuf {
        self.storage.root_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
    }
}

/// Load coordination settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadingSettings {
    /// How long to wait for the authorship read before using none (ms)
    #[serde(default = "default_authorship_timeout_ms")]
    pub authorship_timeout_ms: u64,
}

impl Default for LoadingSettings {
    fn default() -> Self {
        Self {
            authorship_timeout_ms: default_authorship_timeout_ms(),
        }
    }
}

fn default_authorship_timeout_ms() -> u64 {
    5_000
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Window after the first line's start in which a paused player shows
    /// no highlight (seconds, 0.0 - 1.0)
    #[serde(default = "default_start_guard_sec")]
    pub start_guard_sec: TimeSec,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            start_guard_sec: default_start_guard_sec(),
        }
    }
}

fn default_start_guard_sec() -> TimeSec {
    DEFAULT_START_GUARD_SEC
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    /// Root directory for texts and timings (platform data dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    /// Cache collaborator reads between explicit invalidations
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root_dir: None,
            cache_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Loads, saves, and resets the settings file
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager for `{config_dir}/settings.json`
    pub fn new(config_dir: &Path) -> Self {
        Self::from_path(config_dir.join(SETTINGS_FILE))
    }

    /// Creates a manager for an explicit settings file
    pub fn from_path(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Creates a manager in the platform config directory
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        Self::new(&dir)
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Loads settings, returning defaults when the file is missing or bad
    pub fn load(&self) -> EngineSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(EngineSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings: EngineSettings = serde_json::from_str(&content)?;
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                EngineSettings::default()
            }
        }
    }

    /// Normalizes and saves settings, returning what was written
    pub fn save(&self, settings: &EngineSettings) -> CoreResult<EngineSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            atomic_write_json_pretty(&self.settings_path, &normalized)?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Deletes the settings file and returns defaults
    pub fn reset(&self) -> CoreResult<EngineSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path).map_err(|e| {
                    CoreError::Internal(format!("Failed to delete settings file: {}", e))
                })?;
                info!("Settings file deleted");
            }
            Ok(EngineSettings::default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.loading.authorship_timeout_ms, 5_000);
        assert_eq!(settings.authorship_timeout(), Duration::from_secs(5));
        assert!((settings.playback.start_guard_sec - 0.05).abs() < 1e-9);
        assert!(settings.storage.cache_enabled);
        assert!(settings.storage.root_dir.is_none());
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut settings = EngineSettings::default();
        settings.loading.authorship_timeout_ms = 0;
        settings.playback.start_guard_sec = 7.0;
        settings.storage.root_dir = Some(PathBuf::new());
        settings.version = 0;

        settings.normalize();

        assert_eq!(settings.loading.authorship_timeout_ms, 100);
        assert!((settings.playback.start_guard_sec - 1.0).abs() < 1e-9);
        assert!(settings.storage.root_dir.is_none());
        assert_eq!(settings.version, SETTINGS_VERSION);
    }

    #[test]
    fn test_normalize_nan_guard() {
        let mut settings = EngineSettings::default();
        settings.playback.start_guard_sec = f64::NAN;
        settings.normalize();
        assert_eq!(settings.playback.start_guard_sec, DEFAULT_START_GUARD_SEC);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "loading": { "authorshipTimeoutMs": 2500 } }"#;
        let settings: EngineSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.loading.authorship_timeout_ms, 2_500);
        assert_eq!(settings.playback, PlaybackSettings::default());
        assert!(settings.storage.cache_enabled);
    }

    #[test]
    fn test_resolved_root_dir_prefers_configured() {
        let mut settings = EngineSettings::default();
        settings.storage.root_dir = Some(PathBuf::from("/srv/lyrics"));
        assert_eq!(settings.resolved_root_dir(), PathBuf::from("/srv/lyrics"));
    }

    #[test]
    fn test_manager_load_missing_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        assert_eq!(manager.load(), EngineSettings::default());
    }

    #[test]
    fn test_manager_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());

        let mut settings = EngineSettings::default();
        settings.loading.authorship_timeout_ms = 999_999;
        settings.storage.cache_enabled = false;

        let saved = manager.save(&settings).unwrap();
        assert_eq!(saved.loading.authorship_timeout_ms, 60_000);

        let loaded = manager.load();
        assert_eq!(loaded, saved);
        assert!(!loaded.storage.cache_enabled);
    }

    #[test]
    fn test_manager_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        fs::write(manager.settings_path(), "{ broken").unwrap();
        assert_eq!(manager.load(), EngineSettings::default());
    }

    #[test]
    fn test_manager_reset() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        manager.save(&EngineSettings::default()).unwrap();
        assert!(manager.settings_path().exists());

        manager.reset().unwrap();
        assert!(!manager.settings_path().exists());
    }
}
