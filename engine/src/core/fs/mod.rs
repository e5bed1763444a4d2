//! Filesystem utilities.
//!
//! Crash-tolerant primitives used by the file-backed timing store and the
//! settings manager. A partially written timing document must never replace
//! the last good one, so every write goes through a sibling temp file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Path Validation
// =============================================================================

/// Validates that an identifier is safe to use as a single path segment.
///
/// Rejects empty identifiers, traversal sequences (`..`), separators
/// (`/`, `\`), drive markers (`:`) and control characters.
pub fn validate_path_id_component(id: &str, label: &str) -> Result<(), String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is empty or contains only whitespace"));
    }
    if trimmed != id {
        return Err(format!("Invalid {label}: has surrounding whitespace"));
    }
    if trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains(':')
    {
        return Err(format!(
            "Invalid {label}: contains path traversal characters"
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(format!("Invalid {label}: contains control characters"));
    }
    Ok(())
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Write bytes to `path` using an atomic replace.
///
/// The content is written and synced to `<name>.tmp` first, then swapped
/// into place. Parent directories are created as needed.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = sibling_path(path, "tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    replace_with(path, &tmp_path)
}

/// Write a JSON document atomically with pretty formatting.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

/// Reads and parses a JSON document, returning `None` when the file is absent.
pub async fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> CoreResult<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CoreError::IoError(e)),
    };

    let value = serde_json::from_str(&content)?;
    Ok(Some(value))
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| suffix.to_string());
    path.with_file_name(format!("{file_name}.{suffix}"))
}

fn replace_with(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // Rename-over-existing is not portable; move the old file aside first.
    let bak = sibling_path(dest, "bak");
    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_bytes_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        atomic_write_bytes(&path, b"one").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one");

        atomic_write_bytes(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");

        assert!(!sibling_path(&path, "tmp").exists());
        assert!(!sibling_path(&path, "bak").exists());
    }

    #[tokio::test]
    async fn read_json_if_exists_handles_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");

        let value: Option<serde_json::Value> = read_json_if_exists(&path).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn read_json_if_exists_parses_written_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        atomic_write_json_pretty(&path, &serde_json::json!({"lines": [1, 2]})).unwrap();

        let value: Option<serde_json::Value> = read_json_if_exists(&path).await.unwrap();
        assert_eq!(value.unwrap()["lines"][1], 2);
    }

    #[tokio::test]
    async fn read_json_if_exists_rejects_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{not json").unwrap();

        let result: CoreResult<Option<serde_json::Value>> = read_json_if_exists(&path).await;
        assert!(matches!(result, Err(CoreError::JsonError(_))));
    }

    // =========================================================================
    // Path Validation Tests
    // =========================================================================

    #[test]
    fn test_validate_path_id_component_valid() {
        assert!(validate_path_id_component("album_001", "albumId").is_ok());
        assert!(validate_path_id_component("01HXYZ123ABC", "trackId").is_ok());
        assert!(validate_path_id_component("pt-BR", "language").is_ok());
    }

    #[test]
    fn test_validate_path_id_component_rejects_traversal() {
        assert!(validate_path_id_component("..", "albumId").is_err());
        assert!(validate_path_id_component("a/b", "albumId").is_err());
        assert!(validate_path_id_component("a\\b", "albumId").is_err());
        assert!(validate_path_id_component("C:", "albumId").is_err());
    }

    #[test]
    fn test_validate_path_id_component_rejects_blank_and_control() {
        assert!(validate_path_id_component("", "trackId").is_err());
        assert!(validate_path_id_component("   ", "trackId").is_err());
        assert!(validate_path_id_component(" t1", "trackId").is_err());
        assert!(validate_path_id_component("t\u{0}1", "trackId").is_err());
    }
}
