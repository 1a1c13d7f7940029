//! Local durable cache for the full state snapshot.
//!
//! One key, one JSON document. Written after every in-memory transition and
//! read back when the remote is missing or fails.

use async_trait::async_trait;
use nutrisync_core::AppState;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::CacheError;

/// Durable single-key store for the serialized [`AppState`].
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Read the last snapshot. `Ok(None)` when nothing was ever written.
    async fn load(&self) -> Result<Option<AppState>, CacheError>;

    /// Overwrite the snapshot.
    async fn save(&self, state: &AppState) -> Result<(), CacheError>;
}

/// Snapshot stored as a JSON file.
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "state".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn load(&self) -> Result<Option<AppState>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = tokio::fs::read_to_string(&self.path).await?;
        let state: AppState =
            serde_json::from_str(&json).map_err(|e| CacheError::Corrupt(e.to_string()))?;

        debug!(path = ?self.path, logs = state.logs.len(), "Loaded cached state");

        Ok(Some(state))
    }

    async fn save(&self, state: &AppState) -> Result<(), CacheError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!(path = ?self.path, size = json.len(), "Saved state snapshot");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nutrisync_core::{DailyLog, Profile};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = tempdir().unwrap();
        let cache = FileCache::new(temp_dir.path().join("state.json"));
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let cache = FileCache::new(temp_dir.path().join("nested").join("state.json"));

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let state = AppState::new(
            Profile {
                name: "Alex".to_string(),
                ..Profile::default()
            },
            vec![DailyLog::empty(day).with_hydration(1500.0)].into(),
        );

        cache.save(&state).await.unwrap();
        assert!(!cache.temp_path().exists());

        let loaded = cache.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("state.json");
        std::fs::write(&path, "{\"profile\": ").unwrap();

        let cache = FileCache::new(path);
        assert!(matches!(cache.load().await, Err(CacheError::Corrupt(_))));
    }
}
