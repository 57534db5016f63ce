//! Local filesystem implementation of `AssetStore`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StorageError;

use super::{AssetKind, AssetStore, StoredAsset};

/// Stores assets as flat files in a single directory.
///
/// # Example
///
/// ```ignore
/// use blurcraft::storage::{AssetKind, AssetStore, LocalAssetStore};
///
/// let store = LocalAssetStore::new("uploads").await?;
/// let asset = store.save(AssetKind::Original, "png", bytes).await?;
/// assert!(asset.filename.starts_with("original-"));
/// ```
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::CreateDir {
                path: root.display().to_string(),
                message: e.to_string(),
            })?;
        info!(root = %root.display(), "Asset store ready");
        Ok(Self { root })
    }

    /// The storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reduce an identifier to a bare filename inside the root.
    ///
    /// Any directory components are dropped, so `../../etc/passwd` resolves
    /// to `passwd` under the root.
    fn contained_name(id: &str) -> Option<&str> {
        let name = id.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(id);
        match name {
            "" | "." | ".." => None,
            name => Some(name),
        }
    }

    /// Remove a regular file. Directories and other non-files are left alone
    /// and reported as absent.
    async fn remove(&self, path: &Path) -> Result<bool, StorageError> {
        match tokio::fs::symlink_metadata(path).await {
            Ok(meta) if !meta.is_file() => return Ok(false),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(StorageError::Delete {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Delete {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn save(
        &self,
        kind: AssetKind,
        extension: &str,
        data: Bytes,
    ) -> Result<StoredAsset, StorageError> {
        let id = format!("{}-{}", kind.prefix(), Uuid::new_v4());
        let extension = extension.trim_start_matches('.');
        let filename = if extension.is_empty() {
            id.clone()
        } else {
            format!("{}.{}", id, extension)
        };
        let path = self.root.join(&filename);

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StorageError::Write {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        debug!(filename = %filename, size = data.len(), "Stored asset");

        Ok(StoredAsset {
            id,
            filename,
            path,
            size: data.len() as u64,
            created_at: Utc::now(),
        })
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let Some(name) = Self::contained_name(id) else {
            return Ok(false);
        };

        // Exact filename first
        let exact = self.root.join(name);
        if self.remove(&exact).await? {
            debug!(id = %id, "Deleted asset");
            return Ok(true);
        }

        // Otherwise match a bare identifier against file stems
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(StorageError::Read {
                    path: self.root.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let mut removed = false;
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::Read {
                    path: self.root.display().to_string(),
                    message: e.to_string(),
                })?;
            let Some(entry) = entry else { break };

            let path = entry.path();
            let stem_matches = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|stem| stem == name)
                .unwrap_or(false);
            if stem_matches && self.remove(&path).await? {
                removed = true;
            }
        }

        if removed {
            debug!(id = %id, "Deleted asset");
        } else {
            debug!(id = %id, "Delete requested for missing asset");
        }
        Ok(removed)
    }

    async fn read(&self, filename: &str) -> Result<Bytes, StorageError> {
        let path = Self::contained_name(filename)
            .map(|name| self.root.join(name))
            .ok_or_else(|| StorageError::Read {
                path: filename.to_string(),
                message: "invalid filename".to_string(),
            })?;

        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| StorageError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }
}
