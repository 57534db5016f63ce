//! Stored asset types and the storage trait.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StorageError;

/// What produced an asset. Determines the filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Raw multipart upload
    Original,

    /// Output of the process endpoint
    Processed,
}

impl AssetKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            AssetKind::Original => "original",
            AssetKind::Processed => "processed",
        }
    }
}

/// A file written once per upload event.
///
/// Assets are never updated; they only disappear through an explicit delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    /// Filename without extension, e.g. `processed-6f1c...`
    pub id: String,

    /// Filename within the storage directory, e.g. `processed-6f1c....png`
    pub filename: String,

    /// Location on disk
    #[serde(skip)]
    pub path: PathBuf,

    /// Size in bytes
    pub size: u64,

    pub created_at: DateTime<Utc>,
}

/// Storage backend for image assets.
///
/// Implementations must write bytes verbatim and treat deletion of a missing
/// asset as success.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Write `data` under a freshly generated identifier.
    ///
    /// `extension` is given without a leading dot.
    async fn save(
        &self,
        kind: AssetKind,
        extension: &str,
        data: Bytes,
    ) -> Result<StoredAsset, StorageError>;

    /// Remove the asset identified by `id`.
    ///
    /// `id` may be a bare identifier (`original-<uuid>`) or a filename with
    /// extension. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;

    /// Read a stored file back by filename.
    async fn read(&self, filename: &str) -> Result<Bytes, StorageError>;
}
