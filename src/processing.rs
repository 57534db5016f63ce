//! Image submission pipeline.
//!
//! The ImageService is the entry point for process, upload and delete
//! requests. It orchestrates:
//! - Input selection (inline data URI or remote reference)
//! - Payload decoding and remote fetches
//! - Verbatim storage under a generated identifier
//! - Reference URL construction
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ImageService                         │
//! │  process():                                                  │
//! │   1. imageData? ──► strip data: prefix, base64 decode        │
//! │      imageUrl?  ──► ImageFetcher (bounded timeout)           │
//! │   2. AssetStore::save(Processed, ext, bytes)                 │
//! │   3. {static_prefix}/{filename}?blur={n}&text={text}         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! No pixels are transformed: blur and text travel as query hints for the
//! client to render.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::data_uri::{decode_image_payload, extension_for_mime, is_image_mime, mime_for_extension};
use crate::error::{ProcessError, StorageError, UploadError};
use crate::fetch::ImageFetcher;
use crate::overlay::ProcessRequest;
use crate::storage::{AssetKind, AssetStore, StoredAsset};

/// Default URL prefix under which the storage directory is served.
pub const DEFAULT_STATIC_PREFIX: &str = "/uploads";

/// Default maximum upload size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extension used when no type information is available. Processed output
/// is always stored under it.
const FALLBACK_EXTENSION: &str = "png";

/// Image types that can carry script and must not be served under their own
/// extension from this origin.
const SCRIPTABLE_EXTENSIONS: &[&str] = &["svg"];

/// Result of a successful process call.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub asset: StoredAsset,

    /// Path plus effect hints, e.g. `/uploads/processed-….png?blur=15&text=HELLO`
    pub reference: String,
}

/// Service for storing submissions and building reference URLs.
pub struct ImageService<S: AssetStore> {
    store: Arc<S>,
    fetcher: ImageFetcher,
    static_prefix: String,
    max_upload_bytes: u64,
}

impl<S: AssetStore> ImageService<S> {
    /// Create a service with default fetcher, prefix and upload limit.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            fetcher: ImageFetcher::default(),
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_fetcher(mut self, fetcher: ImageFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_static_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.static_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn static_prefix(&self) -> &str {
        &self.static_prefix
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Store the submitted image and return its reference.
    ///
    /// `request` must already have passed boundary validation; it is
    /// re-checked here so direct library callers get the same guarantee.
    /// Nothing is written unless validation passes.
    pub async fn process(
        &self,
        request: &ProcessRequest,
        origin: Option<&str>,
    ) -> Result<ProcessedImage, ProcessError> {
        request.validate()?;

        let (bytes, mime) = match (&request.image_data, &request.image_url) {
            (Some(data), _) => {
                let (mime, bytes) =
                    decode_image_payload(data).map_err(ProcessError::InvalidImageData)?;
                (Bytes::from(bytes), mime)
            }
            (None, Some(url)) => {
                let fetched = self
                    .fetcher
                    .fetch(url, origin, self.max_upload_bytes)
                    .await?;
                (fetched.data, fetched.content_type)
            }
            (None, None) => return Err(ProcessError::InputMissing),
        };

        // The declared type never picks the extension, so a served file
        // cannot come back as markup.
        debug!(
            declared = mime.as_deref().unwrap_or("none"),
            blur = request.blur_intensity,
            text = %request.text_overlay.text,
            size = bytes.len(),
            "Processing image"
        );

        let asset = self
            .store
            .save(AssetKind::Processed, FALLBACK_EXTENSION, bytes)
            .await?;
        let reference = self.reference_for(&asset, request);

        info!(id = %asset.id, reference = %reference, "Image processed");

        Ok(ProcessedImage { asset, reference })
    }

    /// Store a raw multipart upload.
    ///
    /// The original filename's extension is kept; without one the declared
    /// content type decides, falling back to `.png`. Scriptable types such as
    /// SVG are always stored as `.png`.
    pub async fn save_upload(
        &self,
        data: Bytes,
        original_name: Option<&str>,
        content_type: &str,
    ) -> Result<StoredAsset, UploadError> {
        if !is_image_mime(content_type) {
            return Err(UploadError::NotAnImage {
                content_type: content_type.to_string(),
            });
        }

        let size = data.len() as u64;
        if size > self.max_upload_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        let extension = original_name
            .and_then(file_extension)
            .or_else(|| extension_for_mime(content_type))
            .filter(|ext| !is_scriptable(ext))
            .unwrap_or(FALLBACK_EXTENSION);

        let asset = self.store.save(AssetKind::Original, extension, data).await?;
        info!(id = %asset.id, size = asset.size, "Upload stored");
        Ok(asset)
    }

    /// Delete an asset. Missing assets are not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let removed = self.store.delete(id).await?;
        info!(id = %id, removed = removed, "Image delete");
        Ok(())
    }

    /// Static path of a stored asset, without effect hints.
    pub fn asset_path(&self, asset: &StoredAsset) -> String {
        format!("{}/{}", self.static_prefix, asset.filename)
    }

    fn reference_for(&self, asset: &StoredAsset, request: &ProcessRequest) -> String {
        format!(
            "{}?blur={}&text={}",
            self.asset_path(asset),
            request.blur_intensity,
            urlencoding::encode(&request.text_overlay.text)
        )
    }
}

impl<S: AssetStore> Clone for ImageService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fetcher: self.fetcher.clone(),
            static_prefix: self.static_prefix.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

fn is_scriptable(ext: &str) -> bool {
    SCRIPTABLE_EXTENSIONS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(ext))
}

/// Extension of a filename, if it names a known image type.
fn file_extension(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    mime_for_extension(ext).map(|_| ext)
}
