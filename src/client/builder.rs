//! Client-side submission assembly.

use std::path::Path;

use bytes::Bytes;

use crate::data_uri::{is_image_mime, mime_for_extension, DataUri};
use crate::error::ClientError;
use crate::overlay::{OverlaySpec, ProcessRequest};

/// Largest file the builder accepts.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Default blur intensity for a fresh builder.
pub const DEFAULT_BLUR_INTENSITY: i64 = 10;

const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// A file picked by the user, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,

    /// Declared type, e.g. `image/png`
    pub content_type: String,

    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its type from the extension.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| ClientError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .unwrap_or(UNKNOWN_CONTENT_TYPE)
            .to_string();

        Ok(Self::from_bytes(name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// The file as a self-describing `data:` URI.
    pub fn to_data_uri(&self) -> String {
        DataUri::encode(&self.content_type, &self.bytes)
    }
}

/// A complete submission, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub file: SelectedFile,
    pub overlay: OverlaySpec,
    pub blur_intensity: i64,
}

impl Submission {
    /// Body for `POST /api/images/process`, carrying the file inline.
    pub fn to_request(&self) -> ProcessRequest {
        ProcessRequest {
            image_data: Some(self.file.to_data_uri()),
            image_url: None,
            text_overlay: self.overlay.clone(),
            blur_intensity: self.blur_intensity,
        }
    }
}

/// Collects a file plus overlay settings and produces a [`Submission`].
///
/// Nothing here touches the network; that happens only when the built
/// submission is handed to [`ApiClient::process`](super::ApiClient::process).
///
/// # Example
///
/// ```ignore
/// let mut builder = SubmissionBuilder::new();
/// builder.select_file(SelectedFile::read("photo.jpg").await?)?;
/// builder.overlay_mut().text = "HELLO".to_string();
/// builder.set_blur_intensity(15);
/// let submission = builder.build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SubmissionBuilder {
    file: Option<SelectedFile>,
    overlay: OverlaySpec,
    blur_intensity: i64,
}

impl SubmissionBuilder {
    pub fn new() -> Self {
        Self {
            file: None,
            overlay: OverlaySpec::default(),
            blur_intensity: DEFAULT_BLUR_INTENSITY,
        }
    }

    /// Replace the selected file.
    ///
    /// Files over 10 MiB or not declared as `image/*` are rejected and the
    /// previous selection is kept.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ClientError> {
        if file.size() > MAX_FILE_BYTES {
            return Err(ClientError::FileTooLarge {
                size: file.size(),
                limit: MAX_FILE_BYTES,
            });
        }
        if !is_image_mime(&file.content_type) {
            return Err(ClientError::UnsupportedType {
                content_type: file.content_type,
            });
        }
        self.file = Some(file);
        Ok(())
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn overlay(&self) -> &OverlaySpec {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut OverlaySpec {
        &mut self.overlay
    }

    pub fn set_overlay(&mut self, overlay: OverlaySpec) {
        self.overlay = overlay;
    }

    pub fn blur_intensity(&self) -> i64 {
        self.blur_intensity
    }

    pub fn set_blur_intensity(&mut self, blur: i64) {
        self.blur_intensity = blur;
    }

    /// Drop the file and restore default settings.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Assemble a submission. Requires a file and non-blank overlay text.
    ///
    /// Range checks are left to the server, which reports every bad field.
    pub fn build(&self) -> Result<Submission, ClientError> {
        let file = self.file.clone().ok_or(ClientError::NoImage)?;
        if self.overlay.text.trim().is_empty() {
            return Err(ClientError::EmptyText);
        }
        Ok(Submission {
            file,
            overlay: self.overlay.clone(),
            blur_intensity: self.blur_intensity,
        })
    }
}

impl Default for SubmissionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
