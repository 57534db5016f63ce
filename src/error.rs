use serde::Serialize;
use thiserror::Error;

/// A single invalid field reported by boundary validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted field path as it appears on the wire (e.g. `textOverlay.color`)
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every field that failed validation, in the order they were checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {}", field_list(.0))]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` is among the reported failures.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

fn field_list(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors fetching a remote image reference
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The reference could not be turned into an absolute URL
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    /// No response within the configured timeout
    #[error("Request timeout after {seconds}s fetching {url}")]
    Timeout { url: String, seconds: u64 },

    /// The remote answered with a non-2xx status
    #[error("Failed to fetch image: {status} from {url}")]
    Status { url: String, status: u16 },

    /// The remote body is larger than the upload limit
    #[error("Remote image exceeds {}MB from {url}", .limit / (1024 * 1024))]
    TooLarge { url: String, limit: u64 },

    /// Connection or body read failure
    #[error("Failed to fetch image: {0}")]
    Request(String),
}

/// Filesystem errors from the asset store
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Failed to create storage directory {path}: {message}")]
    CreateDir { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to delete {path}: {message}")]
    Delete { path: String, message: String },

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
}

/// Errors from the process pipeline
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// Overlay or blur values out of range (should map to HTTP 400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Neither `imageData` nor `imageUrl` was supplied
    #[error("Image URL or image data is required")]
    InputMissing,

    /// Inline payload is not valid base64
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the multipart upload endpoint
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("No image file provided")]
    MissingFile,

    #[error("File size too large. Maximum size is {}MB.", .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },

    #[error("Only image files are allowed (got {content_type})")]
    NotAnImage { content_type: String },

    #[error("Invalid multipart body: {0}")]
    Multipart(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from gallery queries
#[derive(Debug, Clone, Error)]
pub enum GalleryError {
    #[error("Search query is required")]
    MissingQuery,

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Gallery backend error: {0}")]
    Backend(String),
}

/// Catch-all request errors not owned by a specific pipeline
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

/// Errors surfaced by the submission builder and API client.
///
/// These are meant to be shown to the user; none of them panic.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("File size must be less than {}MB", .limit / (1024 * 1024))]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Please select a valid image file (got {content_type})")]
    UnsupportedType { content_type: String },

    #[error("Please select an image first")]
    NoImage,

    #[error("Please enter text for the overlay")]
    EmptyText,

    #[error("Failed to read file {path}: {message}")]
    Io { path: String, message: String },

    /// Transport failure or undecodable response
    #[error("Request failed: {0}")]
    Http(String),

    /// The server answered with `success: false`
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e.to_string())
    }
}
