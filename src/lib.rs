//! # BlurCraft
//!
//! An image submission service: a client uploads an image together with a
//! blur intensity and a styled text overlay, the server stores the bytes and
//! hands back a reference URL carrying the effect settings.
//!
//! No pixels are transformed server-side. The stored file is byte-identical
//! to the submission; blur and text travel as query parameters on the
//! returned reference for the client to render.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`overlay`] - Overlay settings and boundary validation
//! - [`data_uri`] - Inline `data:` payload encoding
//! - [`storage`] - Asset store trait and local filesystem backend
//! - [`fetch`] - Remote image fetching with a bounded timeout
//! - [`processing`] - Process, upload and delete pipeline
//! - [`gallery`] - Read-only gallery queries (mock backend)
//! - [`client`] - Submission builder and REST client
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use blurcraft::{create_router, ImageService, LocalAssetStore, MockGallery, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = LocalAssetStore::new("uploads").await?;
//!     let service = ImageService::new(store);
//!
//!     let config = RouterConfig::without_auth().with_static_dir("uploads");
//!     let router = create_router(service, Arc::new(MockGallery::default()), config);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod data_uri;
pub mod error;
pub mod fetch;
pub mod gallery;
pub mod overlay;
pub mod processing;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use client::{ApiClient, SelectedFile, Submission, SubmissionBuilder};
pub use config::Config;
pub use data_uri::DataUri;
pub use error::{
    ClientError, FetchError, FieldError, GalleryError, ProcessError, StorageError, UploadError,
    ValidationError,
};
pub use fetch::ImageFetcher;
pub use gallery::{GalleryQuery, MockGallery, PageRequest, SortOrder};
pub use overlay::{parse_process_body, OverlaySpec, ProcessRequest};
pub use processing::{ImageService, ProcessedImage};
pub use server::{create_dev_router, create_router, AppState, RouterConfig, TokenAuth};
pub use storage::{AssetKind, AssetStore, LocalAssetStore, StoredAsset};
