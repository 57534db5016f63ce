//! Asset storage layer.
//!
//! Uploaded and processed images are written verbatim to a managed storage
//! directory and served back as static files.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              ImageService               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           AssetStore Trait              │
//! │   (save / delete / read by filename)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           LocalAssetStore               │
//! │  uploads/processed-<uuid>.png           │
//! │  uploads/original-<uuid>.jpg            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Identifiers are random v4 UUIDs, so concurrent writers never collide and
//! no locking is needed.

mod asset;
mod local;

pub use asset::{AssetKind, AssetStore, StoredAsset};
pub use local::LocalAssetStore;
