//! HTTP server layer for BlurCraft.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     POST /api/images/process   POST /api/images/upload          │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │ (bearer)    │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//!          ImageService<S>                 dyn GalleryQuery
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{require_auth, AuthError, AuthUser, Claims, OptionalAuth, TokenAuth};
pub use handlers::{AppState, ErrorResponse, HealthResponse};
pub use routes::{create_dev_router, create_router, RouterConfig};
