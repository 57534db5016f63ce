//! Router configuration for BlurCraft.
//!
//! This module defines the HTTP routes and applies middleware for
//! authentication, CORS, body limits and panic recovery.
//!
//! # Route Structure
//!
//! ```text
//! /health                               - Health check (public)
//! /api/images/process                   - Process an image (public)
//! /api/images/upload                    - Upload an image (public)
//! /api/images/{imageId}                 - Delete an image (protected)
//! /api/images/{imageId}/like            - Like an image (protected)
//! /api/images/user[/{userId}]           - A user's images (protected)
//! /api/gallery[/featured|/search|/{id}] - Gallery reads (public)
//! /api/auth/{signin,signup,signout,me}  - Mock auth (public)
//! /api/users/{userId}[/images]          - Profiles (PUT protected)
//! /uploads/*                            - Stored files (static)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use blurcraft::gallery::MockGallery;
//! use blurcraft::processing::ImageService;
//! use blurcraft::server::routes::{create_router, RouterConfig};
//! use blurcraft::storage::LocalAssetStore;
//!
//! let store = LocalAssetStore::new("uploads").await?;
//! let service = ImageService::new(store);
//!
//! let config = RouterConfig::new("my-secret-key")
//!     .with_static_dir("uploads")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, Arc::new(MockGallery::default()), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::auth::{require_auth, TokenAuth, DEFAULT_TOKEN_TTL};
use super::handlers::{
    delete_image_handler, featured_handler, gallery_handler, gallery_image_handler,
    health_handler, like_image_handler, me_handler, not_found_handler, own_images_handler,
    panic_response, process_handler, search_handler, sign_in_handler, sign_out_handler,
    sign_up_handler, update_user_handler, upload_handler, user_images_handler,
    user_profile_handler, AppState,
};
use crate::gallery::GalleryQuery;
use crate::processing::ImageService;
use crate::storage::AssetStore;

/// Default request body limit. JSON process bodies carry base64, which is a
/// third larger than the file itself.
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

pub const DEFAULT_API_PREFIX: &str = "/api";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Secret key for token signing (empty = random per-process key)
    pub auth_secret: String,

    /// Whether protected routes require a bearer token
    pub auth_enabled: bool,

    /// Lifetime of issued tokens
    pub token_ttl: Duration,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Directory served at the service's static prefix (None = not served)
    pub static_dir: Option<PathBuf>,

    /// Prefix for the REST routes
    pub api_prefix: String,

    /// Origin used in returned URLs (None = derive from `Host`)
    pub public_base_url: Option<String>,

    /// Maximum request body size in bytes
    pub body_limit: usize,
}

impl RouterConfig {
    /// Create a new router configuration with the given auth secret.
    ///
    /// By default:
    /// - Authentication is enabled
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - REST routes live under `/api`
    /// - Bodies up to 50 MiB are accepted
    pub fn new(auth_secret: impl Into<String>) -> Self {
        Self {
            auth_secret: auth_secret.into(),
            auth_enabled: true,
            token_ttl: DEFAULT_TOKEN_TTL,
            cors_origins: None, // Allow any origin by default
            enable_tracing: true,
            static_dir: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            public_base_url: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Create a configuration with authentication disabled.
    ///
    /// **Warning**: This should only be used for development/testing.
    pub fn without_auth() -> Self {
        Self {
            auth_enabled: false,
            ..Self::new(String::new())
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable authentication.
    pub fn with_auth_enabled(mut self, enabled: bool) -> Self {
        self.auth_enabled = enabled;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Serve stored files from `dir`.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    fn token_auth(&self) -> TokenAuth {
        let auth = if self.auth_secret.is_empty() {
            TokenAuth::ephemeral()
        } else {
            TokenAuth::new(&self.auth_secret)
        };
        auth.with_ttl(self.token_ttl)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public routes (health, process, upload, gallery, auth)
/// - Protected routes (delete, like, user images, profile update)
/// - Static file serving for stored images
/// - CORS, body limit and panic recovery
/// - Request tracing (optional)
///
/// The static URL prefix is taken from `service`, so returned references
/// always resolve against the directory served here.
pub fn create_router<S>(
    service: ImageService<S>,
    gallery: Arc<dyn GalleryQuery>,
    config: RouterConfig,
) -> Router
where
    S: AssetStore + 'static,
{
    let auth = config.token_auth();
    let static_prefix = service.static_prefix().to_string();

    // Create application state
    let mut app_state = AppState::new(service, gallery, auth.clone());
    if let Some(url) = &config.public_base_url {
        app_state = app_state.with_public_base_url(url);
    }

    let api = build_api_router(app_state, &auth, config.auth_enabled);

    let mut router = Router::new().route("/health", get(health_handler));

    let api_prefix = config.api_prefix.trim_end_matches('/');
    router = if api_prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(api_prefix, api)
    };

    if let Some(dir) = &config.static_dir {
        let prefix = if static_prefix.is_empty() {
            "/"
        } else {
            static_prefix.as_str()
        };
        router = if prefix == "/" {
            router.fallback_service(ServeDir::new(dir))
        } else {
            router
                .nest_service(prefix, ServeDir::new(dir))
                .fallback(not_found_handler)
        };
    } else {
        router = router.fallback(not_found_handler);
    }

    let router = router
        .layer(Extension(auth))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(build_cors_layer(&config))
        .layer(CatchPanicLayer::custom(panic_response));

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the REST routes, placing the protected ones behind the token
/// middleware when `auth_enabled`.
fn build_api_router<S>(app_state: AppState<S>, auth: &TokenAuth, auth_enabled: bool) -> Router
where
    S: AssetStore + 'static,
{
    let public_routes = Router::new()
        .route("/images/process", post(process_handler::<S>))
        .route("/images/upload", post(upload_handler::<S>))
        .route("/gallery", get(gallery_handler::<S>))
        .route("/gallery/featured", get(featured_handler::<S>))
        .route("/gallery/search", get(search_handler::<S>))
        .route("/gallery/{id}", get(gallery_image_handler::<S>))
        .route("/auth/signin", post(sign_in_handler::<S>))
        .route("/auth/signup", post(sign_up_handler::<S>))
        .route("/auth/signout", post(sign_out_handler))
        .route("/auth/me", get(me_handler::<S>))
        .route("/users/{userId}", get(user_profile_handler::<S>))
        .route("/users/{userId}/images", get(user_images_handler::<S>));

    let protected_routes = Router::new()
        .route("/images/{imageId}", delete(delete_image_handler::<S>))
        .route("/images/{imageId}/like", post(like_image_handler::<S>))
        .route("/images/user", get(own_images_handler::<S>))
        .route("/images/user/{userId}", get(user_images_handler::<S>))
        .route("/users/{userId}", put(update_user_handler::<S>));

    let protected_routes = if auth_enabled {
        // route_layer so unmatched paths fall through to the 404 fallback
        protected_routes.route_layer(middleware::from_fn_with_state(auth.clone(), require_auth))
    } else {
        protected_routes
    };

    public_routes
        .merge(protected_routes)
        .with_state(app_state)
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            // Parse origins into HeaderValues
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

/// Create a development router with authentication disabled.
///
/// **Warning**: This should only be used for local development and testing.
pub fn create_dev_router<S>(service: ImageService<S>, gallery: Arc<dyn GalleryQuery>) -> Router
where
    S: AssetStore + 'static,
{
    create_router(service, gallery, RouterConfig::without_auth())
}

// =============================================================================
// Tests
// =============================================================================
