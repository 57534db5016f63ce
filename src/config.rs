//! Configuration management for BlurCraft.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `BLURCRAFT_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use blurcraft::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//!
//! println!("Listening on {}", config.bind_address());
//! println!("Storing files in {}", config.storage_dir.display());
//! ```
//!
//! # Environment Variables
//!
//! All configuration options can be set via environment variables with the `BLURCRAFT_` prefix:
//!
//! - `BLURCRAFT_HOST` - Server bind address (default: 0.0.0.0)
//! - `BLURCRAFT_PORT` - Server port (default: 3001)
//! - `BLURCRAFT_STORAGE_DIR` - Directory for stored images (default: uploads)
//! - `BLURCRAFT_STATIC_PREFIX` - URL prefix for stored images (default: /uploads)
//! - `BLURCRAFT_API_PREFIX` - URL prefix for REST routes (default: /api)
//! - `BLURCRAFT_PUBLIC_BASE_URL` - Origin for returned URLs (default: request Host)
//! - `BLURCRAFT_AUTH_SECRET` - HMAC secret for bearer tokens
//! - `BLURCRAFT_AUTH_ENABLED` - Protect write routes with tokens (default: true)
//! - `BLURCRAFT_TOKEN_TTL` - Token lifetime in seconds (default: 604800)
//! - `BLURCRAFT_FETCH_TIMEOUT` - Remote image fetch timeout in seconds (default: 10)
//! - `BLURCRAFT_MAX_UPLOAD_BYTES` - Upload size limit (default: 10 MiB)
//! - `BLURCRAFT_BODY_LIMIT_BYTES` - Request body limit (default: 50 MiB)
//! - `BLURCRAFT_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::processing::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_STATIC_PREFIX};
use crate::server::routes::{DEFAULT_API_PREFIX, DEFAULT_BODY_LIMIT};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default storage directory.
pub const DEFAULT_STORAGE_DIR: &str = "uploads";

/// Default token lifetime in seconds (7 days).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default remote fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLI Arguments
// =============================================================================

/// BlurCraft - Upload an image, add blur and a text overlay, share it.
///
/// Stores submitted images on local disk and serves them back with the
/// requested effect settings attached.
#[derive(Parser, Debug, Clone)]
#[command(name = "blurcraft")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "BLURCRAFT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "BLURCRAFT_PORT")]
    pub port: u16,

    /// URL prefix for the REST API.
    #[arg(long, default_value = DEFAULT_API_PREFIX, env = "BLURCRAFT_API_PREFIX")]
    pub api_prefix: String,

    /// Public origin used in returned URLs (e.g. https://blur.example.com).
    ///
    /// If not specified, the request's Host header is used.
    #[arg(long, env = "BLURCRAFT_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Directory where uploaded and processed images are written.
    #[arg(long, default_value = DEFAULT_STORAGE_DIR, env = "BLURCRAFT_STORAGE_DIR")]
    pub storage_dir: PathBuf,

    /// URL prefix the storage directory is served under.
    #[arg(long, default_value = DEFAULT_STATIC_PREFIX, env = "BLURCRAFT_STATIC_PREFIX")]
    pub static_prefix: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for HMAC-SHA256 bearer tokens.
    ///
    /// If not provided and auth is enabled, the server will fail to start.
    #[arg(long, env = "BLURCRAFT_AUTH_SECRET")]
    pub auth_secret: Option<String>,

    /// Require bearer tokens on delete, like and profile update routes.
    ///
    /// WARNING: Only disable authentication in development/testing.
    #[arg(long, default_value_t = true, env = "BLURCRAFT_AUTH_ENABLED", action = clap::ArgAction::Set)]
    pub auth_enabled: bool,

    /// Lifetime of issued tokens in seconds.
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL_SECS, env = "BLURCRAFT_TOKEN_TTL")]
    pub token_ttl: u64,

    // =========================================================================
    // Limits
    // =========================================================================
    /// Timeout in seconds for fetching remote image references.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, env = "BLURCRAFT_FETCH_TIMEOUT")]
    pub fetch_timeout: u64,

    /// Maximum size of a multipart upload in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "BLURCRAFT_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: u64,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT, env = "BLURCRAFT_BODY_LIMIT_BYTES")]
    pub body_limit_bytes: usize,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "BLURCRAFT_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        // Check auth secret is provided when auth is enabled
        if self.auth_enabled && self.auth_secret_or_empty().is_empty() {
            return Err(
                "Authentication is enabled but no secret provided. \
                 Set --auth-secret or BLURCRAFT_AUTH_SECRET, or disable auth with --auth-enabled=false"
                    .to_string(),
            );
        }

        if self.storage_dir.as_os_str().is_empty() {
            return Err(
                "Storage directory is required. Set --storage-dir or BLURCRAFT_STORAGE_DIR"
                    .to_string(),
            );
        }

        if !self.static_prefix.starts_with('/') {
            return Err("static_prefix must start with '/'".to_string());
        }
        if !self.api_prefix.starts_with('/') {
            return Err("api_prefix must start with '/'".to_string());
        }

        let api_prefix = self.api_prefix.trim_end_matches('/');
        let static_prefix = self.static_prefix.trim_end_matches('/');
        if !api_prefix.is_empty() && api_prefix == static_prefix {
            return Err("api_prefix and static_prefix must differ".to_string());
        }
        if api_prefix == "/health" || static_prefix == "/health" {
            return Err("'/health' is reserved for the health check".to_string());
        }

        if self.fetch_timeout == 0 {
            return Err("fetch_timeout must be greater than 0".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }
        if (self.body_limit_bytes as u64) < self.max_upload_bytes {
            return Err("body_limit_bytes must be at least max_upload_bytes".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the auth secret, or "" if not set.
    pub fn auth_secret_or_empty(&self) -> &str {
        self.auth_secret.as_deref().unwrap_or("")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl)
    }
}

// =============================================================================
// Tests
// =============================================================================
