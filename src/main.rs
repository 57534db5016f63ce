//! BlurCraft - image submission server.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blurcraft::{
    config::Config,
    fetch::ImageFetcher,
    gallery::MockGallery,
    processing::ImageService,
    server::{create_router, RouterConfig},
    storage::LocalAssetStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("BlurCraft v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Storage dir: {}", config.storage_dir.display());
    info!("  Static prefix: {}", config.static_prefix);
    info!("  API prefix: {}", config.api_prefix);
    info!(
        "  Limits: {}MB uploads, {}MB bodies, {}s fetch timeout",
        config.max_upload_bytes / (1024 * 1024),
        config.body_limit_bytes / (1024 * 1024),
        config.fetch_timeout
    );
    if let Some(ref url) = config.public_base_url {
        info!("  Public base URL: {}", url);
    }

    // Auth status with warning if disabled
    if config.auth_enabled {
        info!("  Auth: enabled");
    } else {
        warn!("  Auth: DISABLED - delete and profile routes are publicly accessible");
        warn!("        Enable for production: --auth-enabled=true --auth-secret=<secret>");
    }

    // Create the asset store
    let store = match LocalAssetStore::new(&config.storage_dir).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open storage: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Create image service
    let service = ImageService::new(store)
        .with_fetcher(ImageFetcher::new(config.fetch_timeout()))
        .with_static_prefix(config.static_prefix.clone())
        .with_max_upload_bytes(config.max_upload_bytes);

    let gallery = Arc::new(MockGallery::new(config.static_prefix.clone()));

    // Create router
    let router = create_router(service, gallery, build_router_config(&config));

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}{}/gallery", addr, config.api_prefix);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "blurcraft=debug,tower_http=debug"
    } else {
        "blurcraft=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    // Sign-in issues tokens even with auth disabled
    let mut router_config = RouterConfig::new(config.auth_secret_or_empty())
        .with_auth_enabled(config.auth_enabled)
        .with_token_ttl(config.token_ttl())
        .with_static_dir(config.storage_dir.clone())
        .with_api_prefix(config.api_prefix.clone())
        .with_body_limit(config.body_limit_bytes);

    if let Some(ref url) = config.public_base_url {
        router_config = router_config.with_public_base_url(url.clone());
    }

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}
