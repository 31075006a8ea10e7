//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use axum::{
    Router, http,
    http::{Method, header},
};
use media::{ArtifactStore, CliEngines, MediaAppState, MediaConfig, Reaper, media_router};
use platform::rate_limit::AdmissionController;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,media=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MediaConfig::from_env();

    // Working directories
    let store = ArtifactStore::new(config.upload_dir.clone(), config.output_dir.clone());
    store.ensure_dirs().await?;
    tracing::info!(
        uploads = %config.upload_dir.display(),
        outputs = %config.output_dir.display(),
        "Storage ready"
    );

    // Engines: a failed warm-up leaves the service up, remove-bg answers 503
    let engines = CliEngines::from_config(&config);
    if let Err(e) = engines.warm_up().await {
        tracing::warn!(
            error = %e,
            model = %config.rembg_model,
            "Background removal model failed to load, continuing anyway"
        );
    }

    let admission = Arc::new(AdmissionController::new(config.rate_limit.clone()));

    // Startup cleanup: leftovers from a previous run
    let reaper = Arc::new(Reaper::from_config(&config, admission.clone()));
    let report = reaper.sweep().await;
    tracing::info!(
        files_removed = report.files_removed,
        files_failed = report.files_failed,
        "Startup cleanup completed"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper_task = tokio::spawn(reaper.clone().run(config.reap_interval, shutdown_rx));

    // CORS configuration
    let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());
    let allow_origin = if allowed_origins.split(',').any(|origin| origin.trim() == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<http::HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .expose_headers([header::CONTENT_DISPOSITION, header::RETRY_AFTER]);

    let state = MediaAppState {
        engines: Arc::new(engines),
        admission,
        store: Arc::new(store),
        reaper,
        config: Arc::new(config),
    };

    // Build router
    let app = Router::new()
        .merge(media_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Stop the reaper once in-flight requests have drained
    shutdown_tx.send(true).ok();
    reaper_task.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
