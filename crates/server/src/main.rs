use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use casemirror_core::{
    load_config, validate_config, BoxStorage, Collaborators, CycleCoordinator, CycleRunner,
    PdfRenderer, PortalClient, RedesignSource,
};
use casemirror_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CASEMIRROR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Base folder: {:?}", config.folders.base_folder);

    // Create storage client
    let storage = Arc::new(
        BoxStorage::new(config.storage.clone()).context("Failed to create storage client")?,
    );
    info!("Storage client initialized ({})", config.storage.api_url);

    // Create portal client; it backs the listing, status and key/value seams
    let portal = Arc::new(
        PortalClient::new(config.portal.clone()).context("Failed to create portal client")?,
    );

    let redesigns: Option<Arc<dyn RedesignSource>> = if portal.has_redesigns() {
        info!("Redesign mirroring enabled");
        Some(portal.clone() as Arc<dyn RedesignSource>)
    } else {
        info!("No redesigns_url configured, redesign mirroring disabled");
        None
    };

    let coordinator = Arc::new(CycleCoordinator::new(
        &config,
        Collaborators {
            storage,
            cases: portal.clone(),
            redesigns,
            reporter: portal.clone(),
            kv: portal,
            renderer: Arc::new(PdfRenderer::new()),
        },
    ));

    let runner = Arc::new(CycleRunner::new(
        coordinator,
        Duration::from_secs(config.ingest.poll_interval_secs),
    ));

    if config.ingest.enabled {
        runner.start();
        info!("Cycle runner started");
    } else {
        info!("Cycle loop disabled in config, cycles run only when triggered");
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&runner)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop runner if running
    if runner.is_running() {
        info!("Stopping cycle runner...");
        runner.stop().await;
        info!("Cycle runner stopped");
    }

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
