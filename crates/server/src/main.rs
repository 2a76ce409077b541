use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kuckmal_core::{
    load_config, validate_config, CatalogIngestor, Config, FeedFetcher, HttpFeedFetcher,
    MediaStore, QueryEngine, SqliteStore,
};

use kuckmal_server::api::create_router;
use kuckmal_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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

    info!("kuckmal {}", VERSION);

    // Determine config path
    let config_path = std::env::var("KUCKMAL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; a missing file means all defaults
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No configuration file at {:?}, using defaults", config_path);
        Config::default()
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Database path: {:?}", config.database.path);
    info!("Feed URL: {}", config.feed.full_url);

    // Log a config fingerprint so differing deployments are tellable apart
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    // Create SQLite media store
    let store: Arc<dyn MediaStore> = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to create media store")?,
    );
    info!("Media store initialized");

    // Create feed fetcher and ingestion coordinator
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(
        HttpFeedFetcher::new(config.feed.timeout_secs).context("Failed to create feed fetcher")?,
    );
    let ingestor = Arc::new(CatalogIngestor::new(
        Arc::clone(&store),
        fetcher,
        config.feed.clone(),
        config.ingest.clone(),
    ));
    info!("Ingestion coordinator initialized");

    // Create query engine
    let engine = QueryEngine::new(Arc::clone(&store), &config.query);

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), engine, ingestor));
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
