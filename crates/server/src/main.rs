use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reeldigest_core::{
    load_config, validate_config, ApifyResolver, HttpMediaFetcher, InMemoryStatusStore, JobQueue,
    OpenAiSummarizer, OpenAiTranscriber, Providers, SqliteResultSink,
};
use reeldigest_server::api::create_router;
use reeldigest_server::state::AppState;

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
    let config_path = std::env::var("REELDIGEST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.storage.database_path);
    info!("Temp media dir: {:?}", config.storage.temp_dir);

    if let Some(parent) = config
        .storage
        .database_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }

    // Create SQLite result sink
    let results = Arc::new(
        SqliteResultSink::new(&config.storage.database_path)
            .context("Failed to create result sink")?,
    );
    info!("Result sink initialized");

    // Create stage providers
    let providers = Providers {
        resolver: Arc::new(
            ApifyResolver::new(config.resolver.clone())
                .context("Failed to create metadata resolver")?,
        ),
        fetcher: Arc::new(
            HttpMediaFetcher::new(&config.download, config.storage.temp_dir.clone())
                .context("Failed to create media fetcher")?,
        ),
        transcriber: Arc::new(
            OpenAiTranscriber::new(config.openai.clone())
                .context("Failed to create transcriber")?,
        ),
        summarizer: Arc::new(
            OpenAiSummarizer::new(config.openai.clone())
                .context("Failed to create summarizer")?,
        ),
    };
    info!(
        "Using transcription model {} and summarization model {}",
        config.openai.transcription_model, config.openai.summarization_model
    );

    let queue = JobQueue::new(providers, Arc::new(InMemoryStatusStore::new()), results);

    let addr = SocketAddr::new(config.server.host, config.server.port);

    // Create app state
    let state = Arc::new(AppState::new(config, queue));
    info!(
        "Ingest rate limit: {} requests per minute per client",
        state.ingest_limiter().requests_per_minute()
    );

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
