//! pavg-server - Photo Archive VR Gallery service
//!
//! Imports photo folders into collections and generates A-Frame gallery
//! scenes from them via an external text-generation model.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pavg_common::config::{
    default_config_path, load_toml_config, resolve_path, GeminiConfig, ARCHIVE_PATH_ENV,
    DEFAULT_ARCHIVE_PATH, DEFAULT_SCENE_OUTPUT_PATH, SCENE_OUTPUT_PATH_ENV,
};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pavg_server::services::{CollectionStore, GeminiClient, SceneComposer};
use pavg_server::{build_router, AppState};

/// Command-line arguments for pavg-server
#[derive(Parser, Debug)]
#[command(name = "pavg-server")]
#[command(about = "Photo archive and VR gallery scene service")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "PAVG_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "PAVG_PORT")]
    port: u16,

    /// Collection archive root (overrides ARCHIVE_PATH)
    #[arg(long)]
    archive_path: Option<PathBuf>,

    /// Scene output root (overrides SCENE_OUTPUT_PATH)
    #[arg(long)]
    scene_output_path: Option<PathBuf>,

    /// TOML config file (default: ~/.config/pavg/config.toml)
    #[arg(short, long, env = "PAVG_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pavg_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting pavg-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config = match args.config.clone().or_else(default_config_path) {
        Some(path) => load_toml_config(&path).context("Failed to load config file")?,
        None => Default::default(),
    };

    let archive_root = resolve_path(
        args.archive_path.as_deref(),
        ARCHIVE_PATH_ENV,
        toml_config.archive_path.as_deref(),
        DEFAULT_ARCHIVE_PATH,
    );
    let scene_root = resolve_path(
        args.scene_output_path.as_deref(),
        SCENE_OUTPUT_PATH_ENV,
        toml_config.scene_output_path.as_deref(),
        DEFAULT_SCENE_OUTPUT_PATH,
    );
    info!("Archive root: {}", archive_root.display());
    info!("Scene output root: {}", scene_root.display());

    let store = CollectionStore::new(&archive_root).context("Failed to open archive root")?;
    std::fs::create_dir_all(&scene_root).context("Failed to create scene output root")?;

    // The credential is checked once here; generate requests never retry it.
    let gemini_config = GeminiConfig::resolve(&toml_config);
    let composer = match GeminiClient::new(&gemini_config) {
        Ok(client) => {
            info!(model = %gemini_config.model, "Scene generation enabled");
            let composer = SceneComposer::new(&scene_root, store.clone(), Arc::new(client))
                .context("Failed to initialize scene composer")?;
            Some(Arc::new(composer))
        }
        Err(e) => {
            warn!("Scene generation disabled: {}", e);
            None
        }
    };

    let state = AppState::new(store, scene_root, composer);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.host, args.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
