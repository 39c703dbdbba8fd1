//! preview-deck - Main entry point
//!
//! Builds the track registry from configuration, wires the coordinator,
//! fade engine, and notifier together, and serves the HTTP/SSE control
//! surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preview_deck::api;
use preview_deck::config::TomlConfig;
use preview_deck::events::EventBus;
use preview_deck::media::SimulatedMedia;
use preview_deck::notify::Notifier;
use preview_deck::playback::{Coordinator, FadeEngine, FadeSettings};
use preview_deck::track::{Track, TrackRegistry};

/// Command-line arguments for preview-deck
#[derive(Parser, Debug)]
#[command(name = "preview-deck")]
#[command(about = "Single-active-track audio preview service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "PREVIEW_DECK_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long, env = "PREVIEW_DECK_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TomlConfig::default(),
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("preview_deck={},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = args.port.unwrap_or(config.port);
    info!("Starting preview-deck on port {}", port);

    // Build the registry once; tracks are immutable afterward
    let tracks: Vec<Track> = config
        .tracks
        .iter()
        .map(|entry| {
            let media = SimulatedMedia::new(Duration::from_millis(entry.duration_ms))
                .with_start_delay(Duration::from_millis(entry.start_delay_ms));
            Track::new(
                entry.title.clone(),
                Arc::new(media),
                entry.download_url.clone(),
            )
        })
        .collect();
    let registry = Arc::new(TrackRegistry::new(tracks));
    info!("Registered {} preview tracks", registry.len());

    let bus = EventBus::new(256);
    let notifier = Notifier::new(
        bus.clone(),
        Duration::from_millis(config.toast.dismiss_after_ms),
    );
    let coordinator = Coordinator::new(
        registry,
        Arc::clone(&notifier),
        bus.clone(),
        FadeEngine::new(FadeSettings::from_config(&config.fade)),
        Duration::from_millis(config.pulse_ms),
    );

    let app_state = api::AppState {
        coordinator,
        notifier,
        bus,
        port,
    };
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
