//! Axum API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_api::{create_router, metrics, ApiConfig, AppState};
use reel_providers::ProviderConfig;
use reel_worker::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    info!("Starting reel-api");

    // Load configuration
    let config = ApiConfig::from_env();
    let pipeline = PipelineConfig::from_env();
    let providers = ProviderConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);
    info!(?pipeline, ?providers, "Pipeline configuration");

    match (reel_media::check_ffmpeg(), reel_media::check_ffprobe()) {
        (Ok(ffmpeg), Ok(ffprobe)) => {
            info!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "Found FFmpeg")
        }
        (ffmpeg, ffprobe) => warn!(
            ffmpeg_found = ffmpeg.is_ok(),
            ffprobe_found = ffprobe.is_ok(),
            "FFmpeg tools missing; jobs will fail at assembly"
        ),
    }

    let state = AppState::build(config.clone(), &pipeline, &providers);
    state
        .store()
        .ensure()
        .await
        .with_context(|| format!("creating asset directory {}", pipeline.asset_dir.display()))?;

    // Initialize metrics
    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
