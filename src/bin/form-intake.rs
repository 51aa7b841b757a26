//! Form Intake Server Binary
//!
//! Loads configuration, wires the per-form pipelines to the collector and
//! serves the submission API until Ctrl+C or SIGTERM.

use anyhow::Context;
use form_intake::{
    api::{build_router, AppState},
    collector::HttpTransport,
    config::Config,
    forms::FormIntake,
    middleware::RateLimiter,
    observability::{init_observability, MetricsCollector},
    shutdown::shutdown_signal,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::from_file_with_env(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    init_observability(&config.logging.level, &config.logging.format);
    info!("Starting Form Intake Server");
    info!("Configuration loaded and validated from {}", config_path);

    let metrics = Arc::new(MetricsCollector::new());

    let rate_limiter = Arc::new(RateLimiter::new());
    rate_limiter
        .clone()
        .start_cleanup_task(Duration::from_secs(config.server.cleanup_interval_secs));
    info!(
        "Rate limiter initialized with {}s cleanup interval",
        config.server.cleanup_interval_secs
    );

    let transport = Arc::new(HttpTransport::new(&config.collector)?);
    let intake = Arc::new(FormIntake::from_config(
        &config,
        transport,
        rate_limiter,
        Some(metrics.clone()),
    )?);

    let app_state = AppState {
        intake,
        metrics,
        per_client_rate_limit: config.server.per_client_rate_limit,
    };

    let body_limit_bytes = config.server.max_body_size_kb * 1024;
    let app = build_router(app_state, body_limit_bytes);
    info!("Request bodies limited to {} KB", config.server.max_body_size_kb);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");

    Ok(())
}
