//! qrcache server - HTTP API for the previous-query-results cache.

use anyhow::Result;
use axum::Router;
use clap::Parser;
use qrcache_server::{config, logging, routes, state, sweeper};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// qrcache server - persist and narrow previous query results per session.
#[derive(Parser, Debug)]
#[command(name = "qrcache-server")]
#[command(about = "HTTP API for the previous-query-results cache")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (INFO level for all qrcache targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "sweep=debug").
    /// Can be specified multiple times. Targets are prefixed with "qrcache::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(
        target: "qrcache::startup",
        "Loaded configuration (port: {}, db: {}, entities: {})",
        config.port,
        config.db_path.display(),
        config.entities.len()
    );

    let state = Arc::new(AppState::new(config.clone())?);
    tracing::info!(target: "qrcache::startup", "Initialized application state");

    sweeper::spawn_sweeper(state.clone());

    let app = Router::new()
        .nest("/api", routes::api_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Sweeps are refused until the process is fully up
    state.results.mark_started();
    tracing::info!(target: "qrcache::startup", "Starting server on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
