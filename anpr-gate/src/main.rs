//! anpr-gate - Vehicle entry/exit logging service
//!
//! Operators upload a vehicle photo at the entry or exit gate; the
//! service recognizes the license plate through an external backend,
//! records a timestamped event, and serves a dashboard summarizing
//! every plate seen at the facility.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use anpr_common::config::{ensure_root_folder, load_toml_config, resolve_root_folder};
use anpr_gate::config::resolve_recognition_settings;
use anpr_gate::services::recognition::MindeeClient;
use anpr_gate::{build_router, AppState};

/// Command-line arguments for anpr-gate
#[derive(Parser, Debug)]
#[command(name = "anpr-gate")]
#[command(about = "Vehicle entry/exit logging service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5810", env = "ANPR_PORT")]
    port: u16,

    /// Root folder holding the event database
    #[arg(short, long, env = "ANPR_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting ANPR Gate Log (anpr-gate) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Parse command-line arguments
    let args = Args::parse();

    // Resolve root folder (CLI -> env -> TOML -> platform default)
    let toml_config = load_toml_config().context("Failed to load config file")?;
    let root_folder = resolve_root_folder(args.root_folder.as_ref(), &toml_config);
    let db_path = ensure_root_folder(&root_folder).context("Failed to prepare root folder")?;
    info!("Database path: {}", db_path.display());

    let pool = anpr_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    // Recognition backend credentials (env -> TOML)
    let settings = resolve_recognition_settings(&toml_config)
        .context("Failed to resolve recognition settings")?;
    let recognizer = MindeeClient::new(settings.api_key, settings.model_id)
        .context("Failed to create Mindee client")?;
    info!("✓ Recognition backend configured");

    // Create application state and router
    let state = AppState::new(pool, Arc::new(recognizer));
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("anpr-gate listening on http://{}", addr);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

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
