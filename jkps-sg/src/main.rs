//! jkps-sg - Product Sheet Generator service
//!
//! Reconciles an uploaded product database, garment label texts and product
//! images into product sheets with derived color and localized descriptions.
//!
//! **Startup:**
//! 1. Load optional TOML config (`--config` / `JKPS_CONFIG` / OS default)
//! 2. Resolve and create the root folder (`jkps.db`, `images/`)
//! 3. Open the database and restore the persisted locale
//! 4. Serve HTTP until Ctrl+C / SIGTERM, then release uploaded images

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use jkps_common::config::{
    default_config_path, load_toml_config, RootFolderInitializer, RootFolderResolver,
};
use jkps_sg::models::Locale;
use jkps_sg::services::release_all;
use jkps_sg::AppState;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default HTTP port
const DEFAULT_PORT: u16 = 5780;

/// Command-line arguments for jkps-sg
#[derive(Parser, Debug)]
#[command(name = "jkps-sg")]
#[command(about = "Product sheet generator service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "JKPS_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and uploaded images
    /// (falls back to JKPS_ROOT_FOLDER, then the config file)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "JKPS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = load_toml_config(config_path.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jkps-sg (Product Sheet Generator)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!(config = %path.display(), exists = path.exists(), "Configuration file");
    }

    let root_folder = RootFolderResolver::new(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    let db_pool = jkps_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database: {}", db_path.display());

    let locale = resolve_locale(&db_pool, toml_config.default_locale.as_deref()).await;
    info!(locale = %locale, "Output locale");

    let state = AppState::new(db_pool, initializer.images_path(), locale);
    let app = jkps_sg::build_router(state.clone());

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Uploaded images do not outlive the service
    let mut images = state.pipeline.write().await.take_images();
    release_all(&mut images).await;

    info!("Server shutdown complete");
    Ok(())
}

/// Persisted `language` setting, then the config default, then English
async fn resolve_locale(db: &sqlx::SqlitePool, configured: Option<&str>) -> Locale {
    match jkps_sg::db::settings::get_locale(db).await {
        Ok(Some(locale)) => return locale,
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring stored locale"),
    }

    match configured.map(str::parse::<Locale>) {
        Some(Ok(locale)) => locale,
        Some(Err(e)) => {
            warn!(error = %e, "Ignoring configured default_locale");
            Locale::default()
        }
        None => Locale::default(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
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
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
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
