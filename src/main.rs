use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thread_archiver::admission::AdmissionGate;
use thread_archiver::archiver::Archiver;
use thread_archiver::config::Config;
use thread_archiver::db::Database;
use thread_archiver::reddit::{ContentFetcher, RedditClient};
use thread_archiver::web::{self, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting thread-archiver");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        database = %config.database_path.display(),
        api_base = %config.reddit_api_base,
        max_comment_depth = config.max_comment_depth,
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    let reddit = RedditClient::connect(&config)
        .await
        .context("Failed to authenticate with the Reddit API")?;
    let fetcher: Arc<dyn ContentFetcher> = Arc::new(reddit);

    let archiver = Arc::new(Archiver::new(
        db.clone(),
        Arc::clone(&fetcher),
        config.max_comment_depth,
    ));
    let gate = Arc::new(AdmissionGate::from_config(&config));
    let shutdown = CancellationToken::new();

    let sweeper_gate = Arc::clone(&gate);
    let sweeper_interval = config.admission_sweep_interval;
    let sweeper_shutdown = shutdown.clone();
    let sweeper_handle = tokio::spawn(async move {
        sweeper_gate
            .run_sweeper(sweeper_interval, sweeper_shutdown)
            .await;
    });

    let state = AppState {
        db,
        archiver,
        gate,
        fetcher,
        config: Arc::new(config),
    };
    let web_shutdown = shutdown.clone();
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(state, web_shutdown).await {
            error!("Web server error: {e:#}");
        }
    });

    shutdown_signal().await;

    info!("Shutting down...");

    shutdown.cancel();
    if let Err(e) = web_handle.await {
        error!("Web server task failed: {e}");
    }
    if let Err(e) = sweeper_handle.await {
        error!("Admission sweeper task failed: {e}");
    }

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,thread_archiver=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
