use climate_api::config::Config;
use climate_api::db::Repository;
use climate_api::routes;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,climate_api=debug,sqlx=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Climate API Service starting...");

    // Load configuration
    let config = Config::load("config/config.yaml").map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {}\n\n\
             Make sure:\n\
             1. config/config.yaml exists\n\
             2. All required environment variables are set (check .env.example)\n\
             3. Create a .env file if needed",
            e
        )
    })?;
    info!("Configuration loaded");

    // Open the observation dataset read-only
    let connection_string = config.database.connection_string();
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open dataset: {}\n\n\
                 Path: {}\n\n\
                 Common fixes:\n\
                 1. Check the SQLite file exists at that path (DATABASE_PATH)\n\
                 2. Check the file is readable by this process\n\
                 3. The dataset is opened read-only and is never created here",
                e,
                config.database.path
            )
        })?;

    info!("Opened dataset: {}", config.database.path);

    let repository = Arc::new(Repository::new(pool));

    // Startup probe: fail fast on a mis-shaped dataset and log freshness
    match repository.latest_observation_date().await? {
        Some(date) => info!("Dataset ready, latest observation dated {}", date),
        None => warn!("Dataset contains no observations; windowed routes will return empty results"),
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("Listening on {}", addr);

    let app = routes::router(repository);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Climate API Service shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
