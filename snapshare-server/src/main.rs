use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapshare_server::{app, config::Settings, db::Database, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapshare_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new().context("Failed to load settings")?;
    if settings.uses_development_secret() {
        tracing::warn!("APP_SECRET is not set; signing tokens with the development secret");
    }
    if settings.upload.cloud_name.is_empty() || settings.upload.upload_preset.is_empty() {
        tracing::warn!("Image host is not configured; /upload-image will fail");
    }

    // Initialize database
    let db = Database::new(&settings.database.path).context("Failed to create database")?;
    db.initialize()
        .context("Failed to initialize database schema")?;
    tracing::info!("Database initialized at {}", settings.database.path);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Failed to parse server address")?;

    let state = AppState::new(db, settings);
    let app = app(state)?;

    tracing::info!("Starting server on {} (GraphQL at /graphql)", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
