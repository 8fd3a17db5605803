use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use roster_core::Engine;
use roster_server::api::api_router;
use roster_server::config::Config;
use roster_server::sqlite::SqliteDirectory;
use roster_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting reviewer assignment service");

    let config = Config::from_env().context("Failed to load configuration")?;

    let db_path = config.database_path();
    info!("Using directory database: {}", db_path.display());
    let store =
        SqliteDirectory::new(&db_path).context("Failed to initialize SQLite database")?;

    let engine = Engine::new(Arc::new(store));
    let state = Arc::new(AppState { engine });

    let app = api_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
