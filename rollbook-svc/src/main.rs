//! rollbook-svc - Voter Record Entry & Approval Service
//!
//! HTTP service on port 5810 (default). Bulk spreadsheet ingestion,
//! single-record entry, and the approval workflow, with progress
//! streamed over SSE.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rollbook_common::config::ServiceConfig;
use rollbook_common::events::EventBus;

use rollbook_svc::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting rollbook-svc");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::load();
    config.ensure_data_dir()?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());

    let db_pool = rollbook_svc::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(100);

    let state = AppState::new(db_pool, event_bus);
    let app = rollbook_svc::build_router(state);

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
