//! Equipment checks server
//!
//! REST API in front of the equipment inspections table.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_checks_server::{
    api,
    config::AppConfig,
    repository::open_store,
    services::{identity::IdentityService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "equipment_checks_server={},tower_http=debug",
            config.logging.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Equipment Checks Server v{}", env!("CARGO_PKG_VERSION"));

    let opened = open_store(&config).await.context("Failed to open inspections store")?;
    tracing::info!(
        backend = opened.repository.backend(),
        "Inspections table {}.{}.{}",
        config.store.catalog,
        config.store.schema,
        config.store.table
    );

    let identity = IdentityService::discover(opened.warehouse_api.as_deref()).await;

    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    let services = Services::new(opened.repository, config.inspections.clone(), identity);
    let state = AppState::new(config, services);

    let app = api::router(state);

    let addr = SocketAddr::new(
        server_host.parse().context("Invalid host address")?,
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
