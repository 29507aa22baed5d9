//! Create the inspections schema and table in the configured store.
//!
//! Run once per environment before the server takes traffic.

use anyhow::Context;

use equipment_checks_server::{config::AppConfig, repository::open_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    let opened = open_store(&config).await.context("Failed to open inspections store")?;
    opened
        .repository
        .inspections_provision()
        .await
        .context("Failed to provision inspections table")?;

    Ok(())
}
