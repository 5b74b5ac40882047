// HTTP API server binary for the card catalog

use anyhow::Result;
use pocket_dex::api::ApiServer;
use pocket_dex::config::AppConfig;
use pocket_dex::tracing::{init_tracing, LogFormat, DEFAULT_FILTER};
use pocket_dex::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER, LogFormat::from_env(LogFormat::Full))?;

    tracing::info!("Initializing card API server");

    let config = AppConfig::from_env()?;
    let catalog = config.build_catalog().await?;

    tracing::info!("Database connected successfully");

    ApiServer::from_config(&config).run(catalog).await?;

    Ok(())
}
