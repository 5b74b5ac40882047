// API server implementation using actix-web

use std::time::Instant;

use crate::api::handlers::StartedAt;
use crate::api::{middleware, routes};
use crate::config::AppConfig;
use crate::database_ops::CardCatalog;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl ApiServer {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            allowed_origins: config.allowed_origins.clone(),
        }
    }

    /// Start the HTTP server; returns when it shuts down.
    pub async fn run(self, catalog: CardCatalog) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            reference_entries = catalog.index().len(),
            "Starting card API server"
        );

        let catalog = web::Data::new(catalog);
        let started = web::Data::new(StartedAt(Instant::now()));
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(catalog.clone())
                .app_data(started.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
