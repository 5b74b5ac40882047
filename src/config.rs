//! Runtime configuration read from the environment (and `.env`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::{load_index_or_empty, ReferenceIndex};
use crate::database_ops::{CardCatalog, Db};
use crate::query::PageBounds;
use crate::util::env as envutil;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/pokemon_cards.db";
pub const DEFAULT_CARD_DATA_PATH: &str = "data/pokemon_tcg_pocket_cards.csv";
pub const DEFAULT_IMAGE_BASE: &str = "/card-images";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub card_data_path: PathBuf,
    pub image_base: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub bounds: PageBounds,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        envutil::init_env();
        let defaults = PageBounds::default();
        let max_limit: u32 = envutil::env_parse_req("MAX_PAGE_LIMIT", defaults.max_limit)?;
        let default_limit: u32 =
            envutil::env_parse_req("DEFAULT_PAGE_LIMIT", defaults.default_limit)?;
        if max_limit == 0 {
            anyhow::bail!("MAX_PAGE_LIMIT must be at least 1");
        }

        Ok(Self {
            database_url: envutil::env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: envutil::env_parse("DB_MAX_CONNS", 8u32).max(1),
            card_data_path: PathBuf::from(envutil::env_or("CARD_DATA_PATH", DEFAULT_CARD_DATA_PATH)),
            image_base: envutil::env_or("CARD_IMAGE_BASE", DEFAULT_IMAGE_BASE),
            host: envutil::env_or("API_HOST", "0.0.0.0"),
            port: envutil::env_parse_req("API_PORT", 8000u16).context("API_PORT")?,
            allowed_origins: envutil::env_list("ALLOWED_ORIGINS", "http://localhost:3000"),
            bounds: PageBounds {
                default_limit: default_limit.clamp(1, max_limit),
                max_limit,
            },
        })
    }

    /// Load the reference data, open the store and wire the catalog service.
    /// A missing or unreadable reference file leaves the index empty.
    pub async fn build_catalog(&self) -> Result<CardCatalog> {
        let index: Arc<ReferenceIndex> = Arc::new(load_index_or_empty(&self.card_data_path));
        let db = Db::connect(&self.database_url, self.max_connections, Arc::clone(&index)).await?;
        crate::database_ops::ensure_schema(&db.pool).await?;
        Ok(CardCatalog::new(db, index, self.bounds, self.image_base.clone()))
    }
}
