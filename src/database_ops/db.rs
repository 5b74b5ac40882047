use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::catalog::ReferenceIndex;
use crate::reconcile;

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    /// Open the store. Every new pooled connection gets its own copy of the
    /// `known_pairs`/`rarity_ranks` TEMP tables before it is handed out.
    #[instrument(skip(index))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        index: Arc<ReferenceIndex>,
    ) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {database_url}"))?
            .create_if_missing(true);

        let pool = pool_options(max_connections.max(1), index)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await
            .context("connecting to sqlite")?;
        info!("connected to db");
        Ok(Self { pool })
    }

    /// Single-connection in-memory store; the connection is never recycled,
    /// so the database lives as long as the pool.
    pub async fn in_memory(index: Arc<ReferenceIndex>) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = pool_options(1, index)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .context("opening in-memory sqlite")?;
        Ok(Self { pool })
    }
}

fn pool_options(max_connections: u32, index: Arc<ReferenceIndex>) -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(move |conn, _meta| {
            let index = Arc::clone(&index);
            Box::pin(async move {
                reconcile::materialize(conn, &index).await?;
                Ok(())
            })
        })
}
