use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

const CREATE_IDENTIFICATIONS: &str = "CREATE TABLE IF NOT EXISTS identifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_name TEXT NOT NULL,
        rarity TEXT,
        device_account TEXT,
        timestamp TEXT DEFAULT CURRENT_TIMESTAMP
    )";

const CREATE_ACCOUNT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_identifications_account ON identifications (device_account)";

/// Create the identifications table when it is missing. Writers live
/// elsewhere; this only lets a fresh store (or a test) be queried.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_IDENTIFICATIONS)
        .execute(pool)
        .await
        .context("creating identifications table")?;
    sqlx::query(CREATE_ACCOUNT_INDEX)
        .execute(pool)
        .await
        .context("creating account index")?;
    info!("identifications schema ready");
    Ok(())
}
