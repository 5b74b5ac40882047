//! Reconciliation join between free-text identification rows and the
//! reference index.
//!
//! The index key set is copied into a per-connection TEMP table
//! (`known_pairs`) so SQLite can do the join. The normalization predicate is
//! rendered here and nowhere else; it must stay equivalent to
//! [`crate::normalization::normalize`].

use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::catalog::{KnownPair, ReferenceIndex};
use crate::normalization::rarity;

/// Rows per multi-VALUES insert; 4 binds each keeps us well under SQLite's variable cap.
const INSERT_CHUNK: usize = 500;

const CREATE_KNOWN_PAIRS: &str = "CREATE TEMP TABLE IF NOT EXISTS known_pairs (
        name TEXT NOT NULL,
        rarity TEXT NOT NULL,
        set_name TEXT,
        category TEXT,
        PRIMARY KEY (name, rarity)
    ) WITHOUT ROWID";

const CREATE_RARITY_RANKS: &str = "CREATE TEMP TABLE IF NOT EXISTS rarity_ranks (
        rarity TEXT PRIMARY KEY,
        rank INTEGER NOT NULL
    ) WITHOUT ROWID";

/// SQL equivalent of `normalize(expr)`.
///
/// `expr` must be a trusted column expression, never user input. `TRIM`
/// strips the same characters as `TRIM_CHARS`; `LOWER` folds ASCII only,
/// matching `to_ascii_lowercase`.
pub fn normalized_sql(expr: &str) -> String {
    format!("LOWER(REPLACE(TRIM({expr}, char(32, 9, 10, 13)), '_', '-'))")
}

/// `INNER JOIN` restricting `identifications i` to known cards; exposes `kp.set_name`/`kp.category`.
pub fn known_pairs_join() -> String {
    format!(
        " INNER JOIN known_pairs kp ON kp.name = {} AND kp.rarity = {}",
        normalized_sql("i.card_name"),
        normalized_sql("i.rarity")
    )
}

/// `LEFT JOIN` exposing `rr.rank`; at most one match per row, so counts are unchanged.
pub fn rarity_rank_join() -> String {
    format!(
        " LEFT JOIN rarity_ranks rr ON rr.rarity = {}",
        normalized_sql("i.rarity")
    )
}

/// Rows inserted by one [`materialize`] call. Zero on every call after the first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Materialized {
    pub known_pairs: u64,
    pub rarity_ranks: u64,
}

/// Create and fill the side tables on `conn` if they are absent or empty.
///
/// Safe to call repeatedly. Inserts use `INSERT OR IGNORE` against the
/// primary key, so a racing builder on the same store cannot fail the call.
pub async fn materialize(
    conn: &mut SqliteConnection,
    index: &ReferenceIndex,
) -> Result<Materialized, sqlx::Error> {
    sqlx::query(CREATE_KNOWN_PAIRS).execute(&mut *conn).await?;
    sqlx::query(CREATE_RARITY_RANKS).execute(&mut *conn).await?;

    let mut out = Materialized::default();

    let pairs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM temp.known_pairs")
        .fetch_one(&mut *conn)
        .await?;
    if pairs == 0 && !index.is_empty() {
        let keys: Vec<KnownPair<'_>> = index.all_keys().collect();
        let mut tx = conn.begin().await?;
        for chunk in keys.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
                "INSERT OR IGNORE INTO temp.known_pairs (name, rarity, set_name, category) ",
            );
            qb.push_values(chunk, |mut b, k| {
                b.push_bind(k.name)
                    .push_bind(k.rarity)
                    .push_bind(k.set_name)
                    .push_bind(k.category);
            });
            out.known_pairs += qb.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
    }

    let ranks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM temp.rarity_ranks")
        .fetch_one(&mut *conn)
        .await?;
    if ranks == 0 {
        let rows: Vec<(String, i64)> = rarity::rank_rows().collect();
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("INSERT OR IGNORE INTO temp.rarity_ranks (rarity, rank) ");
        qb.push_values(&rows, |mut b, (label, rank)| {
            b.push_bind(label.as_str()).push_bind(*rank);
        });
        out.rarity_ranks = qb.build().execute(&mut *conn).await?.rows_affected();
    }

    debug!(
        known_pairs = out.known_pairs,
        rarity_ranks = out.rarity_ranks,
        "side tables materialized"
    );
    Ok(out)
}
