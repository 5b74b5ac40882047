//! Shared fixture: an in-memory store seeded with five identification rows.

use std::sync::Arc;

use super::cards::CardCatalog;
use super::db::Db;
use super::schema::ensure_schema;
use crate::catalog::{ReferenceIndex, ReferenceRecord};
use crate::query::PageBounds;

fn record(name: &str, rarity: &str, image: &str, set: &str, category: &str) -> ReferenceRecord {
    ReferenceRecord {
        card_name: name.into(),
        rarity: rarity.into(),
        image_filename: image.into(),
        set_name: set.into(),
        category: category.into(),
    }
}

pub fn reference() -> ReferenceIndex {
    ReferenceIndex::build(vec![
        record("Pikachu-ex", "One Star", "A1_pikachu.webp", "Genetic Apex", "Pokemon"),
        record("Professor's Research", "Two Diamond", "P_research.webp", "Genetic Apex", "Trainer"),
        record("Mewtwo ex", "Four Diamond", "A1_mewtwo.webp", "Mythical Island", "Pokemon"),
        record("Promo Pikachu", "Crown", "promo.webp", "N/A", "Pokemon"),
    ])
}

/// Five events, three of which reconcile against [`reference`].
pub async fn catalog(index: ReferenceIndex) -> CardCatalog {
    let index = Arc::new(index);
    let db = Db::in_memory(Arc::clone(&index)).await.unwrap();
    ensure_schema(&db.pool).await.unwrap();
    let rows: [(&str, Option<&str>, Option<&str>, &str); 5] = [
        ("Pikachu_EX", Some("One Star"), Some("alice"), "2024-01-01 10:00:00"),
        ("pikachu-ex", Some(" one star "), Some("bob"), "2024-01-02 10:00:00"),
        ("Professor's Research", Some("Two Diamond"), Some("alice"), "2024-01-03 10:00:00"),
        ("Missingno", Some("Crown"), None, "2024-01-04 10:00:00"),
        ("Mewtwo ex", None, Some("  "), "2024-01-05 10:00:00"),
    ];
    for (name, rarity, account, ts) in rows {
        sqlx::query(
            "INSERT INTO identifications (card_name, rarity, device_account, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(rarity)
        .bind(account)
        .bind(ts)
        .execute(&db.pool)
        .await
        .unwrap();
    }
    CardCatalog::new(db, index, PageBounds::default(), "/card-images")
}
