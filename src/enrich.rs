//! Display decoration for rows read from storage. Pure; no I/O.

use serde::Serialize;

use crate::catalog::ReferenceIndex;
use crate::database_ops::rows::{GroupedRow, IdentificationRow};

/// Shown when an identification has no (or a blank) account.
pub const NOT_APPLICABLE: &str = "N/A";

/// One identification event as the frontend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: i64,
    pub card_name: String,
    pub rarity: Option<String>,
    pub device_account: String,
    pub timestamp: Option<String>,
    pub set_name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// One normalized (name, rarity) group with its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedCardView {
    pub card_name: String,
    pub rarity: Option<String>,
    pub count: i64,
    pub last_seen: Option<String>,
    pub set_name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardImage {
    pub card_name: String,
    pub rarity: String,
    pub image_url: Option<String>,
}

/// Trimmed account, or [`NOT_APPLICABLE`] when missing or blank.
pub fn display_account(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(acc) if !acc.is_empty() => acc.to_string(),
        _ => NOT_APPLICABLE.to_string(),
    }
}

/// Decorates rows using the reference index and the image URL prefix.
#[derive(Debug, Clone, Copy)]
pub struct Enricher<'a> {
    index: &'a ReferenceIndex,
    image_base: &'a str,
}

impl<'a> Enricher<'a> {
    pub fn new(index: &'a ReferenceIndex, image_base: &'a str) -> Self {
        Self { index, image_base }
    }

    pub fn image_url(&self, card_name: &str, rarity: Option<&str>) -> Option<String> {
        let meta = self.index.lookup(card_name, rarity?)?;
        if meta.image_filename.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{}",
            self.image_base.trim_end_matches('/'),
            meta.image_filename
        ))
    }

    pub fn card(&self, row: IdentificationRow) -> CardView {
        let meta = row
            .rarity
            .as_deref()
            .and_then(|r| self.index.lookup(&row.card_name, r));
        CardView {
            image_url: self.image_url(&row.card_name, row.rarity.as_deref()),
            device_account: display_account(row.device_account.as_deref()),
            set_name: row.set_name.or_else(|| meta.map(|m| m.set_name.clone())),
            category: row.category.or_else(|| meta.map(|m| m.category.clone())),
            id: row.id,
            card_name: row.card_name,
            rarity: row.rarity,
            timestamp: row.timestamp,
        }
    }

    pub fn grouped(&self, row: GroupedRow) -> GroupedCardView {
        let meta = row
            .rarity
            .as_deref()
            .and_then(|r| self.index.lookup(&row.card_name, r));
        GroupedCardView {
            image_url: self.image_url(&row.card_name, row.rarity.as_deref()),
            set_name: row.set_name.or_else(|| meta.map(|m| m.set_name.clone())),
            category: row.category.or_else(|| meta.map(|m| m.category.clone())),
            card_name: row.card_name,
            rarity: row.rarity,
            count: row.count,
            last_seen: row.last_seen,
        }
    }

    pub fn card_image(&self, card_name: String, rarity: String) -> CardImage {
        CardImage {
            image_url: self.image_url(&card_name, Some(&rarity)),
            card_name,
            rarity,
        }
    }
}
