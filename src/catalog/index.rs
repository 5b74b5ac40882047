use std::collections::BTreeSet;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::normalization::{normalize_label, CardKey};

/// Set name used by the dataset for cards that belong to no real expansion.
pub const NO_SET_PLACEHOLDER: &str = "N/A";

/// One raw row of the reference dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceRecord {
    #[serde(default)]
    pub card_name: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub image_filename: String,
    #[serde(default)]
    pub set_name: String,
    #[serde(default)]
    pub category: String,
}

/// Static metadata attached to a known card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardMeta {
    pub image_filename: String,
    pub set_name: String,
    pub category: String,
}

/// Borrowed view of one index entry, shaped like a `known_pairs` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownPair<'a> {
    pub name: &'a str,
    pub rarity: &'a str,
    pub set_name: &'a str,
    pub category: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub accepted: usize,
    /// Rows whose normalized key was already taken; the first occurrence won.
    pub duplicates: usize,
    /// Rows without a card name or rarity.
    pub skipped: usize,
}

/// Normalized lookup over the reference dataset.
///
/// Built once at startup and shared read-only (`Arc<ReferenceIndex>`) by every
/// request. An empty index is a valid state: lookups return `None` and the
/// side-table build inserts nothing.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: IndexMap<CardKey, CardMeta>,
    stats: BuildStats,
}

impl ReferenceIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from raw rows. If two rows normalize to the same key the first one
    /// encountered wins and later ones are dropped (counted in [`BuildStats`]).
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = ReferenceRecord>,
    {
        let mut entries = IndexMap::new();
        let mut stats = BuildStats::default();

        for row in rows {
            if row.card_name.trim().is_empty() || row.rarity.trim().is_empty() {
                stats.skipped += 1;
                continue;
            }
            match entries.entry(CardKey::new(&row.card_name, &row.rarity)) {
                Entry::Occupied(_) => stats.duplicates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(CardMeta {
                        image_filename: row.image_filename.trim().to_string(),
                        set_name: row.set_name.trim().to_string(),
                        category: normalize_label(&row.category),
                    });
                    stats.accepted += 1;
                }
            }
        }

        Self { entries, stats }
    }

    pub fn lookup(&self, name: &str, rarity: &str) -> Option<&CardMeta> {
        self.entries.get(&CardKey::new(name, rarity))
    }

    /// Every key with its pass-through columns, in dataset order.
    pub fn all_keys(&self) -> impl Iterator<Item = KnownPair<'_>> {
        self.entries.iter().map(|(key, meta)| KnownPair {
            name: key.name(),
            rarity: key.rarity(),
            set_name: &meta.set_name,
            category: &meta.category,
        })
    }

    /// Distinct set names, excluding [`NO_SET_PLACEHOLDER`] and blanks.
    pub fn all_set_names(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .map(|meta| meta.set_name.as_str())
            .filter(|set| !set.is_empty() && *set != NO_SET_PLACEHOLDER)
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}
