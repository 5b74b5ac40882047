use std::cmp::Ordering;

use super::card_key::normalize;

/// Display order of rarities, rarest first. Position is the rank.
pub const RARITY_ORDER: [&str; 10] = [
    "Crown",
    "Three Star",
    "Two Star",
    "One Star",
    "Two Shiny",
    "One Shiny",
    "Four Diamond",
    "Three Diamond",
    "Two Diamond",
    "One Diamond",
];

/// Rank given to rarities missing from [`RARITY_ORDER`]; sorts after every ranked one.
pub const UNRANKED: i64 = RARITY_ORDER.len() as i64;

/// Rank of a rarity label under the same normalization as the reconciliation join.
pub fn rank(rarity: &str) -> Option<usize> {
    let key = normalize(rarity);
    RARITY_ORDER.iter().position(|r| normalize(r) == key)
}

/// Canonical display label: the ranked spelling when known, otherwise the trimmed input.
pub fn canonical_label(rarity: &str) -> String {
    match rank(rarity) {
        Some(pos) => RARITY_ORDER[pos].to_string(),
        None => rarity.trim().to_string(),
    }
}

/// Ranked rarities first (rarest first), unranked ones after in lexical order.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// `(normalized rarity, rank)` rows for the SQL rank table.
pub fn rank_rows() -> impl Iterator<Item = (String, i64)> {
    RARITY_ORDER
        .iter()
        .enumerate()
        .map(|(pos, label)| (normalize(label), pos as i64))
}
