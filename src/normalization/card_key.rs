/// Characters stripped from both ends of a name before comparison.
///
/// The SQL rendering in `reconcile` trims exactly this set, so the two sides
/// of the join agree byte for byte.
pub const TRIM_CHARS: [char; 4] = [' ', '\t', '\n', '\r'];

/// Canonical form of a card name or rarity label.
///
/// Normalization steps:
/// - trim surrounding whitespace (see [`TRIM_CHARS`])
/// - ASCII lowercase (SQLite's `LOWER` folds ASCII only)
/// - replace `_` with `-`
pub fn normalize(raw: &str) -> String {
    raw.trim_matches(&TRIM_CHARS[..])
        .to_ascii_lowercase()
        .replace('_', "-")
}

/// Trim + lowercase, no separator rewriting. Used for categories.
pub fn normalize_label(raw: &str) -> String {
    raw.trim_matches(&TRIM_CHARS[..]).to_ascii_lowercase()
}

/// Normalized (name, rarity) pair identifying one reference card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardKey {
    name: String,
    rarity: String,
}

impl CardKey {
    pub fn new(name: &str, rarity: &str) -> Self {
        Self {
            name: normalize(name),
            rarity: normalize(rarity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rarity(&self) -> &str {
        &self.rarity
    }
}
