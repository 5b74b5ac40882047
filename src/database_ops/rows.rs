use serde::Serialize;
use sqlx::FromRow;

/// Row shape of the listing statements (raw or joined).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct IdentificationRow {
    pub id: i64,
    pub card_name: String,
    pub rarity: Option<String>,
    pub device_account: Option<String>,
    pub timestamp: Option<String>,
    pub set_name: Option<String>,
    pub category: Option<String>,
}

/// Row shape of the grouped collection statement.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GroupedRow {
    pub card_name: String,
    pub rarity: Option<String>,
    pub count: i64,
    pub last_seen: Option<String>,
    pub set_name: Option<String>,
    pub category: Option<String>,
}

/// One `(account, rarity, count)` triple.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AccountRarityRow {
    pub account: String,
    pub rarity: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RarityCount {
    pub rarity: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CardRarityRow {
    pub card_name: String,
    pub rarity: String,
}
