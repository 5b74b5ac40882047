use std::str::FromStr;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Allow-listed sort keys for the card listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    CardName,
    Rarity,
    Account,
    Timestamp,
}

impl SortColumn {
    pub fn sql(self) -> &'static str {
        match self {
            SortColumn::CardName => "i.card_name",
            SortColumn::Rarity => "i.rarity",
            SortColumn::Account => "i.device_account",
            SortColumn::Timestamp => "i.timestamp",
        }
    }
}

impl FromStr for SortColumn {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "card_name" => Ok(SortColumn::CardName),
            "rarity" => Ok(SortColumn::Rarity),
            "account" => Ok(SortColumn::Account),
            "timestamp" => Ok(SortColumn::Timestamp),
            other => Err(CoreError::invalid(format!(
                "unsupported sort column {other:?} (expected card_name, rarity, account or timestamp)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(CoreError::invalid(format!(
                "unsupported sort order {other:?} (expected asc or desc)"
            ))),
        }
    }
}

/// One key of a compound collection ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirective {
    NameAsc,
    NameDesc,
    /// Rarest first according to `RARITY_ORDER`.
    RarityRank,
    /// Group size, largest first. Only meaningful when grouping.
    CountDesc,
}

impl FromStr for SortDirective {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name_asc" | "name" => Ok(SortDirective::NameAsc),
            "name_desc" => Ok(SortDirective::NameDesc),
            "rarity" | "rarity_rank" | "rarity_order" => Ok(SortDirective::RarityRank),
            "count_desc" | "count" => Ok(SortDirective::CountDesc),
            other => Err(CoreError::invalid(format!("unsupported sort directive {other:?}"))),
        }
    }
}

/// Parse `sort=name_asc,rarity` into directives, keeping caller order and
/// dropping repeats.
pub fn parse_directives(raw: Option<&str>) -> CoreResult<Vec<SortDirective>> {
    let mut out = Vec::new();
    for part in raw.unwrap_or_default().split(',').filter(|p| !p.trim().is_empty()) {
        let d: SortDirective = part.parse()?;
        if !out.contains(&d) {
            out.push(d);
        }
    }
    Ok(out)
}
