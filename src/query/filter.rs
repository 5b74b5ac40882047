use super::statement::Statement;
use crate::enrich::NOT_APPLICABLE;
use crate::error::{CoreError, CoreResult};
use crate::normalization::{normalize, normalize_label};
use crate::reconcile::{known_pairs_join, normalized_sql, rarity_rank_join};

/// Longest accepted search string (characters).
pub const MAX_SEARCH_LEN: usize = 100;
/// Most values accepted in one comma-separated list filter.
pub const MAX_LIST_VALUES: usize = 64;
/// Category value the reference data uses for trainer cards (normalized).
pub const TRAINER_CATEGORY: &str = "trainer";

/// Columns a predicate can target. Each maps to a fixed SQL expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    CardName,
    /// Normalized rarity, same form as `known_pairs.rarity`.
    RarityKey,
    /// Raw rarity text.
    Rarity,
    /// Trimmed account with blanks folded to the "N/A" sentinel.
    AccountLabel,
    SetName,
    Category,
}

impl Column {
    pub fn sql(self) -> String {
        match self {
            Column::CardName => "i.card_name".to_string(),
            Column::RarityKey => normalized_sql("i.rarity"),
            Column::Rarity => "i.rarity".to_string(),
            Column::AccountLabel => account_label_sql(),
            Column::SetName => "kp.set_name".to_string(),
            Column::Category => "kp.category".to_string(),
        }
    }

    /// Whether the column only exists once `known_pairs` is joined.
    pub fn requires_known_pairs(self) -> bool {
        matches!(self, Column::SetName | Column::Category)
    }

    fn prepare(self, value: &str) -> String {
        match self {
            Column::RarityKey => normalize(value),
            Column::Category => normalize_label(value),
            _ => value.trim().to_string(),
        }
    }
}

/// Account expression shared by filters, grouping and the entity universe.
pub fn account_label_sql() -> String {
    format!("COALESCE(NULLIF(TRIM(i.device_account), ''), '{NOT_APPLICABLE}')")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operator {
    Contains(String),
    AnyOf(Vec<String>),
    Equals(String),
    NotNull,
}

/// One `{column, operator, bound value}` condition.
///
/// Constructors return `None` for inactive filters so an empty list can
/// never reach the renderer as `IN ()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    column: Column,
    op: Operator,
}

impl Predicate {
    pub fn contains(column: Column, needle: &str) -> Option<Self> {
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }
        Some(Self {
            column,
            op: Operator::Contains(needle.to_string()),
        })
    }

    pub fn any_of<S: AsRef<str>>(column: Column, values: &[S]) -> Option<Self> {
        let mut prepared: Vec<String> = Vec::with_capacity(values.len());
        for v in values {
            let v = column.prepare(v.as_ref());
            if !v.is_empty() && !prepared.contains(&v) {
                prepared.push(v);
            }
        }
        if prepared.is_empty() {
            return None;
        }
        Some(Self {
            column,
            op: Operator::AnyOf(prepared),
        })
    }

    pub fn equals(column: Column, value: &str) -> Self {
        Self {
            column,
            op: Operator::Equals(column.prepare(value)),
        }
    }

    pub fn not_null(column: Column) -> Self {
        Self {
            column,
            op: Operator::NotNull,
        }
    }

    pub fn column(&self) -> Column {
        self.column
    }

    fn render(&self, stmt: &mut Statement) {
        let col = self.column.sql();
        match &self.op {
            Operator::Contains(needle) => {
                stmt.push(&col)
                    .push(" LIKE ")
                    .push_bind(format!("%{}%", escape_like(needle)))
                    .push(" ESCAPE '\\'");
            }
            Operator::AnyOf(values) => {
                stmt.push(&col).push(" IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        stmt.push(", ");
                    }
                    stmt.push_bind(v.as_str());
                }
                stmt.push(")");
            }
            Operator::Equals(value) => {
                stmt.push(&col).push(" = ").push_bind(value.as_str());
            }
            Operator::NotNull => {
                stmt.push(&col).push(" IS NOT NULL");
            }
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render predicates as ` WHERE a AND b`; nothing at all when empty.
pub fn render_where(predicates: &[Predicate], stmt: &mut Statement) {
    for (i, p) in predicates.iter().enumerate() {
        stmt.push(if i == 0 { " WHERE " } else { " AND " });
        p.render(stmt);
    }
}

/// FROM clause over `identifications i` with the optional side-table joins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Source {
    pub known_only: bool,
    pub rarity_rank: bool,
}

impl Source {
    pub fn render(&self, stmt: &mut Statement) {
        stmt.push(" FROM identifications i");
        if self.known_only {
            stmt.push(&known_pairs_join());
        }
        if self.rarity_rank {
            stmt.push(&rarity_rank_join());
        }
    }
}

/// Split a comma-separated query value into trimmed, non-empty items.
pub fn parse_list(raw: Option<&str>) -> CoreResult<Vec<String>> {
    let items: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.len() > MAX_LIST_VALUES {
        return Err(CoreError::invalid(format!(
            "too many list values ({} > {MAX_LIST_VALUES})",
            items.len()
        )));
    }
    Ok(items)
}

/// Card-level filters shared by the listing, collection and pivot queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub search: Option<String>,
    pub rarities: Vec<String>,
    pub expansions: Vec<String>,
    pub trainer_only: bool,
}

impl CardFilter {
    pub fn parse(
        search: Option<&str>,
        rarity: Option<&str>,
        expansion: Option<&str>,
        trainer_only: Option<bool>,
    ) -> CoreResult<Self> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        if let Some(s) = search {
            if s.chars().count() > MAX_SEARCH_LEN {
                return Err(CoreError::invalid(format!(
                    "search longer than {MAX_SEARCH_LEN} characters"
                )));
            }
        }
        Ok(Self {
            search: search.map(str::to_string),
            rarities: parse_list(rarity)?,
            expansions: parse_list(expansion)?,
            trainer_only: trainer_only.unwrap_or(false),
        })
    }

    /// Predicates in a fixed order: search, rarity, expansion, trainer.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::new();
        if let Some(p) = self
            .search
            .as_deref()
            .and_then(|s| Predicate::contains(Column::CardName, s))
        {
            out.push(p);
        }
        if let Some(p) = Predicate::any_of(Column::RarityKey, &self.rarities) {
            out.push(p);
        }
        if let Some(p) = Predicate::any_of(Column::SetName, &self.expansions) {
            out.push(p);
        }
        if self.trainer_only {
            out.push(Predicate::equals(Column::Category, TRAINER_CATEGORY));
        }
        out
    }

    pub fn requires_known_pairs(&self) -> bool {
        self.predicates()
            .iter()
            .any(|p| p.column().requires_known_pairs())
    }
}
