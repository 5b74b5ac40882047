//! Dense entity × category matrices from grouped counts.
//!
//! Two passes: accumulate the triples, then walk the declared entity and
//! category universes filling gaps with zero. Sorting and pagination operate
//! on whole rows, and pagination always runs on the fully sorted table.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::normalization::normalize;
use crate::query::{Page, SortOrder};

/// One grouped count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub entity: String,
    pub category: String,
    pub count: i64,
}

impl Triple {
    pub fn new(entity: impl Into<String>, category: impl Into<String>, count: i64) -> Self {
        Self {
            entity: entity.into(),
            category: category.into(),
            count,
        }
    }
}

/// Which entities end up as rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Requested entities plus any others seen in the triples.
    Superset,
    /// Exactly the requested entities.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PivotSortKey {
    Entity,
    Category(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotSort {
    pub key: PivotSortKey,
    pub order: SortOrder,
}

pub type PivotRows = IndexMap<String, IndexMap<String, i64>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    categories: Vec<String>,
    rows: PivotRows,
}

impl PivotTable {
    pub fn build<I>(
        triples: I,
        known_categories: &[String],
        all_entities: &[String],
        coverage: Coverage,
    ) -> Self
    where
        I: IntoIterator<Item = Triple>,
    {
        let mut categories: Vec<String> = Vec::with_capacity(known_categories.len());
        for c in known_categories {
            if !categories.contains(c) {
                categories.push(c.clone());
            }
        }

        // pass 1
        let mut counts: HashMap<String, HashMap<String, i64>> = HashMap::new();
        let mut seen_entities: Vec<String> = Vec::new();
        for t in triples {
            if !categories.contains(&t.category) {
                categories.push(t.category.clone());
            }
            let row = counts.entry(t.entity.clone()).or_insert_with(|| {
                seen_entities.push(t.entity.clone());
                HashMap::new()
            });
            *row.entry(t.category).or_insert(0) += t.count;
        }

        // pass 2
        let mut entities: Vec<&String> = Vec::new();
        for e in all_entities {
            if !entities.contains(&e) {
                entities.push(e);
            }
        }
        if coverage == Coverage::Superset {
            for e in &seen_entities {
                if !all_entities.contains(e) {
                    entities.push(e);
                }
            }
        }

        let rows: PivotRows = entities
            .into_iter()
            .map(|entity| {
                let observed = counts.get(entity);
                let cells: IndexMap<String, i64> = categories
                    .iter()
                    .map(|c| {
                        let n = observed.and_then(|m| m.get(c)).copied().unwrap_or(0);
                        (c.clone(), n)
                    })
                    .collect();
                (entity.clone(), cells)
            })
            .collect();

        Self { categories, rows }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn rows(&self) -> &PivotRows {
        &self.rows
    }

    pub fn entity_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, entity: &str, category: &str) -> Option<i64> {
        self.rows.get(entity)?.get(category).copied()
    }

    /// Sort rows in place. Category keys match columns on their normalized
    /// form; equal values fall back to entity name ascending.
    pub fn sort(&mut self, sort: &PivotSort) -> CoreResult<()> {
        match &sort.key {
            PivotSortKey::Entity => {
                self.rows.sort_by(|a, _, b, _| match sort.order {
                    SortOrder::Asc => a.cmp(b),
                    SortOrder::Desc => b.cmp(a),
                });
            }
            PivotSortKey::Category(requested) => {
                let wanted = normalize(requested);
                let Some(category) = self
                    .categories
                    .iter()
                    .find(|c| normalize(c) == wanted)
                    .cloned()
                else {
                    return Err(CoreError::invalid(format!(
                        "cannot sort by unknown column {requested:?}"
                    )));
                };
                self.rows.sort_by(|ka, va, kb, vb| {
                    let x = va.get(&category).copied().unwrap_or(0);
                    let y = vb.get(&category).copied().unwrap_or(0);
                    let by_value = match sort.order {
                        SortOrder::Asc => x.cmp(&y),
                        SortOrder::Desc => y.cmp(&x),
                    };
                    by_value.then_with(|| ka.cmp(kb))
                });
            }
        }
        Ok(())
    }

    /// Keep one page of entities. Call after [`PivotTable::sort`].
    pub fn paginate(self, page: &Page) -> Self {
        let rows: Vec<(String, IndexMap<String, i64>)> = self.rows.into_iter().collect();
        Self {
            categories: self.categories,
            rows: page.slice(rows).into_iter().collect(),
        }
    }

    pub fn into_parts(self) -> (Vec<String>, PivotRows) {
        (self.categories, self.rows)
    }
}
