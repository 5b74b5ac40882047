//! `CardCatalog`: the read operations behind the HTTP and CLI surfaces.
//!
//! Each call validates its parameters first, then acquires one pooled
//! connection and runs the count and data statements on it. A failing step
//! fails the whole call with the phase it was in.

use std::sync::Arc;

use serde::Serialize;
use sqlx::pool::PoolConnection;
use sqlx::Sqlite;
use tracing::{debug, instrument};

use super::db::Db;
use super::rows::{AccountRarityRow, CardRarityRow, GroupedRow, IdentificationRow, RarityCount};
use crate::catalog::ReferenceIndex;
use crate::enrich::{CardImage, CardView, Enricher, GroupedCardView};
use crate::error::{CoreError, CoreResult, QueryPhase};
use crate::normalization::rarity::{self, canonical_label, RARITY_ORDER};
use crate::pivot::{Coverage, PivotRows, PivotSort, PivotTable, Triple};
use crate::query::builder::{account_universe, cards_for_account, rarity_breakdown, stats_statements};
use crate::query::{
    AccountPivotParams, AccountRarityQuery, CardListParams, CardListing, CollectionListing,
    CollectionParams, PageBounds,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardPage {
    pub total_records: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    pub cards: Vec<CardView>,
}

/// Account × rarity matrix, paginated over accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRarityPage {
    pub total_records: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    pub categories: Vec<String>,
    pub data: PivotRows,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CollectionEntry {
    Event(CardView),
    Grouped(GroupedCardView),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total_records: i64,
    pub known_records: i64,
    pub unknown_records: i64,
    pub accounts: i64,
    pub reference_entries: usize,
}

#[derive(Clone)]
pub struct CardCatalog {
    db: Db,
    index: Arc<ReferenceIndex>,
    bounds: PageBounds,
    image_base: String,
}

impl CardCatalog {
    pub fn new(
        db: Db,
        index: Arc<ReferenceIndex>,
        bounds: PageBounds,
        image_base: impl Into<String>,
    ) -> Self {
        Self {
            db,
            index,
            bounds,
            image_base: image_base.into(),
        }
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    fn enricher(&self) -> Enricher<'_> {
        Enricher::new(&self.index, &self.image_base)
    }

    async fn conn(&self) -> CoreResult<PoolConnection<Sqlite>> {
        self.db
            .pool
            .acquire()
            .await
            .map_err(CoreError::query(QueryPhase::Connect))
    }

    /// Round-trip to storage; used by the health check.
    pub async fn ping(&self) -> CoreResult<()> {
        let mut conn = self.conn().await?;
        sqlx::query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Data))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_cards(&self, params: &CardListParams) -> CoreResult<CardPage> {
        let listing = CardListing::parse(params, self.bounds)?;
        let built = listing.build();

        let mut conn = self.conn().await?;
        let total: i64 = built
            .count
            .query_scalar()
            .fetch_one(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Count))?;
        let rows: Vec<IdentificationRow> = built
            .data
            .query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Data))?;
        debug!(total, returned = rows.len(), "card listing");

        let enricher = self.enricher();
        Ok(CardPage {
            total_records: total,
            page: listing.page.page(),
            limit: listing.page.limit(),
            total_pages: listing.page.total_pages(total),
            cards: rows.into_iter().map(|r| enricher.card(r)).collect(),
        })
    }

    /// Raw rarity distribution; null rarities excluded, most common first.
    #[instrument(skip(self))]
    pub async fn rarity_counts(&self) -> CoreResult<Vec<RarityCount>> {
        let built = rarity_breakdown();
        let mut conn = self.conn().await?;
        built
            .data
            .query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Data))
    }

    /// Pivot of `(account, rarity, count)` over every account in the store.
    ///
    /// Columns are the ranked rarities followed by any other rarity seen.
    /// Spelling variants of one rarity collapse into its canonical label.
    #[instrument(skip(self))]
    pub async fn rarity_by_account(
        &self,
        params: &AccountPivotParams,
    ) -> CoreResult<AccountRarityPage> {
        let query = AccountRarityQuery::parse(params, self.bounds)?;

        let mut conn = self.conn().await?;
        let accounts: Vec<String> = account_universe()
            .query_scalar()
            .fetch_all(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Count))?;
        let rows: Vec<AccountRarityRow> = query
            .triples()
            .query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Data))?;
        drop(conn);

        let triples: Vec<Triple> = rows
            .into_iter()
            .map(|r| Triple::new(r.account, canonical_label(&r.rarity), r.count))
            .collect();
        // ranked columns first, then unranked ones in lexical order
        let mut categories: Vec<String> = RARITY_ORDER.iter().map(|r| r.to_string()).collect();
        categories.extend(triples.iter().map(|t| t.category.clone()));
        categories.sort_by(|a, b| rarity::compare(a, b));
        categories.dedup();

        let mut table = PivotTable::build(triples, &categories, &accounts, Coverage::Superset);
        table.sort(&PivotSort {
            key: query.sort_key.clone(),
            order: query.sort_order,
        })?;

        let total = table.entity_count() as i64;
        let (categories, data) = table.paginate(&query.page).into_parts();
        Ok(AccountRarityPage {
            total_records: total,
            page: query.page.page(),
            limit: query.page.limit(),
            total_pages: query.page.total_pages(total),
            categories,
            data,
        })
    }

    /// Distinct known cards one account holds at one rarity.
    #[instrument(skip(self))]
    pub async fn cards_by_account_and_rarity(
        &self,
        account: &str,
        rarity: &str,
    ) -> CoreResult<Vec<CardImage>> {
        let stmt = cards_for_account(account, rarity)?;
        let mut conn = self.conn().await?;
        let rows: Vec<CardRarityRow> = stmt
            .query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Data))?;
        let enricher = self.enricher();
        Ok(rows
            .into_iter()
            .map(|r| enricher.card_image(r.card_name, r.rarity))
            .collect())
    }

    /// Set names from the reference data, sorted, placeholder excluded.
    pub fn expansions(&self) -> Vec<String> {
        self.index.all_set_names().into_iter().collect()
    }

    /// One page of raw events, or of normalized (name, rarity) groups.
    #[instrument(skip(self))]
    pub async fn my_collection(&self, params: &CollectionParams) -> CoreResult<Vec<CollectionEntry>> {
        let listing = CollectionListing::parse(params, self.bounds)?;
        let built = listing.build();
        let enricher = self.enricher();

        let mut conn = self.conn().await?;
        if listing.group {
            let rows: Vec<GroupedRow> = built
                .data
                .query_as()
                .fetch_all(&mut *conn)
                .await
                .map_err(CoreError::query(QueryPhase::Data))?;
            Ok(rows
                .into_iter()
                .map(|r| CollectionEntry::Grouped(enricher.grouped(r)))
                .collect())
        } else {
            let rows: Vec<IdentificationRow> = built
                .data
                .query_as()
                .fetch_all(&mut *conn)
                .await
                .map_err(CoreError::query(QueryPhase::Data))?;
            Ok(rows
                .into_iter()
                .map(|r| CollectionEntry::Event(enricher.card(r)))
                .collect())
        }
    }

    #[instrument(skip(self))]
    pub async fn collection_stats(&self) -> CoreResult<CollectionStats> {
        let stmts = stats_statements();
        let mut conn = self.conn().await?;
        let total: i64 = stmts
            .total
            .query_scalar()
            .fetch_one(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Count))?;
        let known: i64 = stmts
            .known
            .query_scalar()
            .fetch_one(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Count))?;
        let accounts: i64 = stmts
            .accounts
            .query_scalar()
            .fetch_one(&mut *conn)
            .await
            .map_err(CoreError::query(QueryPhase::Count))?;
        Ok(CollectionStats {
            total_records: total,
            known_records: known,
            unknown_records: total - known,
            accounts,
            reference_entries: self.index.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::testing::{catalog, reference};
    use crate::error::ErrorKind;

    fn page_of(limit: i64) -> CardListParams {
        CardListParams {
            page: Some(1),
            limit: Some(limit),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn listing_counts_only_reconciled_rows() {
        let catalog = catalog(reference()).await;
        let page = catalog.list_cards(&page_of(10)).await.unwrap();
        assert_eq!(page.total_records, 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.cards.len(), 3);
        // newest first
        assert_eq!(page.cards[0].card_name, "Professor's Research");
        assert!(page.cards.iter().all(|c| c.image_url.is_some()));
        assert_eq!(page.cards[0].category.as_deref(), Some("trainer"));
    }

    #[tokio::test]
    async fn listing_pages_and_raw_mode() {
        let catalog = catalog(reference()).await;
        let page = catalog.list_cards(&page_of(2)).await.unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.cards.len(), 2);

        let raw = catalog
            .list_cards(&CardListParams {
                known_only: Some(false),
                sort_by: Some("card_name".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(raw.total_records, 5);
        let names: Vec<&str> = raw.cards.iter().map(|c| c.card_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Mewtwo ex", "Missingno", "Pikachu_EX", "Professor's Research", "pikachu-ex"]
        );
        let blank = raw.cards.iter().find(|c| c.card_name == "Mewtwo ex").unwrap();
        assert_eq!(blank.device_account, "N/A");
        assert!(blank.image_url.is_none());
    }

    #[tokio::test]
    async fn listing_filters() {
        let catalog = catalog(reference()).await;
        let search = catalog
            .list_cards(&CardListParams {
                search: Some("pika".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.total_records, 2);

        let trainers = catalog
            .list_cards(&CardListParams {
                known_only: Some(false),
                trainer_only: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(trainers.total_records, 1);

        let by_set = catalog
            .list_cards(&CardListParams {
                expansion: Some("Mythical Island".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_set.total_records, 0);

        let by_rarity = catalog
            .list_cards(&CardListParams {
                rarity: Some("one_star,Crown".into()),
                known_only: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        // one_star normalizes to one-star, so only Crown matches
        assert_eq!(by_rarity.total_records, 1);
    }

    #[tokio::test]
    async fn bad_sort_column_is_rejected() {
        let catalog = catalog(reference()).await;
        let err = catalog
            .list_cards(&CardListParams {
                sort_by: Some("deck".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn rarity_counts_skip_nulls() {
        let catalog = catalog(reference()).await;
        let counts = catalog.rarity_counts().await.unwrap();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.iter().map(|c| c.count).sum::<i64>(), 4);
        // raw spellings stay separate here
        assert!(counts.iter().any(|c| c.rarity == " one star "));
        assert!(counts.iter().any(|c| c.rarity == "One Star"));
    }

    #[tokio::test]
    async fn account_pivot_is_dense_and_collapses_rarity_spellings() {
        let catalog = catalog(reference()).await;
        let page = catalog
            .rarity_by_account(&AccountPivotParams::default())
            .await
            .unwrap();
        assert_eq!(page.total_records, 3);
        assert_eq!(page.categories.len(), RARITY_ORDER.len());
        let accounts: Vec<&str> = page.data.keys().map(String::as_str).collect();
        assert_eq!(accounts, vec!["N/A", "alice", "bob"]);
        assert_eq!(page.data["bob"]["One Star"], 1);
        assert_eq!(page.data["alice"]["Two Diamond"], 1);
        assert_eq!(page.data["N/A"]["Crown"], 0);
        assert!(page.data.values().all(|row| row.len() == RARITY_ORDER.len()));
    }

    #[tokio::test]
    async fn account_pivot_sorts_before_paginating() {
        let catalog = catalog(reference()).await;
        let page = catalog
            .rarity_by_account(&AccountPivotParams {
                sort_by: Some("one star".into()),
                sort_order: Some("desc".into()),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        let accounts: Vec<&str> = page.data.keys().map(String::as_str).collect();
        assert_eq!(accounts, vec!["alice", "bob"]);
        assert_eq!(page.total_pages, 2);

        let err = catalog
            .rarity_by_account(&AccountPivotParams {
                sort_by: Some("deck".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn malformed_pivot_sort_key_rejected_before_storage() {
        let catalog = catalog(reference()).await;
        sqlx::query("DROP TABLE identifications")
            .execute(&catalog.db.pool)
            .await
            .unwrap();
        let err = catalog
            .rarity_by_account(&AccountPivotParams {
                sort_by: Some("rank(*)".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    async fn with_promo_for_alice() -> CardCatalog {
        let catalog = catalog(reference()).await;
        sqlx::query(
            "INSERT INTO identifications (card_name, rarity, device_account, timestamp) VALUES ('Pikachu_EX', 'Promo', 'alice', '2024-02-01 10:00:00')",
        )
        .execute(&catalog.db.pool)
        .await
        .unwrap();
        catalog
    }

    #[tokio::test]
    async fn unranked_column_sorts_case_insensitively() {
        let catalog = with_promo_for_alice().await;
        let page = catalog
            .rarity_by_account(&AccountPivotParams {
                sort_by: Some("promo".into()),
                sort_order: Some("desc".into()),
                known_only: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        let first = page.data.keys().next().map(String::as_str);
        assert_eq!(first, Some("alice"));
        assert_eq!(page.data["alice"]["Promo"], 1);
        assert_eq!(page.data["bob"]["Promo"], 0);
    }

    #[tokio::test]
    async fn unranked_columns_follow_ranked_ones() {
        let catalog = with_promo_for_alice().await;
        let page = catalog
            .rarity_by_account(&AccountPivotParams {
                known_only: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut expected: Vec<&str> = RARITY_ORDER.to_vec();
        expected.push("Promo");
        assert_eq!(page.categories, expected);
    }

    #[tokio::test]
    async fn cards_for_one_account_and_rarity() {
        let catalog = catalog(reference()).await;
        let cards = catalog
            .cards_by_account_and_rarity("alice", "one star")
            .await
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].card_name, "Pikachu_EX");
        assert_eq!(
            cards[0].image_url.as_deref(),
            Some("/card-images/A1_pikachu.webp")
        );
        assert!(catalog
            .cards_by_account_and_rarity("carol", "One Star")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn grouped_collection_counts_normalized_pairs() {
        let catalog = catalog(reference()).await;
        let entries = catalog
            .my_collection(&CollectionParams {
                group: Some(true),
                sort: Some("count_desc".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 4);
        match &entries[0] {
            CollectionEntry::Grouped(g) => {
                assert_eq!(g.count, 2);
                assert_eq!(g.set_name.as_deref(), Some("Genetic Apex"));
                assert_eq!(g.last_seen.as_deref(), Some("2024-01-02 10:00:00"));
            }
            other => panic!("expected grouped row, got {other:?}"),
        }

        let raw = catalog
            .my_collection(&CollectionParams::default())
            .await
            .unwrap();
        assert_eq!(raw.len(), 5);
        assert!(matches!(&raw[0], CollectionEntry::Event(c) if c.card_name == "Mewtwo ex"));
    }

    #[tokio::test]
    async fn stats_use_raw_totals() {
        let catalog = catalog(reference()).await;
        let stats = catalog.collection_stats().await.unwrap();
        assert_eq!(
            stats,
            CollectionStats {
                total_records: 5,
                known_records: 3,
                unknown_records: 2,
                accounts: 3,
                reference_entries: 4,
            }
        );
    }

    #[tokio::test]
    async fn empty_reference_still_serves_raw_paths() {
        let catalog = catalog(ReferenceIndex::empty()).await;
        assert!(catalog.expansions().is_empty());
        let known = catalog.list_cards(&page_of(10)).await.unwrap();
        assert_eq!(known.total_records, 0);
        assert_eq!(known.total_pages, 0);
        let raw = catalog
            .list_cards(&CardListParams {
                known_only: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(raw.total_records, 5);
        assert_eq!(catalog.rarity_counts().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn expansions_skip_placeholder() {
        let catalog = catalog(reference()).await;
        assert_eq!(catalog.expansions(), vec!["Genetic Apex", "Mythical Island"]);
    }

    #[tokio::test]
    async fn storage_failure_reports_phase() {
        let catalog = catalog(reference()).await;
        sqlx::query("DROP TABLE identifications")
            .execute(&catalog.db.pool)
            .await
            .unwrap();
        let err = catalog.list_cards(&page_of(10)).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::QueryExecutionFailed {
                phase: QueryPhase::Count,
                ..
            }
        ));
    }
}
