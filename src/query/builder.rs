//! Count/data statement pairs for each read path.
//!
//! Every builder renders one shared body (FROM, JOINs, WHERE and, when
//! grouping, GROUP BY) and derives both statements from it. Only the data
//! statement gets ORDER BY / LIMIT / OFFSET, so `total_pages` computed from
//! the count always agrees with the rows a page can return.

use serde::Deserialize;

use super::filter::{account_label_sql, render_where, CardFilter, Column, Predicate, Source};
use super::page::{Page, PageBounds};
use super::sort::{parse_directives, SortColumn, SortDirective, SortOrder};
use super::statement::{BuiltQuery, Statement};
use crate::error::{CoreError, CoreResult};
use crate::normalization::normalize;
use crate::normalization::rarity::{self, UNRANKED};
use crate::pivot::PivotSortKey;
use crate::reconcile::normalized_sql;

/// Query string of the card listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub rarity: Option<String>,
    pub expansion: Option<String>,
    pub trainer_only: Option<bool>,
    /// Restrict to cards present in the reference data (default true).
    pub known_only: Option<bool>,
}

/// Query string of the "my collection" view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub group: Option<bool>,
    pub search: Option<String>,
    pub rarity: Option<String>,
    pub expansion: Option<String>,
    pub trainer_only: Option<bool>,
    /// Restrict to known cards (default false; forced by expansion/trainer filters).
    pub known_only: Option<bool>,
    /// Comma-separated directives, e.g. `rarity,name_asc`.
    pub sort: Option<String>,
}

/// Query string of the account × rarity breakdown.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPivotParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// `account` or a rarity label.
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub rarity: Option<String>,
    pub expansion: Option<String>,
    pub trainer_only: Option<bool>,
    pub known_only: Option<bool>,
}

fn body(source: Source, predicates: &[Predicate], group_by: Option<&str>) -> Statement {
    let mut stmt = Statement::default();
    source.render(&mut stmt);
    render_where(predicates, &mut stmt);
    if let Some(group) = group_by {
        stmt.push(" GROUP BY ").push(group);
    }
    stmt
}

fn count_of(body: &Statement, grouped: bool) -> Statement {
    if grouped {
        let mut stmt = Statement::new("SELECT COUNT(*) FROM (SELECT 1");
        stmt.append(body).push(")");
        stmt
    } else {
        let mut stmt = Statement::new("SELECT COUNT(*)");
        stmt.append(body);
        stmt
    }
}

fn push_page(stmt: &mut Statement, page: &Page) {
    stmt.push(" LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(page.offset());
}

fn selected_meta(known_only: bool, grouped: bool) -> &'static str {
    match (known_only, grouped) {
        (true, false) => ", kp.set_name AS set_name, kp.category AS category",
        (true, true) => ", MIN(kp.set_name) AS set_name, MIN(kp.category) AS category",
        (false, _) => ", NULL AS set_name, NULL AS category",
    }
}

/// Paginated card listing with one allow-listed sort column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardListing {
    pub filter: CardFilter,
    pub sort_column: SortColumn,
    pub sort_order: SortOrder,
    pub page: Page,
    pub known_only: bool,
}

impl CardListing {
    /// Validate raw parameters. Fails before any storage access.
    pub fn parse(params: &CardListParams, bounds: PageBounds) -> CoreResult<Self> {
        let sort_column = match params.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => SortColumn::Timestamp,
        };
        let sort_order = match params.sort_order.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None if sort_column == SortColumn::Timestamp => SortOrder::Desc,
            None => SortOrder::Asc,
        };
        let filter = CardFilter::parse(
            params.search.as_deref(),
            params.rarity.as_deref(),
            params.expansion.as_deref(),
            params.trainer_only,
        )?;
        let known_only = params.known_only.unwrap_or(true) || filter.requires_known_pairs();
        Ok(Self {
            filter,
            sort_column,
            sort_order,
            page: Page::new(params.page, params.limit, bounds)?,
            known_only,
        })
    }

    pub fn build(&self) -> BuiltQuery {
        let source = Source {
            known_only: self.known_only,
            rarity_rank: false,
        };
        let body = body(source, &self.filter.predicates(), None);

        let mut data = Statement::new(
            "SELECT i.id AS id, i.card_name AS card_name, i.rarity AS rarity, \
             i.device_account AS device_account, i.timestamp AS timestamp",
        );
        data.push(selected_meta(self.known_only, false)).append(&body);
        let dir = self.sort_order.sql();
        data.push(" ORDER BY ")
            .push(self.sort_column.sql())
            .push(" ")
            .push(dir)
            .push(", i.id ")
            .push(dir);
        push_page(&mut data, &self.page);

        BuiltQuery {
            count: count_of(&body, false),
            data,
        }
    }
}

/// "My collection": raw events or one row per normalized (name, rarity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionListing {
    pub filter: CardFilter,
    pub directives: Vec<SortDirective>,
    pub page: Page,
    pub group: bool,
    pub known_only: bool,
}

impl CollectionListing {
    pub fn parse(params: &CollectionParams, bounds: PageBounds) -> CoreResult<Self> {
        let filter = CardFilter::parse(
            params.search.as_deref(),
            params.rarity.as_deref(),
            params.expansion.as_deref(),
            params.trainer_only,
        )?;
        let known_only = params.known_only.unwrap_or(false) || filter.requires_known_pairs();
        Ok(Self {
            directives: parse_directives(params.sort.as_deref())?,
            page: Page::new(params.page, params.limit, bounds)?,
            group: params.group.unwrap_or(false),
            filter,
            known_only,
        })
    }

    /// Directives that apply in the current mode, defaults filled in.
    pub fn effective_directives(&self) -> Vec<SortDirective> {
        let applicable: Vec<SortDirective> = self
            .directives
            .iter()
            .copied()
            .filter(|d| self.group || *d != SortDirective::CountDesc)
            .collect();
        if applicable.is_empty() && self.group {
            return vec![SortDirective::NameAsc, SortDirective::RarityRank];
        }
        applicable
    }

    pub fn build(&self) -> BuiltQuery {
        let directives = self.effective_directives();
        let source = Source {
            known_only: self.known_only,
            rarity_rank: directives.contains(&SortDirective::RarityRank),
        };
        let name_key = normalized_sql("i.card_name");
        let rarity_key = normalized_sql("i.rarity");
        let group_by = format!("{name_key}, {rarity_key}");
        let body = body(
            source,
            &self.filter.predicates(),
            self.group.then_some(group_by.as_str()),
        );

        let mut data = if self.group {
            let mut s = Statement::new(
                "SELECT MIN(i.card_name) AS card_name, MIN(i.rarity) AS rarity, \
                 COUNT(*) AS count, MAX(i.timestamp) AS last_seen",
            );
            s.push(selected_meta(self.known_only, true));
            s
        } else {
            let mut s = Statement::new(
                "SELECT i.id AS id, i.card_name AS card_name, i.rarity AS rarity, \
                 i.device_account AS device_account, i.timestamp AS timestamp",
            );
            s.push(selected_meta(self.known_only, false));
            s
        };
        data.append(&body).push(" ORDER BY ");

        let rank = format!("COALESCE(rr.rank, {UNRANKED})");
        let mut keys: Vec<String> = directives
            .iter()
            .map(|d| match (d, self.group) {
                (SortDirective::NameAsc, false) => "i.card_name ASC".to_string(),
                (SortDirective::NameDesc, false) => "i.card_name DESC".to_string(),
                (SortDirective::RarityRank, false) => format!("{rank} ASC"),
                (SortDirective::NameAsc, true) => "MIN(i.card_name) ASC".to_string(),
                (SortDirective::NameDesc, true) => "MIN(i.card_name) DESC".to_string(),
                (SortDirective::RarityRank, true) => format!("MIN({rank}) ASC"),
                (SortDirective::CountDesc, _) => "COUNT(*) DESC".to_string(),
            })
            .collect();
        if self.group {
            keys.push(format!("{name_key} ASC"));
            keys.push(format!("{rarity_key} ASC"));
        } else {
            if directives.is_empty() {
                keys.push("i.timestamp DESC".to_string());
            }
            keys.push("i.id DESC".to_string());
        }
        data.push(&keys.join(", "));
        push_page(&mut data, &self.page);

        BuiltQuery {
            count: count_of(&body, self.group),
            data,
        }
    }
}

/// `{rarity, count}` over raw identifications, most common first.
pub fn rarity_breakdown() -> BuiltQuery {
    let predicates = [Predicate::not_null(Column::Rarity)];
    let body = body(Source::default(), &predicates, Some("i.rarity"));
    let mut data = Statement::new("SELECT i.rarity AS rarity, COUNT(*) AS count");
    data.append(&body).push(" ORDER BY COUNT(*) DESC, i.rarity ASC");
    BuiltQuery {
        count: count_of(&body, true),
        data,
    }
}

/// Longest accepted pivot sort key (characters).
pub const MAX_SORT_KEY_LEN: usize = 64;

/// Resolve the pivot `sort_by` value without touching storage.
///
/// `account` (any case) sorts by entity. Anything else must look like a
/// rarity label: letters, digits, spaces, `-`, `_` or `'`, non-empty once
/// normalized. Ranked rarities resolve to their canonical spelling; other
/// labels are matched against the pivot columns after the query runs.
pub fn parse_pivot_sort_key(raw: Option<&str>) -> CoreResult<PivotSortKey> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(PivotSortKey::Entity);
    };
    if raw.eq_ignore_ascii_case("account") {
        return Ok(PivotSortKey::Entity);
    }
    if raw.chars().count() > MAX_SORT_KEY_LEN {
        return Err(CoreError::invalid(format!(
            "sort_by longer than {MAX_SORT_KEY_LEN} characters"
        )));
    }
    let well_formed = raw
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '\''));
    if !well_formed || normalize(raw).trim_matches(['-', ' ']).is_empty() {
        return Err(CoreError::invalid(format!(
            "sort_by {raw:?} is neither \"account\" nor a rarity label"
        )));
    }
    Ok(PivotSortKey::Category(rarity::canonical_label(raw)))
}

/// Grouped `(account, rarity, count)` triples feeding the account pivot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRarityQuery {
    pub filter: CardFilter,
    pub known_only: bool,
    pub page: Page,
    pub sort_key: PivotSortKey,
    pub sort_order: SortOrder,
}

impl AccountRarityQuery {
    /// Validate everything, including the sort key, before any connection is taken.
    pub fn parse(params: &AccountPivotParams, bounds: PageBounds) -> CoreResult<Self> {
        let filter = CardFilter::parse(
            params.search.as_deref(),
            params.rarity.as_deref(),
            params.expansion.as_deref(),
            params.trainer_only,
        )?;
        let sort_key = parse_pivot_sort_key(params.sort_by.as_deref())?;
        let sort_order = match params.sort_order.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None if sort_key == PivotSortKey::Entity => SortOrder::Asc,
            None => SortOrder::Desc,
        };
        let known_only = params.known_only.unwrap_or(true) || filter.requires_known_pairs();
        Ok(Self {
            filter,
            known_only,
            page: Page::new(params.page, params.limit, bounds)?,
            sort_key,
            sort_order,
        })
    }

    /// Triples statement; pagination happens after the pivot, so there is
    /// no count/data pair here.
    pub fn triples(&self) -> Statement {
        let mut predicates = self.filter.predicates();
        predicates.push(Predicate::not_null(Column::Rarity));
        let label = account_label_sql();
        let group_by = format!("{label}, i.rarity");
        let source = Source {
            known_only: self.known_only,
            rarity_rank: false,
        };
        let mut stmt = Statement::new("SELECT ");
        stmt.push(&label)
            .push(" AS account, i.rarity AS rarity, COUNT(*) AS count")
            .append(&body(source, &predicates, Some(&group_by)));
        stmt
    }
}

/// Every account label present in the raw table, unfiltered.
pub fn account_universe() -> Statement {
    let mut stmt = Statement::new("SELECT DISTINCT ");
    stmt.push(&account_label_sql())
        .push(" AS account FROM identifications i ORDER BY 1");
    stmt
}

/// Distinct known cards one account holds at one rarity.
pub fn cards_for_account(account: &str, rarity: &str) -> CoreResult<Statement> {
    if account.trim().is_empty() {
        return Err(CoreError::invalid("account is required"));
    }
    if rarity.trim().is_empty() {
        return Err(CoreError::invalid("rarity is required"));
    }
    let predicates = [
        Predicate::equals(Column::AccountLabel, account),
        Predicate::equals(Column::RarityKey, rarity),
    ];
    let source = Source {
        known_only: true,
        rarity_rank: false,
    };
    let mut stmt = Statement::new("SELECT DISTINCT i.card_name AS card_name, i.rarity AS rarity");
    stmt.append(&body(source, &predicates, None))
        .push(" ORDER BY i.card_name ASC, i.rarity ASC");
    Ok(stmt)
}

/// Raw size counters; only `known` touches the side table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsStatements {
    pub total: Statement,
    pub known: Statement,
    pub accounts: Statement,
}

pub fn stats_statements() -> StatsStatements {
    let raw = body(Source::default(), &[], None);
    let known = body(
        Source {
            known_only: true,
            rarity_rank: false,
        },
        &[],
        None,
    );
    let mut accounts = Statement::new("SELECT COUNT(DISTINCT ");
    accounts.push(&account_label_sql()).push(")").append(&raw);
    StatsStatements {
        total: count_of(&raw, false),
        known: count_of(&known, false),
        accounts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::query::statement::Param;

    fn listing(params: CardListParams) -> CardListing {
        CardListing::parse(&params, PageBounds::default()).unwrap()
    }

    /// The part of a data statement between the SELECT list and ORDER BY.
    fn shared_body(stmt: &Statement) -> &str {
        let sql = stmt.sql();
        let from = sql.find(" FROM identifications").unwrap();
        let end = sql.find(" ORDER BY").unwrap_or(sql.len());
        &sql[from..end]
    }

    #[test]
    fn invalid_sort_column_fails_before_storage() {
        let err = CardListing::parse(
            &CardListParams {
                sort_by: Some("deck".into()),
                ..Default::default()
            },
            PageBounds::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = CardListing::parse(
            &CardListParams {
                sort_by: Some("card_name".into()),
                sort_order: Some("random".into()),
                ..Default::default()
            },
            PageBounds::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn listing_count_and_data_share_body() {
        let q = listing(CardListParams {
            search: Some("pika".into()),
            rarity: Some("One Star,Crown".into()),
            expansion: Some("Genetic Apex".into()),
            page: Some(2),
            limit: Some(25),
            sort_by: Some("rarity".into()),
            ..Default::default()
        })
        .build();

        let body = shared_body(&q.data);
        assert!(q.count.sql().ends_with(body));
        assert!(q.count.sql().starts_with("SELECT COUNT(*) FROM identifications i INNER JOIN known_pairs"));
        assert!(!q.count.sql().contains("ORDER BY"));
        assert!(!q.count.sql().contains("LIMIT"));
        assert!(q.data.sql().ends_with("ORDER BY i.rarity ASC, i.id ASC LIMIT ? OFFSET ?"));

        let n = q.count.params().len();
        assert_eq!(&q.data.params()[..n], q.count.params());
        assert_eq!(&q.data.params()[n..], &[Param::Int(25), Param::Int(25)]);
    }

    #[test]
    fn listing_defaults_to_newest_first_over_known_cards() {
        let q = listing(CardListParams::default()).build();
        assert_eq!(
            q.count.sql(),
            format!(
                "SELECT COUNT(*) FROM identifications i{}",
                crate::reconcile::known_pairs_join()
            )
        );
        assert!(q.data.sql().contains("ORDER BY i.timestamp DESC, i.id DESC"));
        assert!(!q.data.sql().contains("WHERE"));
    }

    #[test]
    fn raw_listing_has_no_join() {
        let q = listing(CardListParams {
            known_only: Some(false),
            ..Default::default()
        })
        .build();
        assert_eq!(q.count.sql(), "SELECT COUNT(*) FROM identifications i");
        assert!(q.data.sql().contains("NULL AS set_name"));
    }

    #[test]
    fn reference_filters_force_join() {
        let q = listing(CardListParams {
            known_only: Some(false),
            trainer_only: Some(true),
            ..Default::default()
        });
        assert!(q.known_only);
    }

    #[test]
    fn grouped_collection_wraps_count_and_orders_by_directives() {
        let params = CollectionParams {
            group: Some(true),
            sort: Some("count_desc,rarity".into()),
            rarity: Some("Crown".into()),
            ..Default::default()
        };
        let q = CollectionListing::parse(&params, PageBounds::default())
            .unwrap()
            .build();
        assert!(q.count.sql().starts_with("SELECT COUNT(*) FROM (SELECT 1 FROM identifications i"));
        assert!(q.count.sql().ends_with(")"));
        assert!(q.count.sql().contains("GROUP BY"));
        assert!(q.count.sql().contains("LEFT JOIN rarity_ranks"));

        let order = q.data.sql().split(" ORDER BY ").nth(1).unwrap();
        assert!(order.starts_with("COUNT(*) DESC, MIN(COALESCE(rr.rank, 10)) ASC"));
        let body = shared_body(&q.data);
        assert!(q.count.sql().contains(body));
    }

    #[test]
    fn grouped_collection_defaults_to_name_then_rarity() {
        let q = CollectionListing::parse(
            &CollectionParams {
                group: Some(true),
                ..Default::default()
            },
            PageBounds::default(),
        )
        .unwrap();
        assert_eq!(
            q.effective_directives(),
            vec![SortDirective::NameAsc, SortDirective::RarityRank]
        );
    }

    #[test]
    fn count_desc_is_ignored_without_grouping() {
        let q = CollectionListing::parse(
            &CollectionParams {
                sort: Some("count_desc".into()),
                ..Default::default()
            },
            PageBounds::default(),
        )
        .unwrap();
        assert!(q.effective_directives().is_empty());
        let built = q.build();
        assert!(built.data.sql().contains("ORDER BY i.timestamp DESC, i.id DESC"));
        assert!(!built.data.sql().contains("COUNT(*)"));
    }

    #[test]
    fn rarity_breakdown_excludes_nulls() {
        let q = rarity_breakdown();
        assert!(q.data.sql().contains("WHERE i.rarity IS NOT NULL GROUP BY i.rarity"));
        assert!(q.data.sql().ends_with("ORDER BY COUNT(*) DESC, i.rarity ASC"));
        assert!(q.data.params().is_empty());
    }

    #[test]
    fn account_cards_binds_both_values() {
        let stmt = cards_for_account("alice", "One_Star").unwrap();
        assert_eq!(
            stmt.params(),
            &[Param::Text("alice".into()), Param::Text("one-star".into())]
        );
        assert!(cards_for_account(" ", "Crown").is_err());
    }

    #[test]
    fn pivot_sort_key_resolves_without_storage() {
        assert_eq!(parse_pivot_sort_key(None).unwrap(), PivotSortKey::Entity);
        assert_eq!(parse_pivot_sort_key(Some(" Account ")).unwrap(), PivotSortKey::Entity);
        assert_eq!(
            parse_pivot_sort_key(Some("three_star")).unwrap(),
            PivotSortKey::Category("three_star".into())
        );
        assert_eq!(
            parse_pivot_sort_key(Some("one star")).unwrap(),
            PivotSortKey::Category("One Star".into())
        );
        assert_eq!(
            parse_pivot_sort_key(Some("promo")).unwrap(),
            PivotSortKey::Category("promo".into())
        );
        let long = "x".repeat(MAX_SORT_KEY_LEN + 1);
        for bad in ["rank(*)", "---", "a;b", long.as_str()] {
            let err = parse_pivot_sort_key(Some(bad)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "input {bad:?}");
        }
    }

    #[test]
    fn pivot_sort_order_defaults_follow_key() {
        let q = AccountRarityQuery::parse(&AccountPivotParams::default(), PageBounds::default()).unwrap();
        assert_eq!(q.sort_order, SortOrder::Asc);
        let q = AccountRarityQuery::parse(
            &AccountPivotParams {
                sort_by: Some("Crown".into()),
                ..Default::default()
            },
            PageBounds::default(),
        )
        .unwrap();
        assert_eq!(q.sort_key, PivotSortKey::Category("Crown".into()));
        assert_eq!(q.sort_order, SortOrder::Desc);
    }

    #[test]
    fn stats_total_never_joins() {
        let s = stats_statements();
        assert_eq!(s.total.sql(), "SELECT COUNT(*) FROM identifications i");
        assert!(s.known.sql().contains("INNER JOIN known_pairs"));
        assert!(!s.accounts.sql().contains("known_pairs"));
    }
}
