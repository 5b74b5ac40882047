//! Parameterized SQL for every read path.
//!
//! User input reaches SQL only as bound parameters. Column names, sort keys
//! and join clauses come from closed enums and crate-owned fragments.

pub mod builder;
pub mod filter;
pub mod page;
pub mod sort;
pub mod statement;

pub use builder::{
    AccountPivotParams, AccountRarityQuery, CardListParams, CardListing, CollectionListing,
    CollectionParams,
};
pub use filter::{CardFilter, Column, Predicate};
pub use page::{Page, PageBounds};
pub use sort::{SortColumn, SortDirective, SortOrder};
pub use statement::{BuiltQuery, Param, Statement};
