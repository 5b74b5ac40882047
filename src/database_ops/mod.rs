pub mod cards;
pub mod db;
pub mod rows;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use cards::{AccountRarityPage, CardCatalog, CardPage, CollectionEntry, CollectionStats};
pub use db::Db;
pub use schema::ensure_schema;
