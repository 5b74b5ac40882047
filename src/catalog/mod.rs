//! Static card reference data: the normalized index and its CSV loader.

pub mod index;
pub mod loader;

pub use index::{BuildStats, CardMeta, KnownPair, ReferenceIndex, ReferenceRecord, NO_SET_PLACEHOLDER};
pub use loader::{load_index_or_empty, load_reference_csv, LoadedRecords};
