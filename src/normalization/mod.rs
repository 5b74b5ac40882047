pub mod card_key;
pub mod rarity;

pub use card_key::{normalize, normalize_label, CardKey};
