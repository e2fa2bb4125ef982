//! Core card types

pub mod card;
pub mod types;

pub use card::{
    AssociatedCard, BasicCard, CardData, CardError, FatesealCard, Print, PrintImages, RawCard,
};
pub use types::{normalize_name, StableId};
