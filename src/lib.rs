//! Fateseal - decklists to Tabletop Simulator saved objects
//!
//! Parses MTGO-style decklist text, resolves every line against a card
//! database (with print selection and fuzzy suggestions for misspellings),
//! and writes the result as a Tabletop Simulator save file.

pub mod core;
pub mod error;
pub mod export;
pub mod image;
pub mod loader;
pub mod logger;
pub mod resolve;
pub mod session;

pub use error::{FatesealError, Result};
