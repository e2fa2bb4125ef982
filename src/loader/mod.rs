//! Decklist and card database loaders
//!
//! Parsers for MTGO-style decklist text, the canonical text writer, and the
//! card database with its stale-while-revalidate cache

pub mod cache;
pub mod canonical;
pub mod database;
pub mod decklist;
pub mod source;

pub use cache::{CacheStatus, DatabaseCache, LoadedDatabase};
pub use canonical::raw_deck_to_deck_list_string;
pub use database::CardDatabase;
pub use decklist::{parse_deck_list, parse_line, DeckListLoader};
pub use source::{CardDataSource, CardStore, DiskStore, DownloadProgress, FileSource};
