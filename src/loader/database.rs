//! Card database for looking up prints by card name
//!
//! The database is built offline and shipped as one JSON object keyed by
//! exact card name. Lookups are exact: fuzzy matching lives in
//! `resolve::fuzzy`.

use crate::core::{CardData, FatesealCard};
use crate::{FatesealError, Result};
use std::path::Path;

/// In-memory card database
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: CardData,
}

impl CardDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        CardDatabase {
            cards: CardData::default(),
        }
    }

    /// Wrap an already-decoded payload, rejecting cards without prints
    pub fn from_card_data(cards: CardData) -> Result<Self> {
        if let Some(card) = cards.values().find(|card| card.prints.is_empty()) {
            return Err(FatesealError::ParseError(format!(
                "Card '{}' has no prints",
                card.name
            )));
        }
        Ok(CardDatabase { cards })
    }

    /// Decode a database from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cards: CardData = serde_json::from_str(json)?;
        Self::from_card_data(cards)
    }

    /// Load a database from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Add or replace a single card
    pub fn insert(&mut self, card: FatesealCard) {
        self.cards.insert(card.name.clone(), card);
    }

    /// Look up a card by its exact name
    pub fn get_card(&self, name: &str) -> Option<&FatesealCard> {
        self.cards.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(name)
    }

    /// All card names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cards.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn card_data(&self) -> &CardData {
        &self.cards
    }

    pub fn into_card_data(self) -> CardData {
        self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
