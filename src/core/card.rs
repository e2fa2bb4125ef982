//! Card records: parsed decklist entries, database prints, resolved cards

use crate::core::StableId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One physical copy requested by a decklist line
///
/// `set` and `collector_number` are stored lower-cased so they can be
/// compared case-insensitively against the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foil: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etched: Option<bool>,
}

impl RawCard {
    /// A single copy with no print hints
    pub fn named(name: impl Into<String>) -> Self {
        RawCard {
            name: name.into(),
            quantity: 1,
            set: None,
            collector_number: None,
            foil: None,
            etched: None,
        }
    }

    /// Copy of this card under a different name (used when applying a fix)
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        RawCard {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn is_foil(&self) -> bool {
        self.foil.unwrap_or(false)
    }

    pub fn is_etched(&self) -> bool {
        self.etched.unwrap_or(false)
    }
}

/// Front and (for multi-faced layouts) back image URLs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintImages {
    #[serde(default)]
    pub front: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

impl PrintImages {
    pub fn front(url: impl Into<String>) -> Self {
        PrintImages {
            front: url.into(),
            back: None,
        }
    }

    pub fn has_back(&self) -> bool {
        self.back.as_deref().is_some_and(|b| !b.is_empty())
    }
}

/// Reference from a print to a token, meld part, emblem, etc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedCard {
    pub id: String,
    pub name: String,
    pub component: String,
    pub uri: String,
    /// Copied from the referenced entry when the database was built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<PrintImages>,
}

/// One physical printing of a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Print {
    pub id: String,
    pub set: String,
    pub collector_number: String,
    #[serde(default)]
    pub foil: bool,
    #[serde(default)]
    pub etched: bool,
    #[serde(default)]
    pub images: PrintImages,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated_cards: Vec<AssociatedCard>,
}

/// Every known print of one card name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatesealCard {
    pub name: String,
    pub prints: Vec<Print>,
}

/// Card database payload, keyed by exact card name
pub type CardData = FxHashMap<String, FatesealCard>;

/// Render-ready card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCard {
    pub id: StableId,
    pub name: String,
    pub images: PrintImages,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foil: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etched: Option<bool>,
}

/// A decklist name that did not match the database
///
/// One record per distinct name; `card.quantity` counts the missing copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardError {
    pub card: RawCard,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl CardError {
    pub fn not_found(card: &RawCard) -> Self {
        CardError {
            error: format!("Card not found: {}", card.name),
            card: RawCard {
                quantity: 1,
                ..card.clone()
            },
            fix: None,
        }
    }
}
