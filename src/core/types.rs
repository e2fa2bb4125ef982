//! Strongly-typed wrappers for card identity
//!
//! Resolved cards are rendered as lists, and list identity must survive
//! reordering, so every resolved card carries a `StableId` derived from its
//! normalized name and how many times that name has already appeared.

use deunicode::deunicode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic identifier for a resolved or derived card
///
/// Examples: "card-lightning-bolt-0", "extra-treasure-2", "custom-commander"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableId(String);

impl StableId {
    /// Build `<prefix>-<normalized name>-<occurrence>`
    pub fn derive(prefix: &str, name: &str, occurrence: usize) -> Self {
        StableId(format!("{prefix}-{}-{occurrence}", normalize_name(name)))
    }

    pub fn new(s: impl Into<String>) -> Self {
        StableId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StableId {
    fn from(s: &str) -> Self {
        StableId(s.to_string())
    }
}

/// Normalize a card name for use inside identifiers
///
/// "Lim-Dûl's Vault" -> "lim-dul-s-vault"
/// "Fire // Ice" -> "fire-ice"
pub fn normalize_name(name: &str) -> String {
    let ascii = deunicode(name).to_lowercase();
    let mut normalized = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_dash = false;
            normalized.push(c);
        } else {
            pending_dash = true;
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Lightning Bolt"), "lightning-bolt");
        assert_eq!(normalize_name("Adeline, Resplendent Cathar"), "adeline-resplendent-cathar");
        assert_eq!(normalize_name("Fire // Ice"), "fire-ice");
        assert_eq!(normalize_name("Lim-Dûl's Vault"), "lim-dul-s-vault");
        assert_eq!(normalize_name("  Æther Vial "), "aether-vial");
    }

    #[test]
    fn test_derive_stable_id() {
        let id = StableId::derive("card", "Sol Ring", 2);
        assert_eq!(id.as_str(), "card-sol-ring-2");
        assert_eq!(id.to_string(), "card-sol-ring-2");
    }
}
