//! Card resolution: print selection, decklist resolution and fix suggestions

pub mod fuzzy;
pub mod print_selector;
pub mod resolver;

pub use fuzzy::{suggest_fixes, FuzzyIndex, FuzzyMatch, NameMatcher};
pub use print_selector::{search_print, PrintQuery};
pub use resolver::{decklist_to_cards, ResolvedDeck, PLACEHOLDER_IMAGE_URL};
