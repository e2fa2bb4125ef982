//! Print selection for a decklist entry
//!
//! Narrowing is all-or-nothing: either a print satisfies every hint, or
//! the first print of the card is used. A print that matches the set but
//! not the collector number is never returned.

use crate::core::{Print, RawCard};

/// Hints carried by a decklist entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintQuery<'a> {
    pub set: Option<&'a str>,
    pub collector_number: Option<&'a str>,
    pub foil: bool,
    pub etched: bool,
}

impl<'a> PrintQuery<'a> {
    pub fn from_raw(card: &'a RawCard) -> Self {
        PrintQuery {
            set: card.set.as_deref(),
            collector_number: card.collector_number.as_deref(),
            foil: card.is_foil(),
            etched: card.is_etched(),
        }
    }
}

/// Pick one print for the given hints
///
/// Returns `None` only when `prints` is empty.
pub fn search_print<'p>(prints: &'p [Print], query: &PrintQuery<'_>) -> Option<&'p Print> {
    let fallback = prints.first()?;
    let mut candidates: Vec<&Print> = prints.iter().collect();

    if let Some(set) = query.set {
        candidates.retain(|p| p.set.eq_ignore_ascii_case(set));
    }
    if !candidates.is_empty() {
        if let Some(collector_number) = query.collector_number {
            candidates.retain(|p| eq_ignore_case(&p.collector_number, collector_number));
        }
    }
    if !candidates.is_empty() && query.foil {
        candidates.retain(|p| p.foil);
    }
    if !candidates.is_empty() && query.etched {
        candidates.retain(|p| p.etched);
    }

    Some(candidates.first().copied().unwrap_or(fallback))
}

/// Case-insensitive comparison that also covers non-ASCII glyphs ("1492★", "ⅰ")
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
