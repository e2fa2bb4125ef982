//! Canonical decklist text
//!
//! Renders parsed records back to one line per distinct
//! (name, set, collector number, foil, etched) group, in first-seen order.

use crate::core::RawCard;
use rustc_hash::FxHashMap;
use std::fmt::Write as FmtWrite;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey<'a> {
    name: &'a str,
    set: Option<&'a str>,
    collector_number: Option<&'a str>,
    foil: bool,
    etched: bool,
}

impl<'a> GroupKey<'a> {
    fn of(card: &'a RawCard) -> Self {
        GroupKey {
            name: &card.name,
            set: card.set.as_deref().filter(|s| !s.is_empty()),
            collector_number: card.collector_number.as_deref().filter(|s| !s.is_empty()),
            foil: card.is_foil(),
            etched: card.is_etched(),
        }
    }
}

/// Render records as canonical decklist text, one group per line
pub fn raw_deck_to_deck_list_string(deck: &[RawCard]) -> String {
    let mut order: Vec<GroupKey<'_>> = Vec::new();
    let mut counts: FxHashMap<GroupKey<'_>, usize> = FxHashMap::default();

    for card in deck {
        let key = GroupKey::of(card);
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let lines: Vec<String> = order
        .iter()
        .map(|key| render_line(key, counts.get(key).copied().unwrap_or(0)))
        .collect();
    lines.join("\n")
}

fn render_line(key: &GroupKey<'_>, count: usize) -> String {
    let mut line = format!("{count} {}", key.name);
    if let Some(set) = key.set {
        let _ = write!(line, " ({})", set.to_uppercase());
    }
    // Uppercasing is lossy for a few glyphs (`ß` becomes `SS`), so such
    // collector numbers do not survive a re-parse unchanged.
    if let Some(collector_number) = key.collector_number {
        let _ = write!(line, " {}", collector_number.to_uppercase());
    }
    if key.foil {
        line.push_str(" *F*");
    }
    if key.etched {
        line.push_str(" *E*");
    }
    line
}
