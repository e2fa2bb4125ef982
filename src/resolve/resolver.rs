//! Decklist resolution against the card database
//!
//! Unknown names are never fatal: they are collected as `CardError`s and
//! the rest of the list is still resolved.

use crate::core::{
    normalize_name, AssociatedCard, BasicCard, CardError, PrintImages, RawCard, StableId,
};
use crate::loader::CardDatabase;
use crate::resolve::print_selector::{search_print, PrintQuery};
use rustc_hash::FxHashMap;

/// Image shown for associated cards the database has no image for
pub const PLACEHOLDER_IMAGE_URL: &str = "https://i.imgur.com/Hg8CwwU.jpeg";

/// Result of one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDeck {
    pub resulting_cards: Vec<BasicCard>,
    pub extra_cards: Vec<BasicCard>,
    pub error_cards: Vec<CardError>,
}

/// Per-name occurrence counters for stable ids
#[derive(Debug)]
struct IdAllocator {
    prefix: &'static str,
    seen: FxHashMap<String, usize>,
}

impl IdAllocator {
    fn new(prefix: &'static str) -> Self {
        IdAllocator {
            prefix,
            seen: FxHashMap::default(),
        }
    }

    fn next(&mut self, name: &str) -> StableId {
        let counter = self.seen.entry(normalize_name(name)).or_insert(0);
        let id = StableId::derive(self.prefix, name, *counter);
        *counter += 1;
        id
    }
}

/// Resolve every record, in order, into cards, extras and errors
pub fn decklist_to_cards(decklist: &[RawCard], db: &CardDatabase) -> ResolvedDeck {
    let mut resolved = ResolvedDeck::default();
    let mut card_ids = IdAllocator::new("card");
    let mut extra_ids = IdAllocator::new("extra");

    for raw in decklist {
        let Some(card) = db.get_card(&raw.name) else {
            record_miss(&mut resolved.error_cards, raw);
            continue;
        };
        let Some(print) = search_print(&card.prints, &PrintQuery::from_raw(raw)) else {
            record_miss(&mut resolved.error_cards, raw);
            continue;
        };

        resolved.resulting_cards.push(BasicCard {
            id: card_ids.next(&card.name),
            name: card.name.clone(),
            images: print.images.clone(),
            foil: Some(print.foil),
            etched: Some(print.etched),
        });

        for associated in &print.associated_cards {
            resolved
                .extra_cards
                .push(associated_to_basic(associated, extra_ids.next(&associated.name)));
        }
    }

    resolved
}

/// Accumulate one more missing copy onto the error for this name
fn record_miss(errors: &mut Vec<CardError>, raw: &RawCard) {
    match errors.iter_mut().find(|e| e.card.name == raw.name) {
        Some(existing) => existing.card.quantity += 1,
        None => errors.push(CardError::not_found(raw)),
    }
}

fn associated_to_basic(associated: &AssociatedCard, id: StableId) -> BasicCard {
    let images = associated
        .images
        .clone()
        .filter(|images| !images.front.is_empty())
        .unwrap_or_else(|| PrintImages::front(PLACEHOLDER_IMAGE_URL));

    BasicCard {
        id,
        name: associated.name.clone(),
        images,
        foil: None,
        etched: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FatesealCard, Print};
    use crate::loader::decklist::parse_deck_list;

    fn print(id: &str, set: &str, number: &str) -> Print {
        Print {
            id: id.to_string(),
            set: set.to_string(),
            collector_number: number.to_string(),
            foil: false,
            etched: false,
            images: PrintImages::front(format!("https://img/{id}.jpg")),
            associated_cards: vec![],
        }
    }

    fn test_db() -> CardDatabase {
        let mut db = CardDatabase::new();
        db.insert(FatesealCard {
            name: "Mountain".to_string(),
            prints: vec![print("mtn-lea", "lea", "295"), print("mtn-tsp", "tsp", "295")],
        });

        let mut goblin = print("krenko", "m13", "139");
        goblin.associated_cards = vec![
            AssociatedCard {
                id: "gob".to_string(),
                name: "Goblin".to_string(),
                component: "token".to_string(),
                uri: "https://api/gob".to_string(),
                images: Some(PrintImages::front("https://img/goblin.jpg")),
            },
            AssociatedCard {
                id: "emb".to_string(),
                name: "Krenko Emblem".to_string(),
                component: "token".to_string(),
                uri: "https://api/emb".to_string(),
                images: None,
            },
        ];
        db.insert(FatesealCard {
            name: "Krenko, Mob Boss".to_string(),
            prints: vec![goblin],
        });

        let mut delver = print("delver", "isd", "51");
        delver.images.back = Some("https://img/delver-back.jpg".to_string());
        db.insert(FatesealCard {
            name: "Delver of Secrets".to_string(),
            prints: vec![delver],
        });
        db
    }

    #[test]
    fn test_resolves_with_print_hints() {
        let deck = parse_deck_list(&["2 Mountain (TSP) 295", "1 Mountain"]).unwrap();
        let resolved = decklist_to_cards(&deck, &test_db());

        assert!(resolved.error_cards.is_empty());
        assert_eq!(resolved.resulting_cards.len(), 3);
        assert_eq!(resolved.resulting_cards[0].images.front, "https://img/mtn-tsp.jpg");
        assert_eq!(resolved.resulting_cards[2].images.front, "https://img/mtn-lea.jpg");
        assert_eq!(resolved.resulting_cards[0].foil, Some(false));
    }

    #[test]
    fn test_stable_ids_count_occurrences() {
        let deck = parse_deck_list(&["2 Mountain", "1 Delver of Secrets", "1 Mountain"]).unwrap();
        let resolved = decklist_to_cards(&deck, &test_db());
        let ids: Vec<&str> = resolved
            .resulting_cards
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "card-mountain-0",
                "card-mountain-1",
                "card-delver-of-secrets-0",
                "card-mountain-2"
            ]
        );

        // Recomputing yields the same ids
        assert_eq!(decklist_to_cards(&deck, &test_db()), resolved);
    }

    #[test]
    fn test_associated_cards_become_extras() {
        let deck = parse_deck_list(&["2 Krenko, Mob Boss"]).unwrap();
        let resolved = decklist_to_cards(&deck, &test_db());

        assert_eq!(resolved.resulting_cards.len(), 2);
        assert_eq!(resolved.extra_cards.len(), 4);
        assert_eq!(resolved.extra_cards[0].id.as_str(), "extra-goblin-0");
        assert_eq!(resolved.extra_cards[0].images.front, "https://img/goblin.jpg");
        assert_eq!(resolved.extra_cards[1].images.front, PLACEHOLDER_IMAGE_URL);
        assert_eq!(resolved.extra_cards[2].id.as_str(), "extra-goblin-1");
    }

    #[test]
    fn test_unknown_names_accumulate() {
        let deck =
            parse_deck_list(&["3 Lightnig Bolt", "1 Mountain", "1 Lightnig Bolt (M10)", "1 Foo"])
                .unwrap();
        let resolved = decklist_to_cards(&deck, &test_db());

        assert_eq!(resolved.resulting_cards.len(), 1);
        assert_eq!(resolved.error_cards.len(), 2);
        assert_eq!(resolved.error_cards[0].card.name, "Lightnig Bolt");
        assert_eq!(resolved.error_cards[0].card.quantity, 4);
        assert_eq!(resolved.error_cards[1].card.name, "Foo");
        assert_eq!(resolved.error_cards[1].card.quantity, 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let deck = parse_deck_list(&["1 mountain"]).unwrap();
        let resolved = decklist_to_cards(&deck, &test_db());
        assert!(resolved.resulting_cards.is_empty());
        assert_eq!(resolved.error_cards.len(), 1);
    }

    #[test]
    fn test_back_face_is_kept() {
        let deck = parse_deck_list(&["1 Delver of Secrets"]).unwrap();
        let resolved = decklist_to_cards(&deck, &test_db());
        assert!(resolved.resulting_cards[0].images.has_back());
    }
}
