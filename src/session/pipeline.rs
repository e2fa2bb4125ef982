//! Parse, fix and print-selection workflows
//!
//! Each workflow reads the current `DeckState` plus a database snapshot and
//! produces the `DeckAction` to dispatch. None of them mutate state.

use crate::core::{BasicCard, CardError, Print, PrintImages, RawCard, StableId};
use crate::export::{deck_to_objects, SaveFile};
use crate::image::check_image;
use crate::loader::{raw_deck_to_deck_list_string, CardDatabase, DeckListLoader, LoadedDatabase};
use crate::logger::Logger;
use crate::resolve::{decklist_to_cards, suggest_fixes};
use crate::session::state::{DeckAction, DeckState, ParseResult};
use crate::{FatesealError, Result};
use rustc_hash::FxHashMap;

/// Text shorter than this (after trimming) is not worth parsing
pub const MIN_PARSE_LENGTH: usize = 3;

pub const CUSTOM_COMMANDER_ID: &str = "custom-commander";
pub const CUSTOM_COMMANDER_NAME: &str = "Custom Commander";

/// Which user-supplied image a load check refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomImage {
    Back,
    Commander,
}

/// Parse and resolve the editor text
///
/// Short or blank text yields an empty result rather than an error.
pub fn parse_deck(
    deck_list: &str,
    custom_commander_url: &str,
    loaded: &LoadedDatabase,
    min_length: usize,
) -> Result<ParseResult> {
    if deck_list.trim().len() < min_length {
        return Ok(ParseResult::default());
    }

    let raw_deck = DeckListLoader::parse(deck_list)?;
    if raw_deck.is_empty() {
        return Ok(ParseResult::default());
    }

    Ok(resolve_pass(raw_deck, custom_commander_url, loaded))
}

/// Resolve, prepend the custom commander, and attach suggestions
fn resolve_pass(
    raw_deck: Vec<RawCard>,
    custom_commander_url: &str,
    loaded: &LoadedDatabase,
) -> ParseResult {
    let resolved = decklist_to_cards(&raw_deck, &loaded.db);

    let mut cards = resolved.resulting_cards;
    if let Some(commander) = custom_commander(custom_commander_url) {
        cards.insert(0, commander);
    }

    let mut error_cards = resolved.error_cards;
    suggest_fixes(&mut error_cards, &loaded.index);

    ParseResult {
        raw_deck,
        cards,
        extras: resolved.extra_cards,
        error_cards,
        updated_deck_list: None,
    }
}

fn custom_commander(url: &str) -> Option<BasicCard> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    Some(BasicCard {
        id: StableId::new(CUSTOM_COMMANDER_ID),
        name: CUSTOM_COMMANDER_NAME.to_string(),
        images: PrintImages::front(url),
        foil: None,
        etched: None,
    })
}

pub fn is_custom_commander(card: &BasicCard) -> bool {
    card.id.as_str() == CUSTOM_COMMANDER_ID
}

/// Apply one suggestion to every copy of the misspelled name
///
/// Returns `None` when the error has no suggestion.
pub fn fix_error(
    state: &DeckState,
    error: &CardError,
    loaded: &LoadedDatabase,
) -> Result<Option<DeckAction>> {
    let Some(fix) = error.fix.as_deref() else {
        return Ok(None);
    };

    let mut renames = FxHashMap::default();
    renames.insert(error.card.name.to_lowercase(), fix);
    let raw_deck = rename_all(&DeckListLoader::parse(&state.deck_list)?, &renames);

    let new_deck_list = raw_deck_to_deck_list_string(&raw_deck);
    let mut result = resolve_pass(raw_deck, &state.custom_commander_url, loaded);
    result.updated_deck_list = Some(new_deck_list);
    Ok(Some(DeckAction::ParseComplete(result)))
}

/// Apply every available suggestion at once
///
/// Returns `None` when no error has a suggestion.
pub fn fix_all_errors(state: &DeckState, loaded: &LoadedDatabase) -> Result<Option<DeckAction>> {
    let renames: FxHashMap<String, &str> = state
        .error_cards
        .iter()
        .filter_map(|e| Some((e.card.name.to_lowercase(), e.fix.as_deref()?)))
        .collect();
    if renames.is_empty() {
        return Ok(None);
    }

    let raw_deck = rename_all(&DeckListLoader::parse(&state.deck_list)?, &renames);
    let new_deck_list = raw_deck_to_deck_list_string(&raw_deck);
    let result = resolve_pass(raw_deck, &state.custom_commander_url, loaded);

    Ok(Some(DeckAction::FixAllErrors {
        new_deck_list,
        raw_deck: result.raw_deck,
        cards: result.cards,
        extras: result.extras,
        error_cards: result.error_cards,
    }))
}

/// Keys of `renames` are lower-cased misspellings
fn rename_all(raw_deck: &[RawCard], renames: &FxHashMap<String, &str>) -> Vec<RawCard> {
    raw_deck
        .iter()
        .map(|card| match renames.get(&card.name.to_lowercase()) {
            Some(fix) => card.renamed(*fix),
            None => card.clone(),
        })
        .collect()
}

/// Open the print selector for the card at `index`
///
/// The custom commander has no prints and is never selectable.
pub fn open_selector(state: &DeckState, index: usize) -> Option<DeckAction> {
    let card = state.cards.get(index)?;
    if is_custom_commander(card) {
        return None;
    }
    Some(DeckAction::OpenSelector {
        card_name: card.name.clone(),
        index,
    })
}

/// Switch the card at the selector's index to `print`
///
/// Updates both the resolved card and the record behind it, then
/// re-renders the text so the choice survives the next parse.
pub fn select_printing(state: &DeckState, print: &Print) -> Option<DeckAction> {
    let index = state.selector.card_index?;
    let card = state.cards.get(index)?;
    if is_custom_commander(card) {
        return None;
    }
    let raw_index = raw_index_of(state, index)?;

    let mut new_cards = state.cards.clone();
    new_cards[index] = BasicCard {
        images: print.images.clone(),
        foil: Some(print.foil),
        etched: Some(print.etched),
        ..card.clone()
    };

    let mut new_raw_deck = state.raw_deck.clone();
    new_raw_deck[raw_index] = RawCard {
        set: Some(print.set.to_lowercase()),
        collector_number: Some(print.collector_number.to_lowercase()),
        foil: Some(print.foil),
        etched: Some(print.etched),
        ..state.raw_deck[raw_index].clone()
    };

    Some(DeckAction::SelectPrinting {
        print: print.clone(),
        index,
        new_deck_list: raw_deck_to_deck_list_string(&new_raw_deck),
        new_cards,
        new_raw_deck,
    })
}

/// Record index behind the resolved card at `card_index`
///
/// Resolution matches names exactly and every copy of a known name
/// resolves, so the n-th card with a given name comes from the n-th
/// record with that name.
fn raw_index_of(state: &DeckState, card_index: usize) -> Option<usize> {
    let name = &state.cards.get(card_index)?.name;
    let occurrence = state.cards[..card_index]
        .iter()
        .filter(|c| &c.name == name && !is_custom_commander(c))
        .count();

    state
        .raw_deck
        .iter()
        .enumerate()
        .filter(|(_, raw)| &raw.name == name)
        .nth(occurrence)
        .map(|(i, _)| i)
}

/// Prints offered by the selector, in database order
pub fn prints_for<'a>(card_name: &str, db: &'a CardDatabase) -> &'a [Print] {
    db.get_card(card_name)
        .map(|card| card.prints.as_slice())
        .unwrap_or_default()
}

/// Check a downloaded custom image and produce the matching error flag
pub fn report_custom_image(kind: CustomImage, bytes: &[u8], logger: &Logger) -> DeckAction {
    let failed = match check_image(bytes) {
        Ok(info) => {
            logger.verbose(
                "image",
                &format!("{kind:?} image ok: {}x{}", info.width, info.height),
            );
            false
        }
        Err(e) => {
            logger.normal("image", &format!("{kind:?} image rejected: {e}"));
            true
        }
    };

    match kind {
        CustomImage::Back => DeckAction::SetCustomBackError(failed),
        CustomImage::Commander => DeckAction::SetCommanderError(failed),
    }
}

/// Build the save file for the current deck
pub fn export_deck(state: &DeckState) -> Result<SaveFile> {
    if !state.can_export() {
        return Err(FatesealError::EmptyDeck);
    }
    Ok(deck_to_objects(
        &state.cards,
        &state.extras,
        Some(state.custom_back_url.as_str()),
    ))
}
