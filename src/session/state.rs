//! Deck editing state machine
//!
//! `reduce` is a pure transition `(state, action) -> state`. Everything a
//! front end shows (text, resolved cards, errors, print selector) lives in
//! one `DeckState`; nothing is mutated in place.

use crate::core::{BasicCard, CardError, Print, RawCard};

/// Print-selector modal state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorState {
    pub is_open: bool,
    pub card_name: Option<String>,
    pub card_index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckState {
    // Input
    pub deck_name: String,
    pub deck_list: String,
    pub custom_back_url: String,
    pub custom_commander_url: String,

    // Resolution output
    pub raw_deck: Vec<RawCard>,
    pub cards: Vec<BasicCard>,
    pub extras: Vec<BasicCard>,
    pub error_cards: Vec<CardError>,

    // Custom image checks
    pub custom_back_error: bool,
    pub commander_error: bool,

    pub selector: SelectorState,
}

impl DeckState {
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn token_count(&self) -> usize {
        self.extras.len()
    }

    pub fn error_count(&self) -> usize {
        self.error_cards.len()
    }

    pub fn has_fixable_errors(&self) -> bool {
        self.error_cards.iter().any(|e| e.fix.is_some())
    }

    /// Export needs at least one resolved card; outstanding errors don't block it
    pub fn can_export(&self) -> bool {
        !self.cards.is_empty()
    }
}

/// Output of one parse + resolve pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub raw_deck: Vec<RawCard>,
    pub cards: Vec<BasicCard>,
    pub extras: Vec<BasicCard>,
    pub error_cards: Vec<CardError>,
    /// Canonical text to replace the editor contents with (after a fix)
    pub updated_deck_list: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckAction {
    SetDeckName(String),
    SetDeckList(String),
    SetCustomBackUrl(String),
    SetCustomCommanderUrl(String),
    SetCustomBackError(bool),
    SetCommanderError(bool),
    ParseComplete(ParseResult),
    FixError {
        error_card: CardError,
        new_deck_list: String,
    },
    FixAllErrors {
        new_deck_list: String,
        raw_deck: Vec<RawCard>,
        cards: Vec<BasicCard>,
        extras: Vec<BasicCard>,
        error_cards: Vec<CardError>,
    },
    SelectPrinting {
        print: Print,
        index: usize,
        new_cards: Vec<BasicCard>,
        new_raw_deck: Vec<RawCard>,
        new_deck_list: String,
    },
    OpenSelector {
        card_name: String,
        index: usize,
    },
    CloseSelector,
    Reset,
}

pub fn reduce(state: DeckState, action: DeckAction) -> DeckState {
    match action {
        DeckAction::SetDeckName(deck_name) => DeckState { deck_name, ..state },

        DeckAction::SetDeckList(deck_list) => DeckState { deck_list, ..state },

        DeckAction::SetCustomBackUrl(custom_back_url) => DeckState {
            custom_back_url,
            custom_back_error: false,
            ..state
        },

        DeckAction::SetCustomCommanderUrl(custom_commander_url) => DeckState {
            custom_commander_url,
            commander_error: false,
            ..state
        },

        DeckAction::SetCustomBackError(custom_back_error) => DeckState {
            custom_back_error,
            ..state
        },

        DeckAction::SetCommanderError(commander_error) => DeckState {
            commander_error,
            ..state
        },

        DeckAction::ParseComplete(result) => DeckState {
            raw_deck: result.raw_deck,
            cards: result.cards,
            extras: result.extras,
            error_cards: result.error_cards,
            deck_list: result.updated_deck_list.unwrap_or(state.deck_list),
            ..state
        },

        DeckAction::FixError {
            error_card,
            new_deck_list,
        } => {
            let fixed_name = error_card.card.name.to_lowercase();
            let error_cards = state
                .error_cards
                .into_iter()
                .filter(|e| e.card.name.to_lowercase() != fixed_name)
                .collect();
            DeckState {
                error_cards,
                deck_list: new_deck_list,
                ..state
            }
        }

        DeckAction::FixAllErrors {
            new_deck_list,
            raw_deck,
            cards,
            extras,
            error_cards,
        } => DeckState {
            deck_list: new_deck_list,
            raw_deck,
            cards,
            extras,
            error_cards,
            ..state
        },

        DeckAction::SelectPrinting {
            new_cards,
            new_raw_deck,
            new_deck_list,
            ..
        } => DeckState {
            cards: new_cards,
            raw_deck: new_raw_deck,
            deck_list: new_deck_list,
            selector: SelectorState::default(),
            ..state
        },

        DeckAction::OpenSelector { card_name, index } => DeckState {
            selector: SelectorState {
                is_open: true,
                card_name: Some(card_name),
                card_index: Some(index),
            },
            ..state
        },

        DeckAction::CloseSelector => DeckState {
            selector: SelectorState::default(),
            ..state
        },

        DeckAction::Reset => DeckState::default(),
    }
}
