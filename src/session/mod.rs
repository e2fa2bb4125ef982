//! Editing session: deck state, workflows and debounced parsing

pub mod auto_parse;
pub mod pipeline;
pub mod state;

pub use auto_parse::{
    AutoParser, DatabaseProvider, Debouncer, DeckStore, ParseInput, SessionOptions,
};
pub use pipeline::{
    export_deck, fix_all_errors, fix_error, open_selector, parse_deck, prints_for,
    report_custom_image, select_printing, CustomImage, CUSTOM_COMMANDER_ID, CUSTOM_COMMANDER_NAME,
    MIN_PARSE_LENGTH,
};
pub use state::{reduce, DeckAction, DeckState, ParseResult, SelectorState};
