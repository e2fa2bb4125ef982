//! Save-file export for the tabletop simulator

pub mod tabletop;

pub use tabletop::{
    deck_to_objects, export_file_name, generate_deck_ids, BackFace, ContainedObject, CustomDeck,
    CustomDeckObject, SaveFile, TransformOptions, DEFAULT_BACK_URL, DEFAULT_TRANSFORM_OPTIONS,
};
