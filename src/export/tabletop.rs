//! Tabletop Simulator save-file export
//!
//! Field names and order follow the simulator's saved-object schema
//! exactly. Each pile is a `DeckCustom` object: a map from 1-based slot to
//! face/back URLs, a `DeckIDs` list (`slot * 100`) and one contained card
//! object per slot.

use crate::core::BasicCard;
use crate::Result;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

/// Generic card back used when no custom back is supplied
pub const DEFAULT_BACK_URL: &str = "https://i.imgur.com/Hg8CwwU.jpeg";

const PILE_NAME: &str = "DeckCustom";
const CARD_OBJECT_NAME: &str = "Card";
const SLOT_ID_STRIDE: u32 = 100;
/// Horizontal gap between piles
const PILE_OFFSET_X: f64 = 2.2;

/// Whole save file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    #[serde(rename = "ObjectStates")]
    pub object_states: Vec<CustomDeck>,
}

/// One pile of cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDeck {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CustomDeck")]
    pub custom_deck: BTreeMap<u32, CustomDeckObject>,
    #[serde(rename = "DeckIDs")]
    pub deck_ids: Vec<u32>,
    #[serde(rename = "Transform")]
    pub transform: TransformOptions,
    #[serde(rename = "ContainedObjects")]
    pub contained_objects: Vec<ContainedObject>,
}

/// Placement record for one card in a pile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainedObject {
    #[serde(rename = "CardID")]
    pub card_id: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Nickname")]
    pub nickname: String,
    #[serde(rename = "Transform")]
    pub transform: TransformOptions,
}

/// Face/back image pair for one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDeckObject {
    #[serde(rename = "FaceURL")]
    pub face_url: String,
    #[serde(rename = "BackURL")]
    pub back_url: String,
    #[serde(rename = "NumHeight")]
    pub num_height: u8,
    #[serde(rename = "NumWidth")]
    pub num_width: u8,
    #[serde(rename = "BackIsHidden")]
    pub back_is_hidden: bool,
}

/// Position, rotation and scale of an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    #[serde(rename = "posX", serialize_with = "json_number")]
    pub pos_x: f64,
    #[serde(rename = "posY", serialize_with = "json_number")]
    pub pos_y: f64,
    #[serde(rename = "posZ", serialize_with = "json_number")]
    pub pos_z: f64,
    #[serde(rename = "rotX", serialize_with = "json_number")]
    pub rot_x: f64,
    #[serde(rename = "rotY", serialize_with = "json_number")]
    pub rot_y: f64,
    #[serde(rename = "rotZ", serialize_with = "json_number")]
    pub rot_z: f64,
    #[serde(rename = "scaleX", serialize_with = "json_number")]
    pub scale_x: f64,
    #[serde(rename = "scaleY", serialize_with = "json_number")]
    pub scale_y: f64,
    #[serde(rename = "scaleZ", serialize_with = "json_number")]
    pub scale_z: f64,
}

/// Face-down, upright card at the origin
pub const DEFAULT_TRANSFORM_OPTIONS: TransformOptions = TransformOptions {
    pos_x: 0.0,
    pos_y: 0.0,
    pos_z: 0.0,
    rot_x: 0.0,
    rot_y: 180.0,
    rot_z: 180.0,
    scale_x: 1.0,
    scale_y: 1.0,
    scale_z: 1.0,
};

impl Default for TransformOptions {
    fn default() -> Self {
        DEFAULT_TRANSFORM_OPTIONS
    }
}

/// Whole numbers are written as JSON integers (`1`, not `1.0`)
fn json_number<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Which image goes on the back of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackFace<'a> {
    /// The generic (or custom) card back
    CardBack(&'a str),
    /// The card's own back face, falling back to the card back
    OwnBackFace(&'a str),
}

/// Numeric ids for `total` slots: 100, 200, ...
pub fn generate_deck_ids(total: usize) -> Vec<u32> {
    (1..=total as u32).map(|slot| slot * SLOT_ID_STRIDE).collect()
}

pub fn card_to_custom_deck_object(card: &BasicCard, back: BackFace<'_>) -> CustomDeckObject {
    let back_url = match back {
        BackFace::CardBack(url) => url.to_string(),
        BackFace::OwnBackFace(fallback) => card
            .images
            .back
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    };

    CustomDeckObject {
        face_url: card.images.front.clone(),
        back_url,
        num_height: 1,
        num_width: 1,
        back_is_hidden: true,
    }
}

pub fn card_to_contained_object(card: &BasicCard, id: u32) -> ContainedObject {
    ContainedObject {
        card_id: id,
        name: CARD_OBJECT_NAME.to_string(),
        nickname: card.name.clone(),
        transform: DEFAULT_TRANSFORM_OPTIONS,
    }
}

/// Build one pile from cards in order
pub fn build_pile(cards: &[&BasicCard], back: BackFace<'_>, transform: TransformOptions) -> CustomDeck {
    let deck_ids = generate_deck_ids(cards.len());

    let custom_deck = cards
        .iter()
        .zip(1u32..)
        .map(|(card, slot)| (slot, card_to_custom_deck_object(card, back)))
        .collect();

    let contained_objects = cards
        .iter()
        .zip(&deck_ids)
        .map(|(card, &id)| card_to_contained_object(card, id))
        .collect();

    CustomDeck {
        name: PILE_NAME.to_string(),
        custom_deck,
        deck_ids,
        transform,
        contained_objects,
    }
}

/// Build the save file: main pile, then transform and extras piles when non-empty
pub fn deck_to_objects(
    main: &[BasicCard],
    extras: &[BasicCard],
    custom_back_url: Option<&str>,
) -> SaveFile {
    let card_back = custom_back_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BACK_URL);

    let main_refs: Vec<&BasicCard> = main.iter().collect();
    let transform_refs: Vec<&BasicCard> = main.iter().filter(|c| c.images.has_back()).collect();
    let extra_refs: Vec<&BasicCard> = extras.iter().collect();

    let mut object_states = vec![build_pile(
        &main_refs,
        BackFace::CardBack(card_back),
        TransformOptions {
            pos_y: 1.0,
            ..DEFAULT_TRANSFORM_OPTIONS
        },
    )];

    if !transform_refs.is_empty() {
        object_states.push(build_pile(
            &transform_refs,
            BackFace::OwnBackFace(card_back),
            side_pile_transform(1.0),
        ));
    }

    if !extra_refs.is_empty() {
        object_states.push(build_pile(
            &extra_refs,
            BackFace::CardBack(card_back),
            side_pile_transform(2.0),
        ));
    }

    SaveFile { object_states }
}

/// Face-up pile `offsets` gaps to the right of the main pile
fn side_pile_transform(offsets: f64) -> TransformOptions {
    TransformOptions {
        pos_x: PILE_OFFSET_X * offsets,
        pos_y: 1.0,
        rot_z: 0.0,
        ..DEFAULT_TRANSFORM_OPTIONS
    }
}

impl SaveFile {
    /// Pretty JSON with 2-space indentation
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// `<deck name>.json`, or `fateseal.json` for an unnamed deck
pub fn export_file_name(deck_name: &str) -> String {
    let name = deck_name.trim();
    if name.is_empty() {
        "fateseal.json".to_string()
    } else {
        format!("{name}.json")
    }
}
