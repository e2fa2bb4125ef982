//! Decklist loader (MTGO-style text)
//!
//! Line format: `<quantity> <name>[ (<SET>)][ <collectorNumber>][ *F*][ *E*]`

use crate::core::RawCard;
use crate::{FatesealError, Result};
use nom::bytes::complete::take_till1;
use nom::character::complete::{multispace0, multispace1};
use nom::multi::separated_list0;
use nom::sequence::{pair, preceded};
use nom::IResult;
use std::fs;
use std::path::Path;

const FOIL_MARKER: &str = "*F*";
const ETCHED_MARKER: &str = "*E*";

/// Largest quantity accepted on one line
pub const MAX_QUANTITY: u32 = 10_000;

/// Decklist loader for plain-text files
pub struct DeckListLoader;

impl DeckListLoader {
    /// Load and parse a decklist file, skipping blank lines
    pub fn load_from_file(path: &Path) -> Result<Vec<RawCard>> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse decklist text, skipping blank lines
    pub fn parse(content: &str) -> Result<Vec<RawCard>> {
        let lines: Vec<&str> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        parse_deck_list(&lines)
    }
}

/// Parse every line and flatten the per-copy records
///
/// Blank lines are expected to be filtered by the caller; one here fails.
pub fn parse_deck_list<S: AsRef<str>>(lines: &[S]) -> Result<Vec<RawCard>> {
    let mut cards = Vec::new();
    for line in lines {
        cards.extend(parse_line(line.as_ref())?);
    }
    Ok(cards)
}

/// Parse one decklist line into one record per physical copy
pub fn parse_line(line: &str) -> Result<Vec<RawCard>> {
    if line.trim().is_empty() {
        return Err(FatesealError::BlankLine);
    }

    let (rest, quantity_token) = leading_token(line)
        .map_err(|e| FatesealError::ParseError(format!("'{line}': {e}")))?;
    let quantity = parse_quantity(quantity_token)?;

    let entry = parse_entry(rest);
    if entry.name.is_empty() {
        return Err(FatesealError::ParseError(format!(
            "'{line}': missing card name"
        )));
    }

    Ok((0..quantity).map(|_| entry.clone()).collect())
}

/// First whitespace-delimited token and the remainder after it
fn leading_token(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, take_till1(char::is_whitespace))(input)
}

fn parse_quantity(token: &str) -> Result<u32> {
    match token.parse::<i64>() {
        Ok(n) if n > 0 && n <= i64::from(MAX_QUANTITY) => {
            u32::try_from(n).map_err(|_| FatesealError::InvalidQuantity(token.to_string()))
        }
        _ => Err(FatesealError::InvalidQuantity(token.to_string())),
    }
}

/// Split the text after the quantity into name, set, collector number and finishes
///
/// The last parenthesized group is taken as the set code, whatever it contains.
fn parse_entry(rest: &str) -> RawCard {
    let Some((name, set, trailing)) = split_set_group(rest) else {
        return RawCard::named(rest.trim());
    };

    let foil = trailing.contains(FOIL_MARKER);
    let etched = trailing.contains(ETCHED_MARKER);
    let stripped = trailing.replace(FOIL_MARKER, " ").replace(ETCHED_MARKER, " ");
    let tokens = trailing_tokens(&stripped);

    let set = set.trim().to_lowercase();
    let collector_number = tokens.join(" ").to_lowercase();

    RawCard {
        name: name.trim().to_string(),
        quantity: 1,
        set: (!set.is_empty()).then_some(set),
        collector_number: (!collector_number.is_empty()).then_some(collector_number),
        foil: foil.then_some(true),
        etched: etched.then_some(true),
    }
}

/// `name (SET) trailing` -> (name, SET, trailing)
fn split_set_group(rest: &str) -> Option<(&str, &str, &str)> {
    let close = rest.rfind(')')?;
    let open = rest[..close].rfind('(')?;
    Some((&rest[..open], &rest[open + 1..close], &rest[close + 1..]))
}

fn trailing_tokens(input: &str) -> Vec<&str> {
    let parsed: IResult<&str, (&str, Vec<&str>)> = pair(
        multispace0,
        separated_list0(multispace1, take_till1(char::is_whitespace)),
    )(input);

    match parsed {
        Ok((_, (_, tokens))) => tokens,
        Err(_) => input.split_whitespace().collect(),
    }
}
