//! Error types for Fateseal

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FatesealError {
    #[error("Blank decklist line")]
    BlankLine,

    #[error("Invalid quantity '{0}': expected a positive integer")]
    InvalidQuantity(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Card database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("Image failed to load: {0}")]
    ImageLoad(String),

    #[error("Nothing to export: the deck has no resolved cards")]
    EmptyDeck,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, FatesealError>;
