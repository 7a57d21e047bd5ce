//! HTML deck backend for keynote deck review.
//!
//! Reads a deck's `index.html` and splits it into ordered slide records.

pub mod parser;

pub use parser::{load_deck, DeckParser, DECK_DOCUMENT};
