//! Error types for deck extraction, analysis, and artifact handling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, analyzing, or packaging a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// The deck document does not exist.
    #[error("Deck not found: {}", .0.display())]
    DeckNotFound(PathBuf),

    /// The deck document parsed to zero slides.
    #[error("No slides found in deck")]
    NoSlides,

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to serialize a report or artifact.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The rendering engine or static server was unavailable.
    #[error("Rendering error: {0}")]
    RenderError(String),

    /// A persisted artifact from an earlier stage could not be read back.
    #[error("Malformed artifact {}: {message}", .path.display())]
    ArtifactError { path: PathBuf, message: String },

    /// A stage needed interview answers that were never recorded.
    #[error("No existing review context found at {}", .0.display())]
    MissingContext(PathBuf),
}
