//! Core domain types, markup normalization, and analysis configuration
//! for keynote deck review.

pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::{
    AggregatorSettings, AnalysisConfig, DensityThresholds, DesignThresholds,
    ReadabilityThresholds,
};
pub use error::{Error, Result};
pub use normalize::MarkupNormalizer;
pub use types::{Deck, Flag, FlagKind, Layout, Severity, SlideRecord, Theme};
