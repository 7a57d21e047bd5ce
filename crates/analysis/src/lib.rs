//! Heuristic scoring functions for keynote decks.
//!
//! Every analyzer is a pure function of the extracted slides and an
//! [`AnalysisConfig`](keynote_core::AnalysisConfig). Design quality scores
//! geometry measured by a renderer; the others read text and markup only.

pub mod arc;
pub mod density;
pub mod design;
pub mod image;
pub mod narrative;
pub mod readability;
mod stats;

pub use arc::{ArcReport, ArcShape, HookGrade};
pub use density::DensityReport;
pub use design::{DesignReport, RenderedDeck, RenderedSlide};
pub use image::ImageReport;
pub use narrative::NarrativeReport;
pub use readability::ReadabilityReport;
