//! Deck workflows built on the analyzers: the concurrent analysis
//! aggregator, review preparation (interview, prompts, summaries), narrative
//! build preparation, artifact conformance, and the deck creation wizard.
//!
//! Everything a workflow produces lands under `resources/materials/` in the
//! deck directory.

pub mod aggregate;
pub mod artifacts;
pub mod build;
pub mod conformance;
pub mod ingest;
pub mod interview;
pub mod prompts;
pub mod review;
pub mod wizard;
pub mod workrun;

pub use aggregate::{
    Aggregator, AnalysisSummary, Analyzer, BrowserRenderer, DeckAnalysisReport, DeckRenderer,
};
pub use build::{prepare_build, BuildOutcome};
pub use ingest::{ingest, Ingestion};
pub use interview::{InterviewContext, Interviewer};
pub use review::{prepare_review, AnalysisDigest, ReviewOptions, ReviewOutcome};
pub use wizard::{DeckBrief, Wizard, WizardSlide};
pub use workrun::WorkRun;
