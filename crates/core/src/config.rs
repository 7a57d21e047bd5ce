//! Analysis thresholds and run settings.
//!
//! Every scoring function receives an [`AnalysisConfig`] by reference. The
//! defaults reproduce the stock heuristics; a TOML file may override any
//! subset of fields.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All tunable values for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AnalysisConfig {
    pub readability: ReadabilityThresholds,
    pub density: DensityThresholds,
    pub design: DesignThresholds,
    pub aggregator: AggregatorSettings,
}

impl AnalysisConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded analysis config from {}", path.display());
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityThresholds {
    /// Flesch-Kincaid grade above which a slide is flagged.
    pub max_grade_level: f64,
    /// Passive sentences per hundred sentences.
    pub max_passive_percent: f64,
    /// Jargon terms per hundred words.
    pub max_jargon_percent: f64,
    /// Sentences with more words than this are complex.
    pub max_sentence_words: usize,
}

impl Default for ReadabilityThresholds {
    fn default() -> Self {
        Self {
            max_grade_level: 10.0,
            max_passive_percent: 20.0,
            max_jargon_percent: 5.0,
            max_sentence_words: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityThresholds {
    pub high_word_count: usize,
    pub high_char_count: usize,
    pub many_bullets: usize,
    /// A visual-less content slide is only flagged above this many words.
    pub no_visual_min_words: usize,
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            high_word_count: 100,
            high_char_count: 600,
            many_bullets: 5,
            no_visual_min_words: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignThresholds {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Distance in percent within which an edge counts as on a grid line.
    pub grid_tolerance: f64,
    pub min_balance_score: f64,
    pub min_grid_alignment: f64,
    pub min_contrast_ratio: f64,
    /// Heading size variance (px) across same-layout slides.
    pub typography_variance: f64,
    pub typography_variance_high: f64,
    pub element_count_variance: f64,
    pub max_slides: usize,
    /// Delay after loading the deck before the first measurement.
    pub initial_wait_ms: u64,
    /// Delay after each slide advance.
    pub transition_wait_ms: u64,
    pub serve_port: u16,
}

impl Default for DesignThresholds {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            grid_tolerance: 2.0,
            min_balance_score: 0.5,
            min_grid_alignment: 0.5,
            min_contrast_ratio: 3.0,
            typography_variance: 8.0,
            typography_variance_high: 16.0,
            element_count_variance: 3.0,
            max_slides: 20,
            initial_wait_ms: 2000,
            transition_wait_ms: 600,
            serve_port: 8922,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    /// Per-analyzer time limit.
    pub timeout_secs: u64,
    /// More flow gaps than this raise a deck flag.
    pub max_flow_gaps: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_flow_gaps: 2,
        }
    }
}
