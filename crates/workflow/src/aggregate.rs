//! Runs every analyzer against one deck and condenses the results into
//! north-star signals, a heuristic grade, and a flat list of flags.
//!
//! Each analyzer is isolated: a failure, panic, or timeout becomes an entry
//! in [`DeckAnalysisReport::errors`] and the remaining analyzers still run.

use crate::artifacts;
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use keynote_analysis::{
    arc, density, design, image, narrative, readability, ArcReport, ArcShape, DensityReport,
    DesignReport, HookGrade, ImageReport, NarrativeReport, ReadabilityReport, RenderedDeck,
};
use keynote_core::{AnalysisConfig, Deck, DesignThresholds, FlagKind, Result, Severity};
use keynote_render::RenderTarget;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;

/// The analyzers run by [`Aggregator`], in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analyzer {
    VisualDensity,
    ImageAnalysis,
    NarrativeReview,
    EmotionalArc,
    Readability,
    DesignQuality,
}

impl Analyzer {
    pub const ALL: [Analyzer; 6] = [
        Analyzer::VisualDensity,
        Analyzer::ImageAnalysis,
        Analyzer::NarrativeReview,
        Analyzer::EmotionalArc,
        Analyzer::Readability,
        Analyzer::DesignQuality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Analyzer::VisualDensity => "visual-density",
            Analyzer::ImageAnalysis => "image-analysis",
            Analyzer::NarrativeReview => "narrative-review",
            Analyzer::EmotionalArc => "emotional-arc",
            Analyzer::Readability => "readability",
            Analyzer::DesignQuality => "design-quality",
        }
    }
}

/// Produces rendered slide geometry for design scoring.
pub trait DeckRenderer {
    fn render<'a>(&'a self, deck_dir: &'a Path) -> LocalBoxFuture<'a, Result<RenderedDeck>>;
}

/// Renders through a headless browser.
pub struct BrowserRenderer {
    target: RenderTarget,
    thresholds: DesignThresholds,
}

impl BrowserRenderer {
    pub fn new(target: RenderTarget, thresholds: &DesignThresholds) -> Self {
        Self {
            target,
            thresholds: thresholds.clone(),
        }
    }
}

impl DeckRenderer for BrowserRenderer {
    fn render<'a>(&'a self, deck_dir: &'a Path) -> LocalBoxFuture<'a, Result<RenderedDeck>> {
        keynote_render::render_deck(deck_dir, &self.target, &self.thresholds).boxed_local()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResults {
    #[serde(rename = "visual-density", default, skip_serializing_if = "Option::is_none")]
    pub visual_density: Option<DensityReport>,
    #[serde(rename = "image-analysis", default, skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<ImageReport>,
    #[serde(rename = "narrative-review", default, skip_serializing_if = "Option::is_none")]
    pub narrative_review: Option<NarrativeReport>,
    #[serde(rename = "emotional-arc", default, skip_serializing_if = "Option::is_none")]
    pub emotional_arc: Option<ArcReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readability: Option<ReadabilityReport>,
    #[serde(rename = "design-quality", default, skip_serializing_if = "Option::is_none")]
    pub design_quality: Option<DesignReport>,
}

impl RawResults {
    /// Whether the analyzer produced a report.
    pub fn has(&self, analyzer: Analyzer) -> bool {
        match analyzer {
            Analyzer::VisualDensity => self.visual_density.is_some(),
            Analyzer::ImageAnalysis => self.image_analysis.is_some(),
            Analyzer::NarrativeReview => self.narrative_review.is_some(),
            Analyzer::EmotionalArc => self.emotional_arc.is_some(),
            Analyzer::Readability => self.readability.is_some(),
            Analyzer::DesignQuality => self.design_quality.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerError {
    pub analyzer: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    VisualDensity,
    Images,
    Storytelling,
    Readability,
    Design,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::VisualDensity => "visual-density",
            Category::Images => "images",
            Category::Storytelling => "storytelling",
            Category::Readability => "readability",
            Category::Design => "design",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    NoVisualsOnContentSlide,
    HighWordCount,
    MissingAltText,
    EmptyMediaFrames,
    WeakHook,
    LabelHeadline,
    FlowGaps,
    HighGradeLevel,
    HighJargonDensity,
    HighSeverityDesign,
}

/// A deck-level finding condensed from one analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFlag {
    pub category: Category,
    pub signal: Signal,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl AnalysisFlag {
    fn new(category: Category, signal: Signal, message: impl Into<String>) -> Self {
        Self {
            category,
            signal,
            message: message.into(),
            slides: None,
            details: None,
        }
    }

    fn with_slides(mut self, slides: Vec<usize>) -> Self {
        self.slides = Some(slides);
        self
    }

    fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Scores from 0 to 100; `None` when the contributing analyzer failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NorthStarSignals {
    pub storytelling: Option<u32>,
    pub clarity: Option<u32>,
    pub design: Option<u32>,
    pub visual_balance: Option<u32>,
}

impl NorthStarSignals {
    pub fn present(&self) -> Vec<u32> {
        [self.storytelling, self.clarity, self.design, self.visual_balance]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub total_flags: usize,
    pub flags: Vec<AnalysisFlag>,
    pub heuristic_score: Option<u32>,
    pub heuristic_grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualDensityDigest {
    pub avg_words_per_slide: f64,
    pub avg_visuals_per_slide: f64,
    pub slides_without_visuals: usize,
    pub flags: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysisDigest {
    pub total_images: usize,
    pub images_missing_alt: usize,
    pub images_with_prompt: usize,
    pub text_only_slides: usize,
    pub slides_with_empty_frames: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalArcDigest {
    pub hook_grade: HookGrade,
    pub arc_shape: ArcShape,
    pub flow_gaps: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityDigest {
    pub avg_grade_level: Option<f64>,
    pub passive_voice_percent: f64,
    pub jargon_density: f64,
    pub complex_sentences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeDigest {
    pub total_issues: usize,
    pub slides_with_issues: usize,
    pub headline_issues: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignQualityDigest {
    pub total_flags: usize,
    pub by_type: BTreeMap<FlagKind, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDigests {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_density: Option<VisualDensityDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<ImageAnalysisDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_review: Option<NarrativeDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_arc: Option<EmotionalArcDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readability: Option<ReadabilityDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_quality: Option<DesignQualityDigest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub overall: OverallSummary,
    pub by_category: CategoryDigests,
    pub north_star_signals: NorthStarSignals,
}

/// Everything one aggregate run produced; persisted as `full-analysis.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckAnalysisReport {
    pub deck_path: String,
    pub analyzed_at: DateTime<Utc>,
    pub slide_count: usize,
    pub summary: AnalysisSummary,
    pub raw_results: RawResults,
    pub errors: Vec<AnalyzerError>,
}

impl DeckAnalysisReport {
    /// Write to `<deck>/resources/materials/full-analysis.json`, replacing any earlier run.
    pub fn save(&self, deck_dir: &Path) -> Result<PathBuf> {
        let path = artifacts::material(deck_dir, artifacts::FULL_ANALYSIS);
        artifacts::write_json(&path, self)?;
        Ok(path)
    }

    pub fn error_for(&self, analyzer: Analyzer) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.analyzer == analyzer.name())
            .map(|e| e.error.as_str())
    }
}

/// Runs the analyzers concurrently, each under its own time limit.
pub struct Aggregator {
    config: Arc<AnalysisConfig>,
    renderer: Option<Box<dyn DeckRenderer>>,
}

impl Aggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config: Arc::new(config),
            renderer: None,
        }
    }

    /// Enable design scoring through `renderer`.
    pub fn with_renderer(mut self, renderer: impl DeckRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Enable design scoring through a headless browser when the target is
    /// served over HTTP; a plain file target leaves design scoring off.
    pub fn with_render_target(self, target: RenderTarget) -> Self {
        if target.is_hosted() {
            let renderer = BrowserRenderer::new(target, &self.config.design);
            self.with_renderer(renderer)
        } else {
            self
        }
    }

    pub fn design_enabled(&self) -> bool {
        self.renderer.is_some()
    }

    /// Load the deck at `deck_dir` and analyze it.
    pub async fn run(&self, deck_dir: &Path) -> Result<DeckAnalysisReport> {
        let deck = keynote_html::load_deck(deck_dir)?;
        Ok(self.analyze(deck, deck_dir).await)
    }

    /// Analyze an already extracted deck. Never fails; analyzer problems
    /// are reported in `errors`.
    pub async fn analyze(&self, deck: Deck, deck_dir: &Path) -> DeckAnalysisReport {
        let deck = Arc::new(deck);
        let limit = Duration::from_secs(self.config.aggregator.timeout_secs);

        let density_job = {
            let (deck, config) = (Arc::clone(&deck), Arc::clone(&self.config));
            run_blocking(limit, move || density::analyze_deck(&deck, &config))
        };
        let image_job = {
            let deck = Arc::clone(&deck);
            run_blocking(limit, move || image::analyze_deck(&deck))
        };
        let narrative_job = {
            let deck = Arc::clone(&deck);
            run_blocking(limit, move || narrative::analyze_deck(&deck))
        };
        let arc_job = {
            let deck = Arc::clone(&deck);
            run_blocking(limit, move || arc::analyze_deck(&deck))
        };
        let readability_job = {
            let (deck, config) = (Arc::clone(&deck), Arc::clone(&self.config));
            run_blocking(limit, move || readability::analyze_deck(&deck, &config))
        };
        let design_job = self.run_design(deck_dir, limit);

        let (
            density_result,
            image_result,
            narrative_result,
            arc_result,
            readability_result,
            design_result,
        ) = tokio::join!(
            density_job,
            image_job,
            narrative_job,
            arc_job,
            readability_job,
            design_job
        );

        let mut raw = RawResults::default();
        let mut errors = Vec::new();
        raw.visual_density = record(Analyzer::VisualDensity, density_result, &mut errors);
        raw.image_analysis = record(Analyzer::ImageAnalysis, image_result, &mut errors);
        raw.narrative_review = record(Analyzer::NarrativeReview, narrative_result, &mut errors);
        raw.emotional_arc = record(Analyzer::EmotionalArc, arc_result, &mut errors);
        raw.readability = record(Analyzer::Readability, readability_result, &mut errors);
        if let Some(result) = design_result {
            raw.design_quality = record(Analyzer::DesignQuality, result, &mut errors);
        } else {
            log::debug!("Design quality skipped: no render target");
        }

        DeckAnalysisReport {
            deck_path: deck.deck_path.clone(),
            analyzed_at: Utc::now(),
            slide_count: deck.slide_count(),
            summary: summarize(&raw, &self.config),
            raw_results: raw,
            errors,
        }
    }

    async fn run_design(
        &self,
        deck_dir: &Path,
        limit: Duration,
    ) -> Option<std::result::Result<DesignReport, String>> {
        let renderer = self.renderer.as_ref()?;
        let render = AssertUnwindSafe(renderer.render(deck_dir)).catch_unwind();

        let outcome = match tokio::time::timeout(limit, render).await {
            Err(_) => Err(timeout_message(limit)),
            Ok(Err(payload)) => Err(panic_message(payload)),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Ok(Ok(rendered))) if rendered.slides.is_empty() => {
                Err(format!("No slides rendered at {}", rendered.deck_url))
            }
            Ok(Ok(Ok(rendered))) => Ok(design::analyze_deck(&rendered, &self.config)),
        };
        Some(outcome)
    }
}

/// Run `job` on the blocking pool under `limit`. A timeout abandons the
/// job rather than stopping it: the thread runs to completion, so the
/// runtime owner should shut down with a bounded wait.
async fn run_blocking<T, F>(limit: Duration, job: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(e)) => Err(join_message(e)),
        Err(_) => Err(timeout_message(limit)),
    }
}

fn record<T>(
    analyzer: Analyzer,
    result: std::result::Result<T, String>,
    errors: &mut Vec<AnalyzerError>,
) -> Option<T> {
    match result {
        Ok(report) => Some(report),
        Err(error) => {
            log::warn!("{} failed: {}", analyzer.name(), error);
            errors.push(AnalyzerError {
                analyzer: analyzer.name().to_string(),
                error,
            });
            None
        }
    }
}

fn timeout_message(limit: Duration) -> String {
    format!("Timed out after {}s", limit.as_secs())
}

fn join_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "Analyzer task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Analyzer panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Analyzer panicked: {}", message)
    } else {
        "Analyzer panicked".to_string()
    }
}

/// JavaScript-style rounding to a whole score.
fn score(value: f64) -> u32 {
    (value + 0.5).floor().max(0.0) as u32
}

fn hook_score(grade: HookGrade) -> f64 {
    match grade {
        HookGrade::Provocative => 100.0,
        HookGrade::Interesting => 75.0,
        HookGrade::Informational => 50.0,
        HookGrade::Weak => 25.0,
    }
}

fn arc_score(shape: ArcShape) -> f64 {
    match shape {
        ArcShape::BuildsThenResolves => 100.0,
        ArcShape::FrontLoaded => 80.0,
        ArcShape::Mixed => 60.0,
        ArcShape::Flat => 30.0,
        ArcShape::Chaotic => 20.0,
        ArcShape::AllPositive => 40.0,
        ArcShape::AllNegative => 30.0,
        ArcShape::TooShort => 50.0,
    }
}

/// Letter grade for a heuristic score.
pub fn letter_grade(score: u32) -> &'static str {
    match score {
        85.. => "A",
        70..=84 => "B",
        55..=69 => "C",
        40..=54 => "D",
        _ => "F",
    }
}

/// Condense raw analyzer reports into signals and flat flags.
pub fn summarize(raw: &RawResults, config: &AnalysisConfig) -> AnalysisSummary {
    let mut summary = AnalysisSummary::default();
    let flags = &mut summary.overall.flags;

    if let Some(vd) = &raw.visual_density {
        let averages = &vd.deck_averages;
        let no_visuals = vd.flag_summary.slides_with(FlagKind::NoVisualsOnContentSlide);
        let wordy = vd.flag_summary.slides_with(FlagKind::HighWordCount);

        summary.by_category.visual_density = Some(VisualDensityDigest {
            avg_words_per_slide: averages.avg_word_count,
            avg_visuals_per_slide: averages.avg_visual_count,
            slides_without_visuals: no_visuals.len(),
            flags: vd.flag_summary.total_flags,
        });

        let text_score = (100.0 - averages.avg_word_count * 2.0).max(0.0);
        let visual_score = (averages.avg_visual_count * 50.0).min(100.0);
        summary.north_star_signals.visual_balance = Some(score((text_score + visual_score) / 2.0));

        if !no_visuals.is_empty() {
            flags.push(
                AnalysisFlag::new(
                    Category::VisualDensity,
                    Signal::NoVisualsOnContentSlide,
                    format!("{} content slide(s) missing visuals", no_visuals.len()),
                )
                .with_slides(no_visuals),
            );
        }
        if !wordy.is_empty() {
            flags.push(
                AnalysisFlag::new(
                    Category::VisualDensity,
                    Signal::HighWordCount,
                    format!("{} slide(s) have too much text", wordy.len()),
                )
                .with_slides(wordy),
            );
        }
    }

    if let Some(ia) = &raw.image_analysis {
        let missing_alt = ia.slides_missing_alt();
        let empty_frames = ia.slides_with_empty_frames();

        summary.by_category.image_analysis = Some(ImageAnalysisDigest {
            total_images: ia.summary.total_images,
            images_missing_alt: ia.summary.images_missing_alt,
            images_with_prompt: ia.summary.images_with_prompt,
            text_only_slides: ia.summary.text_only_slides,
            slides_with_empty_frames: ia.summary.slides_with_empty_frames,
        });

        if !missing_alt.is_empty() {
            flags.push(
                AnalysisFlag::new(
                    Category::Images,
                    Signal::MissingAltText,
                    format!("{} image(s) missing alt text", ia.summary.images_missing_alt),
                )
                .with_slides(missing_alt),
            );
        }
        if !empty_frames.is_empty() {
            flags.push(
                AnalysisFlag::new(
                    Category::Images,
                    Signal::EmptyMediaFrames,
                    format!("{} slide(s) have unfilled media frames", empty_frames.len()),
                )
                .with_slides(empty_frames),
            );
        }
    }

    if let Some(ea) = &raw.emotional_arc {
        let grade = ea.hook_analysis.overall_grade;
        let shape = ea.emotional_arc.arc_shape.shape;
        let gaps = ea.flow_chain.gap_count;

        summary.by_category.emotional_arc = Some(EmotionalArcDigest {
            hook_grade: grade,
            arc_shape: shape,
            flow_gaps: gaps,
            recommendations: ea.summary.recommendations.clone(),
        });

        let flow_score = (100.0 - gaps as f64 * 20.0).max(0.0);
        summary.north_star_signals.storytelling =
            Some(score((hook_score(grade) + arc_score(shape) + flow_score) / 3.0));

        if grade == HookGrade::Weak {
            flags.push(AnalysisFlag::new(
                Category::Storytelling,
                Signal::WeakHook,
                "Weak opening hook - needs provocative or interesting opener",
            ));
        }
        if gaps > config.aggregator.max_flow_gaps {
            flags.push(
                AnalysisFlag::new(
                    Category::Storytelling,
                    Signal::FlowGaps,
                    format!("{} flow gaps - slides don't connect logically", gaps),
                )
                .with_slides(ea.flow_chain.gaps.iter().map(|g| g.to_slide).collect()),
            );
        }
    }

    let label_slides = label_headline_slides(raw);
    if !label_slides.is_empty() {
        flags.push(
            AnalysisFlag::new(
                Category::Storytelling,
                Signal::LabelHeadline,
                format!(
                    "{} slide(s) have label or weak headlines instead of claims",
                    label_slides.len()
                ),
            )
            .with_slides(label_slides),
        );
    }

    if let Some(nr) = &raw.narrative_review {
        summary.by_category.narrative_review = Some(NarrativeDigest {
            total_issues: nr.summary.total_issues,
            slides_with_issues: nr.summary.slides_with_issues,
            headline_issues: nr.headline_issues().count(),
        });
    }

    if let Some(rd) = &raw.readability {
        let averages = &rd.deck_average;
        let grade = averages.flesch_kincaid_grade.filter(|g| *g != 0.0);

        summary.by_category.readability = Some(ReadabilityDigest {
            avg_grade_level: grade,
            passive_voice_percent: averages.passive_voice_percent,
            jargon_density: averages.jargon_density,
            complex_sentences: rd.summary.total_complex_sentences,
        });

        let grade_score = (100.0 - (grade.unwrap_or(8.0) - 6.0) * 10.0).max(0.0);
        let passive_score = (100.0 - averages.passive_voice_percent * 3.0).max(0.0);
        let jargon_score = (100.0 - averages.jargon_density * 10.0).max(0.0);
        summary.north_star_signals.clarity =
            Some(score((grade_score + passive_score + jargon_score) / 3.0));

        let thresholds = &config.readability;
        if let Some(g) = grade.filter(|g| *g > thresholds.max_grade_level) {
            flags.push(AnalysisFlag::new(
                Category::Readability,
                Signal::HighGradeLevel,
                format!(
                    "High reading grade level: {:.1} (target: <{})",
                    g, thresholds.max_grade_level
                ),
            ));
        }
        if averages.jargon_density > thresholds.max_jargon_percent {
            flags.push(AnalysisFlag::new(
                Category::Readability,
                Signal::HighJargonDensity,
                format!("High jargon density: {:.1}%", averages.jargon_density),
            ));
        }
    }

    if let Some(dq) = &raw.design_quality {
        let high = dq.count_severity(Severity::High);
        let medium = dq.count_severity(Severity::Medium);

        summary.by_category.design_quality = Some(DesignQualityDigest {
            total_flags: dq.summary.total_flags,
            by_type: dq.summary.by_type.clone(),
            by_severity: dq.summary.by_severity.clone(),
        });

        let penalty = 20 * high + 10 * medium;
        summary.north_star_signals.design = Some(100u32.saturating_sub(penalty as u32));

        if high > 0 {
            let details = dq
                .flags
                .iter()
                .filter(|f| f.severity == Some(Severity::High))
                .take(3)
                .map(|f| f.message.clone())
                .collect();
            flags.push(
                AnalysisFlag::new(
                    Category::Design,
                    Signal::HighSeverityDesign,
                    format!("{} high-severity design issue(s)", high),
                )
                .with_details(details),
            );
        }
    }

    summary.overall.total_flags = summary.overall.flags.len();

    let present = summary.north_star_signals.present();
    if !present.is_empty() {
        let mean = present.iter().map(|&s| s as f64).sum::<f64>() / present.len() as f64;
        let heuristic = score(mean);
        summary.overall.heuristic_score = Some(heuristic);
        summary.overall.heuristic_grade = Some(letter_grade(heuristic).to_string());
    }

    summary
}

/// Slides whose headline reads as a label: narrative headline findings plus
/// opening hooks downgraded for a label headline.
fn label_headline_slides(raw: &RawResults) -> Vec<usize> {
    let mut slides: Vec<usize> = Vec::new();

    if let Some(nr) = &raw.narrative_review {
        slides.extend(nr.headline_issues().map(|(slide, _)| slide.index));
    }
    if let Some(ea) = &raw.emotional_arc {
        slides.extend(
            ea.hook_analysis
                .opening_slides
                .iter()
                .filter(|hook| hook.reasons.iter().any(|r| r.starts_with("headline is a label")))
                .map(|hook| hook.slide_index),
        );
    }

    slides.sort_unstable();
    slides.dedup();
    slides
}

#[cfg(test)]
mod tests {
    use super::*;
    use keynote_core::Error;

    const TITLE_SLIDE: &str = r#"<section class="slide" data-title="Revenue">
  <div class="slide-inner layout-title">
    <h1 class="title">Revenue</h1>
  </div>
</section>"#;

    fn wordy_slide() -> String {
        let sentence = "Our regional teams shipped eleven pilot programs across three markets this spring. ";
        let body = sentence.repeat(13);
        format!(
            r#"<section class="slide" data-title="Pilot programs">
  <div class="slide-inner layout-content">
    <h2 class="title">Regional pilots shipped on schedule this spring</h2>
    <p class="body-text">{}</p>
  </div>
</section>"#,
            body.trim()
        )
    }

    fn write_deck(dir: &Path, slides: &[String]) {
        let html = format!("<html><body><main>\n{}\n</main></body></html>", slides.join("\n"));
        std::fs::write(dir.join("index.html"), html).unwrap();
    }

    struct FailingRenderer;

    impl DeckRenderer for FailingRenderer {
        fn render<'a>(&'a self, _deck_dir: &'a Path) -> LocalBoxFuture<'a, Result<RenderedDeck>> {
            async { Err(Error::RenderError("browser unavailable".to_string())) }.boxed_local()
        }
    }

    struct EmptyRenderer;

    impl DeckRenderer for EmptyRenderer {
        fn render<'a>(&'a self, _deck_dir: &'a Path) -> LocalBoxFuture<'a, Result<RenderedDeck>> {
            async {
                Ok(RenderedDeck {
                    deck_url: "http://127.0.0.1:8922/missing/index.html".to_string(),
                    slide_count: 0,
                    slides: Vec::new(),
                })
            }
            .boxed_local()
        }
    }

    struct SlowRenderer;

    impl DeckRenderer for SlowRenderer {
        fn render<'a>(&'a self, _deck_dir: &'a Path) -> LocalBoxFuture<'a, Result<RenderedDeck>> {
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Err(Error::RenderError("unreachable".to_string()))
            }
            .boxed_local()
        }
    }

    #[test]
    fn test_letter_grade() {
        assert_eq!(letter_grade(85), "A");
        assert_eq!(letter_grade(84), "B");
        assert_eq!(letter_grade(70), "B");
        assert_eq!(letter_grade(55), "C");
        assert_eq!(letter_grade(40), "D");
        assert_eq!(letter_grade(39), "F");
    }

    #[test]
    fn test_score_rounds_half_up() {
        assert_eq!(score(62.5), 63);
        assert_eq!(score(62.49), 62);
        assert_eq!(score(-3.0), 0);
    }

    #[test]
    fn test_empty_results_have_no_score() {
        let summary = summarize(&RawResults::default(), &AnalysisConfig::default());
        assert_eq!(summary.overall.heuristic_score, None);
        assert_eq!(summary.overall.heuristic_grade, None);
        assert_eq!(summary.overall.total_flags, 0);
    }

    #[tokio::test]
    async fn test_end_to_end_two_slide_deck() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path(), &[TITLE_SLIDE.to_string(), wordy_slide()]);

        let report = Aggregator::new(AnalysisConfig::default())
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(report.slide_count, 2);
        assert!(report.errors.is_empty());
        assert!(report.raw_results.design_quality.is_none());

        let signals: Vec<Signal> = report.summary.overall.flags.iter().map(|f| f.signal).collect();
        assert!(signals.contains(&Signal::LabelHeadline));
        assert!(signals.contains(&Signal::NoVisualsOnContentSlide));
        assert!(signals.contains(&Signal::HighWordCount));
        assert!(report.summary.overall.total_flags >= 2);

        let no_visuals = report
            .summary
            .overall
            .flags
            .iter()
            .find(|f| f.signal == Signal::NoVisualsOnContentSlide)
            .unwrap();
        assert_eq!(no_visuals.slides, Some(vec![2]));

        let label = report
            .summary
            .overall
            .flags
            .iter()
            .find(|f| f.signal == Signal::LabelHeadline)
            .unwrap();
        assert_eq!(label.slides, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_image_findings_flagged_without_scoring() {
        let dir = tempfile::tempdir().unwrap();
        let framed = r#"<section class="slide" data-title="Sites">
  <div class="slide-inner layout-split">
    <h2 class="title">Pilots ran in three regions</h2>
    <div class="media-frame"><img class="gen-media" src="map.png"></div>
  </div>
</section>"#;
        let placeholder = r#"<section class="slide" data-title="Chart">
  <div class="slide-inner layout-split">
    <h2 class="title">Costs fell every quarter</h2>
    <div class="media-frame"><div class="media-placeholder">Chart</div></div>
  </div>
</section>"#;
        write_deck(dir.path(), &[framed.to_string(), placeholder.to_string()]);

        let report = Aggregator::new(AnalysisConfig::default())
            .run(dir.path())
            .await
            .unwrap();

        let images = report.raw_results.image_analysis.as_ref().unwrap();
        assert_eq!(images.summary.total_images, 1);
        assert_eq!(images.summary.images_in_media_frame, 1);

        let digest = report.summary.by_category.image_analysis.as_ref().unwrap();
        assert_eq!(digest.images_missing_alt, 1);
        assert_eq!(digest.slides_with_empty_frames, 1);

        let flags = &report.summary.overall.flags;
        let alt = flags.iter().find(|f| f.signal == Signal::MissingAltText).unwrap();
        assert_eq!(alt.category, Category::Images);
        assert_eq!(alt.slides, Some(vec![1]));
        let empty = flags.iter().find(|f| f.signal == Signal::EmptyMediaFrames).unwrap();
        assert_eq!(empty.slides, Some(vec![2]));

        // Images contribute flags but no north-star signal.
        assert_eq!(report.summary.north_star_signals.present().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_design_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path(), &[TITLE_SLIDE.to_string(), wordy_slide()]);

        let report = Aggregator::new(AnalysisConfig::default())
            .with_renderer(FailingRenderer)
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].analyzer, "design-quality");
        assert!(report.errors[0].error.contains("browser unavailable"));
        assert_eq!(
            report.error_for(Analyzer::DesignQuality),
            Some("Rendering error: browser unavailable")
        );

        let signals = &report.summary.north_star_signals;
        assert_eq!(signals.design, None);
        let others = [signals.storytelling, signals.clarity, signals.visual_balance];
        assert!(others.iter().all(Option::is_some));

        let mean = others.iter().flatten().map(|&s| s as f64).sum::<f64>() / 3.0;
        assert_eq!(report.summary.overall.heuristic_score, Some(score(mean)));
    }

    #[tokio::test]
    async fn test_render_without_slides_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path(), &[TITLE_SLIDE.to_string(), wordy_slide()]);

        let report = Aggregator::new(AnalysisConfig::default())
            .with_renderer(EmptyRenderer)
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.error_for(Analyzer::DesignQuality),
            Some("No slides rendered at http://127.0.0.1:8922/missing/index.html")
        );
        assert!(report.raw_results.design_quality.is_none());
        assert_eq!(report.summary.north_star_signals.design, None);
        assert!(report.summary.by_category.design_quality.is_none());
    }

    #[tokio::test]
    async fn test_design_timeout() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path(), &[TITLE_SLIDE.to_string()]);

        let mut config = AnalysisConfig::default();
        config.aggregator.timeout_secs = 0;
        let report = Aggregator::new(config)
            .with_renderer(SlowRenderer)
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(
            report.error_for(Analyzer::DesignQuality),
            Some("Timed out after 0s")
        );
    }

    #[tokio::test]
    async fn test_blocking_timeout_returns_before_job_finishes() {
        let started = std::time::Instant::now();
        let result = run_blocking(Duration::ZERO, || {
            std::thread::sleep(Duration::from_millis(300));
            1
        })
        .await;

        assert_eq!(result, Err("Timed out after 0s".to_string()));
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_file_target_skips_design() {
        let aggregator =
            Aggregator::new(AnalysisConfig::default()).with_render_target(RenderTarget::File);
        assert!(!aggregator.design_enabled());

        let served = Aggregator::new(AnalysisConfig::default()).with_render_target(RenderTarget::Serve);
        assert!(served.design_enabled());
    }

    #[tokio::test]
    async fn test_report_saved_as_full_analysis() {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path(), &[TITLE_SLIDE.to_string(), wordy_slide()]);

        let report = Aggregator::new(AnalysisConfig::default())
            .run(dir.path())
            .await
            .unwrap();
        let path = report.save(dir.path()).unwrap();
        assert!(path.ends_with("resources/materials/full-analysis.json"));

        let value: serde_json::Value = artifacts::read_json(&path).unwrap();
        assert!(value["rawResults"]["visual-density"].is_object());
        assert!(value["rawResults"]["image-analysis"].is_object());
        assert!(value["rawResults"].get("design-quality").is_none());
        assert!(value["summary"]["northStarSignals"]["design"].is_null());
        assert_eq!(
            value["summary"]["overall"]["flags"][0]["category"],
            "visual-density"
        );

        let restored: DeckAnalysisReport = artifacts::read_json(&path).unwrap();
        assert_eq!(restored.slide_count, 2);
    }

    #[tokio::test]
    async fn test_missing_deck() {
        let dir = tempfile::tempdir().unwrap();
        let err = Aggregator::new(AnalysisConfig::default())
            .run(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeckNotFound(_)));
    }
}
