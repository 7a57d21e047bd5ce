//! Prepares a model-mediated deck review: interview context, automated
//! analysis, and the packaged agent prompts.

use crate::aggregate::{
    Aggregator, AnalysisFlag, AnalyzerError, DeckAnalysisReport, DesignQualityDigest,
    EmotionalArcDigest, ImageAnalysisDigest, NorthStarSignals, ReadabilityDigest,
    VisualDensityDigest,
};
use crate::artifacts;
use crate::interview::{self, InterviewContext, Interviewer};
use crate::prompts::{self, PromptInputs, NO_BRAND_PROFILE};
use crate::workrun::WorkRun;
use chrono::Utc;
use keynote_analysis::arc::{FlowGap, SlideEmotion};
use keynote_analysis::density::SlideDensity;
use keynote_analysis::readability::{JargonTerm, SlideComplexSentence};
use keynote_analysis::{ArcShape, HookGrade};
use keynote_core::{AnalysisConfig, FlagKind, Result};
use keynote_render::RenderTarget;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Analysis findings reshaped for the review agents; persisted as
/// `analysis-summary.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisDigest {
    pub north_star_signals: NorthStarSignals,
    pub overall_grade: Option<String>,
    pub overall_score: Option<u32>,
    pub analysis_flags: Vec<AnalysisFlag>,
    pub visual_density: Option<VisualDensityDigest>,
    pub slides_without_visuals: Vec<usize>,
    pub image_analysis: Option<ImageAnalysisDigest>,
    pub images_missing_alt: Vec<usize>,
    pub emotional_arc: Option<EmotionalArcDigest>,
    pub hook_grade: Option<HookGrade>,
    pub arc_shape: Option<ArcShape>,
    pub flow_gaps: Vec<FlowGap>,
    pub readability: Option<ReadabilityDigest>,
    pub complex_sentences: Vec<SlideComplexSentence>,
    pub jargon_found: Vec<JargonTerm>,
    pub design_quality: Option<DesignQualityDigest>,
    pub per_slide_visual_density: Vec<SlideDensity>,
    pub per_slide_emotional: Vec<SlideEmotion>,
    pub errors: Vec<AnalyzerError>,
}

impl AnalysisDigest {
    pub fn from_report(report: &DeckAnalysisReport) -> Self {
        let summary = &report.summary;
        let raw = &report.raw_results;
        let mut digest = Self {
            north_star_signals: summary.north_star_signals.clone(),
            overall_grade: summary.overall.heuristic_grade.clone(),
            overall_score: summary.overall.heuristic_score,
            analysis_flags: summary.overall.flags.clone(),
            visual_density: summary.by_category.visual_density.clone(),
            image_analysis: summary.by_category.image_analysis.clone(),
            emotional_arc: summary.by_category.emotional_arc.clone(),
            readability: summary.by_category.readability.clone(),
            design_quality: summary.by_category.design_quality.clone(),
            errors: report.errors.clone(),
            ..Self::default()
        };

        if let Some(vd) = &raw.visual_density {
            digest.slides_without_visuals =
                vd.flag_summary.slides_with(FlagKind::NoVisualsOnContentSlide);
            digest.per_slide_visual_density = vd.slides.clone();
        }
        if let Some(ia) = &raw.image_analysis {
            digest.images_missing_alt = ia.slides_missing_alt();
        }
        if let Some(ea) = &raw.emotional_arc {
            digest.hook_grade = Some(ea.hook_analysis.overall_grade);
            digest.arc_shape = Some(ea.emotional_arc.arc_shape.shape);
            digest.flow_gaps = ea.flow_chain.gaps.clone();
            digest.per_slide_emotional = ea.emotional_arc.per_slide.clone();
        }
        if let Some(rd) = &raw.readability {
            digest.complex_sentences = rd.complex_sentences.clone();
            digest.jargon_found = rd.slides.iter().flat_map(|s| s.jargon.clone()).collect();
        }

        digest
    }
}

#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// Reuse `review-context.json` instead of interviewing.
    pub skip_interview: bool,
    pub skip_analysis: bool,
    pub render_target: RenderTarget,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            skip_interview: false,
            skip_analysis: false,
            render_target: RenderTarget::File,
        }
    }
}

/// Paths and findings from a prepared review.
#[derive(Debug)]
pub struct ReviewOutcome {
    pub slide_count: usize,
    pub context_path: PathBuf,
    pub context_reused: bool,
    pub analysis: Option<DeckAnalysisReport>,
    pub analysis_path: Option<PathBuf>,
    pub digest: AnalysisDigest,
    pub prompts_path: PathBuf,
    pub summary_path: PathBuf,
    pub work_run_path: PathBuf,
}

/// Brand profile text from `brands.js` next to the deck directory.
pub fn load_brand_profile(deck_dir: &Path) -> String {
    let brands = deck_dir
        .parent()
        .map(|parent| parent.join("brands.js"))
        .unwrap_or_else(|| PathBuf::from("brands.js"));
    match std::fs::read_to_string(&brands) {
        Ok(text) => text,
        Err(_) => NO_BRAND_PROFILE.to_string(),
    }
}

/// Run the whole review preparation for one deck.
pub async fn prepare_review<R: BufRead, W: Write>(
    deck_dir: &Path,
    config: &AnalysisConfig,
    options: &ReviewOptions,
    interviewer: &mut Interviewer<R, W>,
) -> Result<ReviewOutcome> {
    let deck = keynote_html::load_deck(deck_dir)?;

    let (context, context_reused) = if options.skip_interview {
        (interview::require_context(deck_dir)?, true)
    } else {
        let context = interviewer.conduct(deck_dir)?;
        (context, false)
    };
    let context_path = if context_reused {
        interview::context_path(deck_dir)
    } else {
        interview::save_context(deck_dir, &context)?
    };

    let (analysis, analysis_path) = if options.skip_analysis {
        (None, None)
    } else {
        let report = Aggregator::new(config.clone())
            .with_render_target(options.render_target.clone())
            .analyze(deck.clone(), deck_dir)
            .await;
        let path = report.save(deck_dir)?;
        (Some(report), Some(path))
    };
    let digest = analysis
        .as_ref()
        .map(AnalysisDigest::from_report)
        .unwrap_or_default();

    let brand_profile = load_brand_profile(deck_dir);
    let prompts = prompts::package(&PromptInputs {
        context: &context,
        deck: &deck,
        brand_profile: &brand_profile,
        analysis: analysis.as_ref().map(|_| &digest),
    })?;

    let prompts_path = artifacts::material(deck_dir, artifacts::REVIEW_PROMPTS);
    artifacts::write_json(&prompts_path, &prompts)?;
    let summary_path = artifacts::material(deck_dir, artifacts::ANALYSIS_SUMMARY);
    artifacts::write_json(&summary_path, &digest)?;

    let mut run = WorkRun::prepared("deck-review", deck_dir, Utc::now())
        .with_input("contextPath", &context_path)
        .with_input("promptsPath", &prompts_path)
        .with_input("analysisSummaryPath", &summary_path);
    if let Some(path) = &analysis_path {
        run = run.with_input("fullAnalysisPath", path);
    }
    let work_run_path = run.save(deck_dir)?;

    log::debug!(
        "Prepared review of {} slides with {} prompts",
        deck.slide_count(),
        prompts.len()
    );

    Ok(ReviewOutcome {
        slide_count: deck.slide_count(),
        context_path,
        context_reused,
        analysis,
        analysis_path,
        digest,
        prompts_path,
        summary_path,
        work_run_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keynote_core::Error;
    use serde_json::Value;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    const DECK: &str = r#"<main>
<section class="slide theme-ink" data-title="Opening">
  <div class="slide-inner layout-title">
    <h1 class="title">What if every launch shipped on time?</h1>
  </div>
</section>
<section class="slide" data-title="Cost">
  <div class="slide-inner layout-split">
    <h2 class="section-title">Late launches cost us 3 customers last year</h2>
    <p class="body-text">Each slipped launch delayed revenue and strained the support team.</p>
  </div>
</section>
</main>"#;

    const ANSWERS: &str =
        "product leads\npredictability\nadopt the checklist\nteam meeting\n10 minutes\nimportant decision\n\n\n\n\n";

    fn deck_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("launch");
        std::fs::create_dir_all(&deck).unwrap();
        std::fs::write(deck.join("index.html"), DECK).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_prepare_review_writes_artifacts() {
        let root = deck_dir();
        let deck = root.path().join("launch");
        let mut interviewer = Interviewer::new(Cursor::new(ANSWERS), Vec::new());

        let outcome = prepare_review(
            &deck,
            &AnalysisConfig::default(),
            &ReviewOptions::default(),
            &mut interviewer,
        )
        .await
        .unwrap();

        assert_eq!(outcome.slide_count, 2);
        assert!(!outcome.context_reused);
        assert!(outcome.context_path.exists());
        assert!(outcome.analysis_path.as_ref().unwrap().exists());
        assert!(outcome.work_run_path.exists());

        let prompts: BTreeMap<String, String> = artifacts::read_json(&outcome.prompts_path).unwrap();
        assert_eq!(prompts.len(), 10);
        assert!(prompts["expertPerspective"].contains("AUDIENCE: product leads"));
        assert!(prompts["brandGuardian"].contains(NO_BRAND_PROFILE));

        let summary: Value = artifacts::read_json(&outcome.summary_path).unwrap();
        assert!(summary["analysisFlags"].is_array());
        assert!(summary["northStarSignals"]["storytelling"].is_number());
        assert_eq!(summary["imageAnalysis"]["totalImages"], 0);

        let run: WorkRun = artifacts::read_json(&outcome.work_run_path).unwrap();
        assert_eq!(run.kind, "deck-review");
        assert!(run.inputs.contains_key("promptsPath"));
    }

    #[tokio::test]
    async fn test_skip_interview_requires_context() {
        let root = deck_dir();
        let deck = root.path().join("launch");
        let options = ReviewOptions {
            skip_interview: true,
            skip_analysis: true,
            ..ReviewOptions::default()
        };
        let mut interviewer = Interviewer::new(Cursor::new(""), Vec::new());

        let err = prepare_review(&deck, &AnalysisConfig::default(), &options, &mut interviewer)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingContext(_)));
    }

    #[tokio::test]
    async fn test_skip_interview_reuses_context() {
        let root = deck_dir();
        let deck = root.path().join("launch");
        let mut context = InterviewContext::new(&deck);
        context.set("audience", "support leads".to_string());
        interview::save_context(&deck, &context).unwrap();
        std::fs::write(root.path().join("brands.js"), "window.KEYNOTE_BRANDS = {};").unwrap();

        let options = ReviewOptions {
            skip_interview: true,
            skip_analysis: true,
            ..ReviewOptions::default()
        };
        let mut interviewer = Interviewer::new(Cursor::new(""), Vec::new());
        let outcome = prepare_review(&deck, &AnalysisConfig::default(), &options, &mut interviewer)
            .await
            .unwrap();

        assert!(outcome.context_reused);
        assert!(outcome.analysis.is_none());
        assert!(outcome.digest.analysis_flags.is_empty());

        let prompts: BTreeMap<String, String> = artifacts::read_json(&outcome.prompts_path).unwrap();
        assert!(prompts["brandGuardian"].contains("window.KEYNOTE_BRANDS"));
        assert!(prompts["claritySceptic"].contains("support leads"));

        let summary: Value = artifacts::read_json(&outcome.summary_path).unwrap();
        assert_eq!(summary["analysisFlags"], Value::Array(Vec::new()));
    }
}
