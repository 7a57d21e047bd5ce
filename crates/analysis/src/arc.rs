//! Emotional arc: opening hook quality, tension and resolution across the
//! deck, and whether adjacent slides connect.

use crate::stats::round_to;
use keynote_core::{Deck, SlideRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Number of opening slides graded for their hook.
const HOOK_SLIDES: usize = 2;

/// Headlines shorter than this without terminal punctuation read as labels.
const LABEL_HEADLINE_CHARS: usize = 15;

/// Tokens longer than this count as concepts when tracking flow.
const CONCEPT_MIN_CHARS: usize = 4;

const MIN_CONCEPT_OVERLAP: f64 = 0.1;

static QUESTION_HOOK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(what if|why do|how can|have you|did you|do you|when was|where is|who|what|why|how|is it|are you|could|would|should)\b").unwrap()
});

static SURPRISE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(shocking|hidden|secret|surprising|unexpected|little-known|most people|nobody|everyone|actually|truth|myth|lie|mistake|wrong|forgotten|overlooked|untold|reveal|discover|uncover|behind|real reason)").unwrap()
});

static STATISTIC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+%|\d+x|\$[\d,]+|\d+ (million|billion|trillion)|[1-9]\d* (out of|in \d)|\d+/\d+)").unwrap()
});

// Numbers are left to the statistic indicator so a figure is not counted twice.
static SPECIFIC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(specific|exactly|precisely|case study|example|story of|meet|interview|real|actual|named|called)").unwrap()
});

static WEAK_OPENER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(about|overview|agenda|introduction|summary|today|presentation|welcome|thank|hello|my name|we will|let me|i want to)").unwrap()
});

static TERMINAL_PUNCTUATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]$").unwrap());

static TENSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(problem|issue|challenge|difficulty|obstacle|barrier|hurdle)",
        r"(risk|danger|threat|vulnerability|exposure|liability)",
        r"(cost|expense|waste|loss|drain|burden|price)",
        r"(fail|struggle|pain|suffer|fear|worry|concern|crisis|chaos|mess|broken|wrong|bad|worse|worst|trouble|error|mistake)",
        r"(urgent|critical|immediate|now|before it's too late|running out|deadline|emergency)",
        r"(competitor|competition|threat|disruption|obsolete|behind|losing|falling)",
    ])
});

static RESOLUTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(solution|answer|fix|resolve|solve|address|overcome)",
        r"(success|achieve|accomplish|win|gain|benefit|advantage|improve)",
        r"(transform|change|revolutionize|breakthrough|innovate|reimagine|reinvent)",
        r"(better|best|great|amazing|incredible|remarkable|powerful|effective|efficient|easy|simple|fast|quick)",
        r"(result|outcome|evidence|proof|data|metric|increase|decrease|improve|grow|save|reduce)",
        r"(future|tomorrow|next|vision|possibility|potential|opportunity|imagine)",
    ])
});

static STAKES_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(\$[\d,]+[KMB]?|\d+%|\d+ (million|billion|thousand))",
        r"(\d+ (years?|months?|weeks?|days?|hours?))",
        r"(\d+[KMB]?\+? (users?|customers?|companies|teams|people|employees))",
        r"(impact|affect|influence|change|save|lose|gain|grow|reduce|increase|decrease|cut|double|triple|10x|100x)",
    ])
});

static TRANSITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)therefore|so|because|thus|as a result|this means|which|building on|next|however|but|instead|alternatively").unwrap()
});

static PROBLEM_SLIDE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)problem|challenge|pain|cost|risk|threat|struggle|failing|broken").unwrap()
});

static SOLUTION_SLIDE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)solution|approach|how we|introducing|meet|our (platform|product|service)")
        .unwrap()
});

static PROOF_SLIDE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)case study|results|metrics|testimonial|evidence|\d+%|\d+x").unwrap()
});

static CTA_SLIDE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)next step|get started|contact|let's|ready to|call|schedule|demo").unwrap()
});

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
        .collect()
}

/// Hook quality, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookGrade {
    Weak,
    Informational,
    Interesting,
    Provocative,
}

impl HookGrade {
    fn from_indicator_count(count: usize) -> Self {
        match count {
            0 => HookGrade::Weak,
            1 => HookGrade::Informational,
            2 => HookGrade::Interesting,
            _ => HookGrade::Provocative,
        }
    }

    /// One step down; weak stays weak.
    fn downgrade(self) -> Self {
        match self {
            HookGrade::Provocative => HookGrade::Interesting,
            HookGrade::Interesting => HookGrade::Informational,
            HookGrade::Informational | HookGrade::Weak => HookGrade::Weak,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HookGrade::Weak => "weak",
            HookGrade::Informational => "informational",
            HookGrade::Interesting => "interesting",
            HookGrade::Provocative => "provocative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookType {
    Question,
    Statistic,
    Statement,
}

impl HookType {
    pub fn as_str(self) -> &'static str {
        match self {
            HookType::Question => "question",
            HookType::Statistic => "statistic",
            HookType::Statement => "statement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookAnalysis {
    pub slide_index: usize,
    pub title: String,
    pub headline: String,
    pub hook_type: HookType,
    pub indicators: Vec<String>,
    pub grade: HookGrade,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArcShape {
    TooShort,
    BuildsThenResolves,
    FrontLoaded,
    Flat,
    Chaotic,
    AllPositive,
    AllNegative,
    Mixed,
}

impl ArcShape {
    pub fn as_str(self) -> &'static str {
        match self {
            ArcShape::TooShort => "too-short",
            ArcShape::BuildsThenResolves => "builds-then-resolves",
            ArcShape::FrontLoaded => "front-loaded",
            ArcShape::Flat => "flat",
            ArcShape::Chaotic => "chaotic",
            ArcShape::AllPositive => "all-positive",
            ArcShape::AllNegative => "all-negative",
            ArcShape::Mixed => "mixed",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ArcShape::TooShort => "Not enough slides to analyze arc",
            ArcShape::BuildsThenResolves => {
                "Good arc: tension builds through middle, resolution comes at end"
            }
            ArcShape::FrontLoaded => "Tension established early, resolution builds through deck",
            ArcShape::Flat => "Warning: No emotional arc - deck feels monotone",
            ArcShape::Chaotic => "Warning: Emotional tone is inconsistent throughout",
            ArcShape::AllPositive => {
                "Warning: No tension established - may feel like a sales pitch"
            }
            ArcShape::AllNegative => "Warning: Lots of problems but no clear solution",
            ArcShape::Mixed => {
                "Mixed emotional arc - consider strengthening the tension-resolution flow"
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionTally {
    pub score: usize,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StakesTally {
    pub score: usize,
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideEmotion {
    pub slide_index: usize,
    pub title: String,
    pub tension: EmotionTally,
    pub resolution: EmotionTally,
    pub stakes: StakesTally,
}

/// Average tension and resolution over one third of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThirdAverages {
    pub tension: f64,
    pub resolution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcMetrics {
    pub first_third: ThirdAverages,
    pub middle_third: ThirdAverages,
    pub last_third: ThirdAverages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcClassification {
    pub shape: ArcShape,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ArcMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGap {
    pub from_slide: usize,
    pub to_slide: usize,
    pub from_title: String,
    pub to_title: String,
    pub issue: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeCounts {
    pub provocative: usize,
    pub interesting: usize,
    pub informational: usize,
    pub weak: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSection {
    pub primary_hook: Option<HookAnalysis>,
    pub opening_slides: Vec<HookAnalysis>,
    pub overall_grade: HookGrade,
    pub summary: GradeCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalArcSection {
    pub per_slide: Vec<SlideEmotion>,
    pub arc_shape: ArcClassification,
    pub total_tension: usize,
    pub total_resolution: usize,
    pub total_stakes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowChain {
    pub gaps: Vec<FlowGap>,
    pub gap_count: usize,
    pub assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcSummary {
    pub hook_quality: HookGrade,
    pub arc_shape: ArcShape,
    pub flow_gaps: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcReport {
    pub deck_path: String,
    pub slide_count: usize,
    pub hook_analysis: HookSection,
    pub emotional_arc: EmotionalArcSection,
    pub flow_chain: FlowChain,
    pub summary: ArcSummary,
}

/// Grade how well a slide works as an opener.
pub fn analyze_hook(slide: &SlideRecord) -> HookAnalysis {
    let text = slide.full_text().to_lowercase();
    let headline = slide.headline.to_lowercase();

    let mut hook_type = HookType::Statement;
    let mut indicators = Vec::new();

    if QUESTION_HOOK_REGEX.is_match(&headline) {
        hook_type = HookType::Question;
        indicators.push("question format".to_string());
    } else if STATISTIC_REGEX.is_match(&headline) {
        hook_type = HookType::Statistic;
        indicators.push("contains data".to_string());
    }

    if let Some(m) = SURPRISE_REGEX.find(&text) {
        indicators.push(format!("tension word: \"{}\"", m.as_str()));
    }
    if SPECIFIC_REGEX.is_match(&text) {
        indicators.push("specific/concrete".to_string());
    }
    if STATISTIC_REGEX.is_match(&text) {
        indicators.push("contains statistics".to_string());
    }

    let mut reasons = Vec::new();
    let mut grade = if WEAK_OPENER_REGEX.is_match(&headline) {
        reasons.push("generic opening pattern".to_string());
        HookGrade::Weak
    } else {
        let grade = HookGrade::from_indicator_count(indicators.len());
        reasons.push(
            match grade {
                HookGrade::Provocative => "multiple engagement elements",
                HookGrade::Interesting => "good engagement elements",
                HookGrade::Informational => "basic engagement",
                HookGrade::Weak => "missing engagement elements",
            }
            .to_string(),
        );
        grade
    };

    if headline.chars().count() < LABEL_HEADLINE_CHARS && !TERMINAL_PUNCTUATION_REGEX.is_match(&headline)
    {
        reasons.push("headline is a label, not a message".to_string());
        grade = grade.downgrade();
    }

    HookAnalysis {
        slide_index: slide.index,
        title: slide.title.clone(),
        headline: slide.headline.clone(),
        hook_type,
        indicators,
        grade,
        reasons,
    }
}

fn tally(patterns: &[Regex], text: &str) -> EmotionTally {
    let mut score = 0;
    let mut words: Vec<String> = Vec::new();
    for pattern in patterns {
        for m in pattern.find_iter(text) {
            score += 1;
            let word = m.as_str().to_lowercase();
            if !words.contains(&word) {
                words.push(word);
            }
        }
    }
    EmotionTally { score, words }
}

/// Count tension, resolution and stakes language on one slide.
pub fn analyze_emotion(slide: &SlideRecord) -> SlideEmotion {
    let text = slide.full_text();

    let mut stakes = StakesTally::default();
    for pattern in STAKES_PATTERNS.iter() {
        for m in pattern.find_iter(&text) {
            stakes.score += 1;
            let indicator = m.as_str().to_string();
            if !stakes.indicators.contains(&indicator) {
                stakes.indicators.push(indicator);
            }
        }
    }

    SlideEmotion {
        slide_index: slide.index,
        title: slide.title.clone(),
        tension: tally(&TENSION_PATTERNS, &text),
        resolution: tally(&RESOLUTION_PATTERNS, &text),
        stakes,
    }
}

fn averages(slides: &[SlideEmotion]) -> ThirdAverages {
    if slides.is_empty() {
        return ThirdAverages {
            tension: 0.0,
            resolution: 0.0,
        };
    }
    let count = slides.len() as f64;
    ThirdAverages {
        tension: slides.iter().map(|s| s.tension.score as f64).sum::<f64>() / count,
        resolution: slides.iter().map(|s| s.resolution.score as f64).sum::<f64>() / count,
    }
}

fn rounded(averages: ThirdAverages) -> ThirdAverages {
    ThirdAverages {
        tension: round_to(averages.tension, 1),
        resolution: round_to(averages.resolution, 1),
    }
}

/// Classify the deck's emotional shape from per-slide tallies.
///
/// Conditions are checked in a fixed order and the first match wins.
pub fn classify_arc(slides: &[SlideEmotion]) -> ArcClassification {
    let n = slides.len();
    if n < 3 {
        return ArcClassification {
            shape: ArcShape::TooShort,
            description: ArcShape::TooShort.description().to_string(),
            metrics: None,
        };
    }

    let first_end = n.div_ceil(3);
    let middle_end = (2 * n).div_ceil(3);
    let first = averages(&slides[..first_end]);
    let middle = averages(&slides[first_end..middle_end]);
    let last = averages(&slides[middle_end..]);
    let deck = averages(slides);

    let shape = if middle.tension > first.tension && last.resolution > middle.resolution {
        ArcShape::BuildsThenResolves
    } else if first.tension > middle.tension && middle.resolution > first.resolution {
        ArcShape::FrontLoaded
    } else if (first.tension - last.tension).abs() < 1.0
        && (first.resolution - last.resolution).abs() < 1.0
    {
        ArcShape::Flat
    } else if (middle.tension - first.tension).abs() > 2.0
        && (last.tension - middle.tension).abs() > 2.0
    {
        ArcShape::Chaotic
    } else if deck.tension < 1.0 && deck.resolution > 2.0 {
        ArcShape::AllPositive
    } else if deck.tension > 2.0 && deck.resolution < 1.0 {
        ArcShape::AllNegative
    } else {
        ArcShape::Mixed
    };

    ArcClassification {
        shape,
        description: shape.description().to_string(),
        metrics: Some(ArcMetrics {
            first_third: rounded(first),
            middle_third: rounded(middle),
            last_third: rounded(last),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlideRole {
    Problem,
    Solution,
    Proof,
    Cta,
    Content,
}

fn classify_role(slide: &SlideRecord) -> SlideRole {
    let text = slide.full_text().to_lowercase();
    if PROBLEM_SLIDE_REGEX.is_match(&text) {
        SlideRole::Problem
    } else if SOLUTION_SLIDE_REGEX.is_match(&text) {
        SlideRole::Solution
    } else if PROOF_SLIDE_REGEX.is_match(&text) {
        SlideRole::Proof
    } else if CTA_SLIDE_REGEX.is_match(&text) {
        SlideRole::Cta
    } else {
        SlideRole::Content
    }
}

fn concepts(slide: &SlideRecord) -> HashSet<String> {
    slide
        .full_text()
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > CONCEPT_MIN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Find adjacent slides that do not connect.
pub fn find_flow_gaps(slides: &[SlideRecord]) -> Vec<FlowGap> {
    let mut gaps = Vec::new();

    for pair in slides.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let gap = |issue: &str, suggestion: String| FlowGap {
            from_slide: prev.index,
            to_slide: curr.index,
            from_title: prev.title.clone(),
            to_title: curr.title.clone(),
            issue: issue.to_string(),
            suggestion,
        };

        let prev_concepts = concepts(prev);
        let curr_concepts = concepts(curr);
        let shared = prev_concepts.intersection(&curr_concepts).count();
        let overlap = shared as f64 / prev_concepts.len().min(curr_concepts.len()).max(1) as f64;

        if overlap < MIN_CONCEPT_OVERLAP && !TRANSITION_REGEX.is_match(&curr.content) {
            gaps.push(gap(
                "No conceptual bridge between slides",
                format!(
                    "Consider adding a transition from \"{}\" to \"{}\"",
                    prev.title, curr.title
                ),
            ));
        }

        let next_role = classify_role(curr);
        if classify_role(prev) == SlideRole::Problem
            && next_role != SlideRole::Solution
            && next_role != SlideRole::Problem
        {
            gaps.push(gap(
                "Problem slide not followed by solution or deeper problem exploration",
                "After establishing a problem, immediately address it or deepen it".to_string(),
            ));
        }
    }

    gaps
}

fn flow_assessment(gap_count: usize) -> &'static str {
    match gap_count {
        0 => "Good flow",
        1..=2 => "Minor flow issues",
        _ => "Significant flow problems",
    }
}

/// Analyze the hook, arc shape and flow of a deck.
pub fn analyze_deck(deck: &Deck) -> ArcReport {
    let opening: Vec<HookAnalysis> = deck.slides.iter().take(HOOK_SLIDES).map(analyze_hook).collect();
    let overall_grade = opening
        .iter()
        .map(|h| h.grade)
        .max()
        .unwrap_or(HookGrade::Weak);

    let mut grade_counts = GradeCounts::default();
    for hook in &opening {
        match hook.grade {
            HookGrade::Provocative => grade_counts.provocative += 1,
            HookGrade::Interesting => grade_counts.interesting += 1,
            HookGrade::Informational => grade_counts.informational += 1,
            HookGrade::Weak => grade_counts.weak += 1,
        }
    }

    let per_slide: Vec<SlideEmotion> = deck.slides.iter().map(analyze_emotion).collect();
    let arc_shape = classify_arc(&per_slide);
    let total_tension = per_slide.iter().map(|s| s.tension.score).sum();
    let total_resolution = per_slide.iter().map(|s| s.resolution.score).sum();
    let total_stakes: usize = per_slide.iter().map(|s| s.stakes.score).sum();

    let gaps = find_flow_gaps(&deck.slides);

    let mut recommendations = Vec::new();
    if overall_grade <= HookGrade::Informational {
        recommendations
            .push("Strengthen opening hook with question, statistic, or tension element".to_string());
    }
    match arc_shape.shape {
        ArcShape::Flat => recommendations.push(
            "Add emotional dynamics - establish tension before offering resolution".to_string(),
        ),
        ArcShape::AllPositive => recommendations
            .push("Establish the problem/stakes before presenting solutions".to_string()),
        ArcShape::AllNegative => recommendations
            .push("Add resolution elements - show how problems get solved".to_string()),
        _ => {}
    }
    if !gaps.is_empty() {
        recommendations.push(format!(
            "Fix {} slide transition(s) that lack logical connection",
            gaps.len()
        ));
    }
    if (total_stakes as f64) < deck.slide_count() as f64 / 2.0 {
        recommendations.push("Add more stakes indicators (numbers, impact, consequences)".to_string());
    }

    log::debug!(
        "Emotional arc: hook {}, shape {}, {} flow gaps",
        overall_grade.as_str(),
        arc_shape.shape.as_str(),
        gaps.len()
    );

    let shape = arc_shape.shape;
    let gap_count = gaps.len();

    ArcReport {
        deck_path: deck.deck_path.clone(),
        slide_count: deck.slide_count(),
        hook_analysis: HookSection {
            primary_hook: opening.first().cloned(),
            opening_slides: opening,
            overall_grade,
            summary: grade_counts,
        },
        emotional_arc: EmotionalArcSection {
            per_slide,
            arc_shape,
            total_tension,
            total_resolution,
            total_stakes,
        },
        flow_chain: FlowChain {
            gaps,
            gap_count,
            assessment: flow_assessment(gap_count).to_string(),
        },
        summary: ArcSummary {
            hook_quality: overall_grade,
            arc_shape: shape,
            flow_gaps: gap_count,
            recommendations,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keynote_core::{Layout, Theme};

    fn slide(index: usize, headline: &str, content: &str) -> SlideRecord {
        SlideRecord {
            index,
            title: headline.to_string(),
            headline: headline.to_string(),
            content: content.to_string(),
            raw_markup: String::new(),
            layout: Layout::Content,
            theme: Theme::Ivory,
        }
    }

    fn emotion(index: usize, tension: usize, resolution: usize) -> SlideEmotion {
        SlideEmotion {
            slide_index: index,
            title: format!("Slide {}", index),
            tension: EmotionTally {
                score: tension,
                words: Vec::new(),
            },
            resolution: EmotionTally {
                score: resolution,
                words: Vec::new(),
            },
            stakes: StakesTally::default(),
        }
    }

    #[test]
    fn test_question_with_figure_is_interesting() {
        let hook = analyze_hook(&slide(1, "What if pricing could be 10x simpler?", ""));
        assert_eq!(hook.hook_type, HookType::Question);
        assert_eq!(hook.indicators, vec!["question format", "contains statistics"]);
        assert_eq!(hook.grade, HookGrade::Interesting);
    }

    #[test]
    fn test_generic_opener_is_weak() {
        let hook = analyze_hook(&slide(1, "Agenda for the quarterly review", "Hidden costs, 40% growth"));
        assert_eq!(hook.grade, HookGrade::Weak);
        assert_eq!(hook.reasons[0], "generic opening pattern");
    }

    #[test]
    fn test_label_headline_downgrades() {
        let hook = analyze_hook(&slide(1, "Revenue", "The hidden truth: 40% churn"));
        assert!(hook.reasons.contains(&"headline is a label, not a message".to_string()));
        // surprise word and statistics give interesting, the label drops it a step
        assert_eq!(hook.grade, HookGrade::Informational);
    }

    #[test]
    fn test_increasing_tension_with_flat_resolution() {
        let slides = vec![emotion(1, 0, 1), emotion(2, 1, 1), emotion(3, 2, 1)];
        let arc = classify_arc(&slides);
        assert_ne!(arc.shape, ArcShape::BuildsThenResolves);
        assert_eq!(arc.shape, ArcShape::Mixed);
    }

    #[test]
    fn test_builds_then_resolves() {
        let slides = vec![emotion(1, 0, 0), emotion(2, 3, 0), emotion(3, 1, 2)];
        assert_eq!(classify_arc(&slides).shape, ArcShape::BuildsThenResolves);
    }

    #[test]
    fn test_short_and_flat_arcs() {
        assert_eq!(classify_arc(&[emotion(1, 5, 0)]).shape, ArcShape::TooShort);

        let flat = vec![emotion(1, 1, 1), emotion(2, 1, 1), emotion(3, 1, 1), emotion(4, 1, 1)];
        let arc = classify_arc(&flat);
        assert_eq!(arc.shape, ArcShape::Flat);
        assert_eq!(arc.metrics.unwrap().first_third.tension, 1.0);
    }

    #[test]
    fn test_thirds_use_ceiling_splits() {
        // n = 4 splits into [0,2) [2,3) [3,4)
        let slides = vec![emotion(1, 0, 0), emotion(2, 0, 0), emotion(3, 4, 0), emotion(4, 0, 3)];
        let arc = classify_arc(&slides);
        let metrics = arc.metrics.unwrap();
        assert_eq!(metrics.middle_third.tension, 4.0);
        assert_eq!(metrics.last_third.resolution, 3.0);
        assert_eq!(arc.shape, ArcShape::BuildsThenResolves);
    }

    #[test]
    fn test_emotion_words_deduplicated() {
        let result = analyze_emotion(&slide(1, "Risk", "The risk is a real risk. We solve it. $2M saved."));
        assert_eq!(result.tension.score, 3);
        assert_eq!(result.tension.words, vec!["risk"]);
        assert!(result.resolution.words.contains(&"solve".to_string()));
        assert!(result.stakes.indicators.contains(&"$2M".to_string()));
    }

    #[test]
    fn test_flow_gap_without_shared_concepts() {
        let slides = vec![
            slide(1, "Warehouses", "Inventory piles up across regional warehouses"),
            slide(2, "Hiring", "Engineering recruiting pipeline"),
        ];
        let gaps = find_flow_gaps(&slides);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].issue, "No conceptual bridge between slides");
        assert_eq!(gaps[0].from_slide, 1);
        assert_eq!(gaps[0].to_slide, 2);
    }

    #[test]
    fn test_problem_followed_by_content_is_gap() {
        let slides = vec![
            slide(1, "Churn", "Customers leave because onboarding is broken"),
            slide(2, "Churn timeline", "Customers leave within weeks because onboarding lags"),
        ];
        let gaps = find_flow_gaps(&slides);
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].issue.starts_with("Problem slide"));
    }

    #[test]
    fn test_deck_report() {
        let mut deck = Deck::new("decks/demo");
        deck.add_slide(slide(1, "What if pricing could be 10x simpler?", ""));
        deck.add_slide(slide(2, "Welcome", ""));

        let report = analyze_deck(&deck);
        assert_eq!(report.hook_analysis.overall_grade, HookGrade::Interesting);
        assert_eq!(report.hook_analysis.summary.interesting, 1);
        assert_eq!(report.hook_analysis.summary.weak, 1);
        assert_eq!(report.summary.arc_shape, ArcShape::TooShort);
        assert_eq!(report.flow_chain.assessment, "Minor flow issues");
        // "10x" is the only stakes indicator, exactly half the slide count
        assert_eq!(report.emotional_arc.total_stakes, 1);
        assert_eq!(
            report.summary.recommendations,
            vec!["Fix 1 slide transition(s) that lack logical connection"]
        );
    }
}
