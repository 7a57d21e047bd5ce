//! Narrative review: slide roles, storytelling anti-patterns, redundancy,
//! and topic jumps.

use crate::stats::round_half_up;
use keynote_core::{Deck, SlideRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

const WALL_OF_TEXT_CHARS: usize = 500;
const MAX_BULLET_LINES: usize = 5;
const LABEL_HEADLINE_CHARS: usize = 20;
const REDUNDANCY_THRESHOLD: f64 = 0.5;
const TOPIC_JUMP_THRESHOLD: f64 = 0.1;
/// Decks longer than this are expected to carry a proof slide.
const PROOF_EXPECTED_SLIDES: usize = 5;
/// Decks longer than this are expected to close with a call to action.
const CTA_EXPECTED_SLIDES: usize = 3;

static HOOK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(what if|imagine|the (biggest|#1|top)|did you know|why|how)").unwrap()
});

static PROBLEM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(problem|challenge|pain|cost|risk|threat|struggle|failing|broken)").unwrap()
});

static SOLUTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(solution|approach|how we|introducing|meet|our (platform|product|service))")
        .unwrap()
});

static PROOF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(case study|results|metrics|testimonial|evidence|\d+%|\d+x)").unwrap()
});

static CTA_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(next step|get started|contact|let's|ready to|call|schedule|demo)").unwrap()
});

static QUOTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["\u{201C}].*["\u{201D}]$"#).unwrap());

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^.!?]+$").unwrap());

static BULLET_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[-•*]").unwrap());

static WEAK_HEADLINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(about|overview|agenda|introduction|summary)$").unwrap());

static JARGON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)synerg|leverage|paradigm|holistic|scalable|robust|seamless").unwrap()
});

static LABEL_SHAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+ ?[A-Z]?[a-z]*$").unwrap());

static VERB_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(is|are|will|can|do|get|make)\b").unwrap());

/// Storytelling role of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeRole {
    Hook,
    Problem,
    Solution,
    Proof,
    Cta,
    Quote,
    Title,
    Content,
}

impl NarrativeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            NarrativeRole::Hook => "hook",
            NarrativeRole::Problem => "problem",
            NarrativeRole::Solution => "solution",
            NarrativeRole::Proof => "proof",
            NarrativeRole::Cta => "cta",
            NarrativeRole::Quote => "quote",
            NarrativeRole::Title => "title",
            NarrativeRole::Content => "content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    WallOfText,
    TooManyBullets,
    WeakHeadline,
    Jargon,
    LabelHeadline,
}

impl IssueKind {
    /// Whether the issue concerns the headline rather than the body.
    pub fn is_headline(self) -> bool {
        matches!(self, IssueKind::WeakHeadline | IssueKind::LabelHeadline)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideIssue {
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcEntry {
    pub index: usize,
    pub title: String,
    #[serde(rename = "type")]
    pub role: NarrativeRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redundancy {
    pub slides: [usize; 2],
    pub titles: [String; 2],
    /// Percent of shared vocabulary.
    pub similarity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideNarrative {
    pub index: usize,
    pub title: String,
    pub headline: String,
    #[serde(rename = "type")]
    pub role: NarrativeRole,
    pub content_length: usize,
    pub issues: Vec<SlideIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeSummary {
    pub total_issues: usize,
    pub slides_with_issues: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeReport {
    pub deck_path: String,
    pub slide_count: usize,
    pub narrative_arc: Vec<ArcEntry>,
    pub narrative_issues: Vec<String>,
    pub flow_issues: Vec<String>,
    pub redundancies: Vec<Redundancy>,
    pub slides: Vec<SlideNarrative>,
    pub summary: NarrativeSummary,
}

impl NarrativeReport {
    /// Headline issues across all slides, with the slide they belong to.
    pub fn headline_issues(&self) -> impl Iterator<Item = (&SlideNarrative, &SlideIssue)> {
        self.slides.iter().flat_map(|slide| {
            slide
                .issues
                .iter()
                .filter(|issue| issue.kind.is_headline())
                .map(move |issue| (slide, issue))
        })
    }
}

/// Classify a slide's role; the first matching pattern wins.
pub fn classify_slide(slide: &SlideRecord) -> NarrativeRole {
    let text = slide.full_text().to_lowercase();

    let table: [(&Regex, NarrativeRole); 7] = [
        (&*HOOK_REGEX, NarrativeRole::Hook),
        (&*PROBLEM_REGEX, NarrativeRole::Problem),
        (&*SOLUTION_REGEX, NarrativeRole::Solution),
        (&*PROOF_REGEX, NarrativeRole::Proof),
        (&*CTA_REGEX, NarrativeRole::Cta),
        (&*QUOTE_REGEX, NarrativeRole::Quote),
        (&*TITLE_REGEX, NarrativeRole::Title),
    ];

    table
        .iter()
        .find(|(regex, _)| regex.is_match(&text))
        .map(|(_, role)| *role)
        .unwrap_or(NarrativeRole::Content)
}

/// Whether a headline is a bare label such as "Revenue" or "Market Size".
pub fn is_label_headline(headline: &str) -> bool {
    headline.chars().count() < LABEL_HEADLINE_CHARS
        && LABEL_SHAPE_REGEX.is_match(headline)
        && !VERB_REGEX.is_match(headline)
}

pub fn detect_anti_patterns(slide: &SlideRecord) -> Vec<SlideIssue> {
    let mut issues = Vec::new();
    let mut push = |kind, message: String| issues.push(SlideIssue { kind, message });

    if slide.content.chars().count() > WALL_OF_TEXT_CHARS {
        push(
            IssueKind::WallOfText,
            "Wall of text - too much content for one slide".to_string(),
        );
    }
    if BULLET_LINE_REGEX.find_iter(&slide.content).count() > MAX_BULLET_LINES {
        push(
            IssueKind::TooManyBullets,
            "Too many bullets - consider splitting into multiple slides".to_string(),
        );
    }
    if WEAK_HEADLINE_REGEX.is_match(&slide.headline) {
        push(
            IssueKind::WeakHeadline,
            format!("Weak headline \"{}\" - use a complete thought instead", slide.headline),
        );
    }
    if JARGON_REGEX.is_match(&slide.content) {
        push(
            IssueKind::Jargon,
            "Contains jargon - consider simpler language".to_string(),
        );
    }
    if is_label_headline(&slide.headline) {
        push(
            IssueKind::LabelHeadline,
            format!("Consider expanding \"{}\" to a complete thought", slide.headline),
        );
    }

    issues
}

fn vocabulary(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the words longer than three characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    let words_a = vocabulary(a);
    let words_b = vocabulary(b);
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

fn find_redundancy(slides: &[SlideRecord]) -> Vec<Redundancy> {
    let mut redundancies = Vec::new();
    for (i, a) in slides.iter().enumerate() {
        for b in &slides[i + 1..] {
            let sim = similarity(&a.content, &b.content);
            if sim > REDUNDANCY_THRESHOLD {
                redundancies.push(Redundancy {
                    slides: [a.index, b.index],
                    titles: [a.title.clone(), b.title.clone()],
                    similarity: round_half_up(sim * 100.0) as u32,
                });
            }
        }
    }
    redundancies
}

fn arc_issues(roles: &[NarrativeRole]) -> Vec<String> {
    let mut issues = Vec::new();
    let n = roles.len();

    let opening = &roles[..n.min(2)];
    if !opening.contains(&NarrativeRole::Hook) && !opening.contains(&NarrativeRole::Quote) {
        issues.push("Consider adding a hook or provocative opening in first 2 slides".to_string());
    }

    let problem = roles.iter().position(|r| *r == NarrativeRole::Problem);
    let solution = roles.iter().position(|r| *r == NarrativeRole::Solution);
    match (problem, solution) {
        (None, Some(_)) => {
            issues.push("Solution presented without establishing the problem first".to_string())
        }
        (Some(p), Some(s)) if p > s => {
            issues.push("Problem comes after solution - consider reordering".to_string())
        }
        _ => {}
    }

    if n > PROOF_EXPECTED_SLIDES && !roles.contains(&NarrativeRole::Proof) {
        issues.push("No proof/evidence slides detected - add metrics or case studies".to_string());
    }
    if n > CTA_EXPECTED_SLIDES && !roles[n - 2..].contains(&NarrativeRole::Cta) {
        issues.push("No clear call-to-action in final slides".to_string());
    }

    issues
}

fn flow_issues(slides: &[SlideRecord], roles: &[NarrativeRole]) -> Vec<String> {
    let n = slides.len();
    let mut issues = Vec::new();

    // The last pair and pairs close to the end are exempt.
    for i in 1..n {
        if i >= n - 1 || n - i <= 2 {
            continue;
        }
        let (prev, curr) = (&slides[i - 1], &slides[i]);
        if similarity(&prev.content, &curr.content) < TOPIC_JUMP_THRESHOLD
            && roles[i - 1] != roles[i]
        {
            issues.push(format!(
                "Potential topic jump between slide {} (\"{}\") and {} (\"{}\")",
                prev.index, prev.title, curr.index, curr.title
            ));
        }
    }

    issues
}

/// Review the storytelling structure of a deck.
pub fn analyze_deck(deck: &Deck) -> NarrativeReport {
    let roles: Vec<NarrativeRole> = deck.slides.iter().map(classify_slide).collect();

    let narrative_arc = deck
        .slides
        .iter()
        .zip(&roles)
        .map(|(slide, role)| ArcEntry {
            index: slide.index,
            title: slide.title.clone(),
            role: *role,
        })
        .collect();

    let slides: Vec<SlideNarrative> = deck
        .slides
        .iter()
        .zip(&roles)
        .map(|(slide, role)| SlideNarrative {
            index: slide.index,
            title: slide.title.clone(),
            headline: slide.headline.clone(),
            role: *role,
            content_length: slide.content.chars().count(),
            issues: detect_anti_patterns(slide),
        })
        .collect();

    let narrative_issues = arc_issues(&roles);
    let flow_issues = flow_issues(&deck.slides, &roles);
    let redundancies = find_redundancy(&deck.slides);

    let slide_issue_count: usize = slides.iter().map(|s| s.issues.len()).sum();
    let summary = NarrativeSummary {
        total_issues: narrative_issues.len()
            + flow_issues.len()
            + redundancies.len()
            + slide_issue_count,
        slides_with_issues: slides.iter().filter(|s| !s.issues.is_empty()).count(),
    };

    log::debug!(
        "Narrative review: {} issues across {} slides",
        summary.total_issues,
        summary.slides_with_issues
    );

    NarrativeReport {
        deck_path: deck.deck_path.clone(),
        slide_count: deck.slide_count(),
        narrative_arc,
        narrative_issues,
        flow_issues,
        redundancies,
        slides,
        summary,
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

    fn deck(slides: Vec<SlideRecord>) -> Deck {
        let mut deck = Deck::new("decks/demo");
        for s in slides {
            deck.add_slide(s);
        }
        deck
    }

    #[test]
    fn test_classification_order() {
        assert_eq!(classify_slide(&slide(1, "Why now?", "Costs are rising.")), NarrativeRole::Hook);
        assert_eq!(classify_slide(&slide(1, "Rising costs", "")), NarrativeRole::Problem);
        assert_eq!(classify_slide(&slide(1, "Our approach.", "")), NarrativeRole::Solution);
        assert_eq!(classify_slide(&slide(1, "Growth.", "Up 40% this year.")), NarrativeRole::Proof);
        assert_eq!(classify_slide(&slide(1, "Schedule time.", "")), NarrativeRole::Cta);
        assert_eq!(classify_slide(&slide(1, "Team", "Eight people")), NarrativeRole::Title);
        assert_eq!(classify_slide(&slide(1, "Team.", "Eight people.")), NarrativeRole::Content);
    }

    #[test]
    fn test_label_headline() {
        assert!(is_label_headline("Revenue"));
        assert!(is_label_headline("Market Size"));
        assert!(!is_label_headline("Revenue is growing"));
        assert!(!is_label_headline("Revenue grew 40% in a single quarter"));
        assert!(!is_label_headline("revenue"));
    }

    #[test]
    fn test_anti_patterns() {
        let issues = detect_anti_patterns(&slide(1, "Overview", "We leverage synergies."));
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::WeakHeadline, IssueKind::Jargon, IssueKind::LabelHeadline]
        );
        assert_eq!(
            issues[0].message,
            "Weak headline \"Overview\" - use a complete thought instead"
        );
    }

    #[test]
    fn test_wall_of_text() {
        let content = "word ".repeat(120);
        let issues = detect_anti_patterns(&slide(1, "A full sentence headline.", &content));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::WallOfText);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("alpha beta gamma", "alpha beta gamma"), 1.0);
        // short words are ignored
        assert_eq!(similarity("the cat alpha", "a dog alpha"), 1.0);
    }

    #[test]
    fn test_redundant_slides() {
        let report = analyze_deck(&deck(vec![
            slide(1, "One", "pricing model changes everything"),
            slide(2, "Two", "pricing model changes everything again"),
        ]));
        assert_eq!(report.redundancies.len(), 1);
        assert_eq!(report.redundancies[0].slides, [1, 2]);
        assert_eq!(report.redundancies[0].similarity, 80);
    }

    #[test]
    fn test_arc_issues() {
        let roles = [
            NarrativeRole::Title,
            NarrativeRole::Solution,
            NarrativeRole::Problem,
            NarrativeRole::Content,
            NarrativeRole::Content,
            NarrativeRole::Content,
        ];
        let issues = arc_issues(&roles);
        assert_eq!(
            issues,
            vec![
                "Consider adding a hook or provocative opening in first 2 slides",
                "Problem comes after solution - consider reordering",
                "No proof/evidence slides detected - add metrics or case studies",
                "No clear call-to-action in final slides",
            ]
        );

        let issues = arc_issues(&[NarrativeRole::Hook, NarrativeRole::Solution]);
        assert_eq!(issues, vec!["Solution presented without establishing the problem first"]);
    }

    #[test]
    fn test_topic_jump_skips_the_end() {
        let slides = vec![
            slide(1, "Why now?", "markets shifted overnight"),
            slide(2, "Rising costs", "suppliers doubled prices"),
            slide(3, "Team.", "eight engineers."),
            slide(4, "Team two.", "hiring plans."),
            slide(5, "Ask.", "approve budget."),
        ];
        let roles: Vec<NarrativeRole> = slides.iter().map(classify_slide).collect();
        let issues = flow_issues(&slides, &roles);
        assert_eq!(
            issues,
            vec![
                "Potential topic jump between slide 1 (\"Why now?\") and 2 (\"Rising costs\")",
                "Potential topic jump between slide 2 (\"Rising costs\") and 3 (\"Team.\")",
            ]
        );
    }

    #[test]
    fn test_headline_issues() {
        let report = analyze_deck(&deck(vec![slide(1, "Revenue", "Numbers went up.")]));
        let headline: Vec<IssueKind> = report.headline_issues().map(|(_, i)| i.kind).collect();
        assert_eq!(headline, vec![IssueKind::LabelHeadline]);
        assert_eq!(report.summary.slides_with_issues, 1);
    }
}
