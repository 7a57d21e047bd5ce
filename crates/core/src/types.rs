//! Domain types for representing an extracted slide deck and its findings.

use serde::{Deserialize, Serialize};

/// An entire deck with its extracted slides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    /// Deck directory as given on the command line.
    pub deck_path: String,

    /// Slides in document order.
    pub slides: Vec<SlideRecord>,
}

impl Deck {
    /// Create an empty deck for the given path.
    pub fn new(deck_path: impl Into<String>) -> Self {
        Self {
            deck_path: deck_path.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: SlideRecord) {
        self.slides.push(slide);
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Numbered list of slide titles, one per line.
    pub fn overview(&self) -> String {
        self.slides
            .iter()
            .map(|s| format!("{}. {}", s.index, s.title))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every slide's text under a `--- SLIDE n: title ---` banner.
    pub fn full_content(&self) -> String {
        self.slides
            .iter()
            .map(|s| format!("--- SLIDE {}: {} ---\n{}", s.index, s.title, s.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A single parsed slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideRecord {
    /// 1-based slide number.
    pub index: usize,

    /// The container's `data-title` attribute.
    pub title: String,

    /// Primary on-slide heading, or the title when the slide has none.
    pub headline: String,

    /// Plain text of the slide body.
    pub content: String,

    /// Original markup of the slide body.
    pub raw_markup: String,

    /// Layout variant declared on the inner wrapper.
    pub layout: Layout,

    /// Theme variant declared on the container.
    pub theme: Theme,
}

impl SlideRecord {
    /// Headline and body text joined by a space, the text most analyzers read.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.headline, self.content)
    }
}

/// Layout variant of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Title,
    Quote,
    Metrics,
    Split,
    Grid,
    /// No recognized layout class.
    Content,
}

impl Layout {
    /// Detection order when a body mentions more than one layout class.
    const DETECTION_ORDER: [(Layout, &'static str); 5] = [
        (Layout::Title, "layout-title"),
        (Layout::Quote, "layout-quote"),
        (Layout::Metrics, "layout-metrics"),
        (Layout::Split, "layout-split"),
        (Layout::Grid, "layout-grid"),
    ];

    /// Detect the layout from a slide's markup, first match wins.
    pub fn from_markup(markup: &str) -> Self {
        Self::DETECTION_ORDER
            .iter()
            .find(|(_, class)| markup.contains(class))
            .map(|(layout, _)| *layout)
            .unwrap_or(Layout::Content)
    }

    /// Parse a layout name such as `"split"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "quote" => Some(Self::Quote),
            "metrics" => Some(Self::Metrics),
            "split" => Some(Self::Split),
            "grid" => Some(Self::Grid),
            "content" => Some(Self::Content),
            _ => None,
        }
    }

    /// Whether slides of this layout are expected to carry a visual.
    pub fn is_content(self) -> bool {
        matches!(self, Layout::Split | Layout::Grid | Layout::Content)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Title => "title",
            Layout::Quote => "quote",
            Layout::Metrics => "metrics",
            Layout::Split => "split",
            Layout::Grid => "grid",
            Layout::Content => "content",
        }
    }
}

/// Theme variant of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Ivory,
    Ink,
}

impl Theme {
    /// Detect the theme from the container's class attribute.
    pub fn from_class(class_attr: &str) -> Self {
        if class_attr.split_whitespace().any(|c| c == "theme-ink") {
            Theme::Ink
        } else {
            Theme::Ivory
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Ivory => "ivory",
            Theme::Ink => "ink",
        }
    }
}

/// How urgent a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Machine-readable code of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    HighGradeLevel,
    HighPassiveVoice,
    HighJargonDensity,
    HighWordCount,
    HighCharCount,
    NoVisualsOnContentSlide,
    ManyListItems,
    EmptyMediaFrames,
    PoorHierarchy,
    ImbalancedLayout,
    ContrastIssue,
    GridMisalignment,
    TypographyVariance,
    ElementCountVariance,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKind::HighGradeLevel => "high_grade_level",
            FlagKind::HighPassiveVoice => "high_passive_voice",
            FlagKind::HighJargonDensity => "high_jargon_density",
            FlagKind::HighWordCount => "high_word_count",
            FlagKind::HighCharCount => "high_char_count",
            FlagKind::NoVisualsOnContentSlide => "no_visuals_on_content_slide",
            FlagKind::ManyListItems => "many_list_items",
            FlagKind::EmptyMediaFrames => "empty_media_frames",
            FlagKind::PoorHierarchy => "poor_hierarchy",
            FlagKind::ImbalancedLayout => "imbalanced_layout",
            FlagKind::ContrastIssue => "contrast_issue",
            FlagKind::GridMisalignment => "grid_misalignment",
            FlagKind::TypographyVariance => "typography_variance",
            FlagKind::ElementCountVariance => "element_count_variance",
        }
    }
}

/// An advisory finding raised when a metric crosses a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    #[serde(rename = "type")]
    pub kind: FlagKind,

    /// Human-readable description.
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Measured value that crossed the threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// 1-based slide the flag belongs to; `None` for deck-level flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,
}

impl Flag {
    /// Create a deck-level flag with no severity or measurements.
    pub fn new(kind: FlagKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: None,
            value: None,
            threshold: None,
            slide_index: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Record the measured value and the threshold it crossed.
    pub fn with_value(mut self, value: f64, threshold: f64) -> Self {
        self.value = Some(value);
        self.threshold = Some(threshold);
        self
    }

    /// Record a measured count that has no fixed threshold.
    pub fn with_measurement(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach the flag to a slide.
    pub fn at_slide(mut self, index: usize) -> Self {
        self.slide_index = Some(index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(index: usize, title: &str, content: &str) -> SlideRecord {
        SlideRecord {
            index,
            title: title.to_string(),
            headline: title.to_string(),
            content: content.to_string(),
            raw_markup: String::new(),
            layout: Layout::Content,
            theme: Theme::Ivory,
        }
    }

    #[test]
    fn test_layout_from_markup_first_match_wins() {
        assert_eq!(
            Layout::from_markup(r#"<div class="slide-inner layout-title">"#),
            Layout::Title
        );
        assert_eq!(
            Layout::from_markup(r#"<div class="layout-grid"><div class="layout-quote">"#),
            Layout::Quote
        );
        assert_eq!(Layout::from_markup("<p>plain</p>"), Layout::Content);
    }

    #[test]
    fn test_layout_is_content() {
        assert!(Layout::Split.is_content());
        assert!(Layout::Grid.is_content());
        assert!(Layout::Content.is_content());
        assert!(!Layout::Title.is_content());
        assert!(!Layout::Quote.is_content());
        assert!(!Layout::Metrics.is_content());
    }

    #[test]
    fn test_theme_from_class() {
        assert_eq!(Theme::from_class("slide theme-ink is-active"), Theme::Ink);
        assert_eq!(Theme::from_class("slide"), Theme::Ivory);
        assert_eq!(Theme::from_class("slide theme-inkwell"), Theme::Ivory);
    }

    #[test]
    fn test_deck_overview_and_content() {
        let mut deck = Deck::new("decks/demo");
        deck.add_slide(slide(1, "Intro", "Hello there"));
        deck.add_slide(slide(2, "Ask", "Approve it"));

        assert_eq!(deck.overview(), "1. Intro\n2. Ask");
        assert_eq!(
            deck.full_content(),
            "--- SLIDE 1: Intro ---\nHello there\n\n--- SLIDE 2: Ask ---\nApprove it"
        );
    }

    #[test]
    fn test_flag_serializes_type_code() {
        let flag = Flag::new(FlagKind::NoVisualsOnContentSlide, "No visuals")
            .with_value(42.0, 20.0)
            .at_slide(3);
        let json = serde_json::to_value(&flag).unwrap();

        assert_eq!(json["type"], "no_visuals_on_content_slide");
        assert_eq!(json["slideIndex"], 3);
        assert!(json.get("severity").is_none());
    }
}
