//! Guided deck creation: collects the deck brief and slides one at a time,
//! applies quality gates, and writes the outline, image prompts, deck
//! document, and deck metadata.

use crate::artifacts;
use crate::interview::Interviewer;
use chrono::{DateTime, Utc};
use keynote_core::{Error, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const CORE_PHILOSOPHY: &str =
    "Image > text. One idea per slide. Headlines make claims, not labels.";

pub const RULES: [&str; 5] = [
    "Every slide needs a visual concept. If you cannot picture it, rethink it.",
    "One slide = one point. If you have two ideas, make two slides.",
    "Headlines are statements, not labels. \"Revenue grew 3x\" not \"Revenue\".",
    "Rule of thumb: 1-2 minutes per slide. 10 slides = ~15 minute talk.",
    "When in doubt, remove. Let whitespace do the talking.",
];

const DEFAULT_MINUTES: u32 = 15;

static LABEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(the\s+)?[a-z]+$",
        r"(?i)^(our\s+)?(team|product|solution|approach|mission|vision|values)$",
        r"(?i)^(about|overview|introduction|agenda|summary|conclusion)$",
        r"(?i)^[a-z]+\s+(overview|update|summary)$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static VAGUE_VISUAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(image|photo|picture|graphic|visual|diagram)$",
        r"(?i)^(something|anything|whatever)",
        r"(?i)^(tbd|todo|placeholder)$",
        r"^\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static MINUTES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static WORD_START_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w").unwrap());

static MAIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(<main[^>]*>).*?(</main>)").unwrap());

/// Headline reads as a topic label rather than a claim.
pub fn is_label(headline: &str) -> bool {
    let headline = headline.trim();
    LABEL_PATTERNS.iter().any(|p| p.is_match(headline))
}

/// Visual concept too vague to picture.
pub fn is_vague_visual(visual: &str) -> bool {
    let visual = visual.trim();
    VAGUE_VISUAL_PATTERNS.iter().any(|p| p.is_match(visual))
}

/// Warning when the slide count does not fit the talk length. Minutes come
/// from the first number in `delivery`.
pub fn check_slide_count(slide_count: usize, delivery: &str) -> Option<String> {
    let minutes = MINUTES_REGEX
        .find(delivery)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(DEFAULT_MINUTES);
    let max = (f64::from(minutes) / 1.5).ceil() as usize;
    let min = (f64::from(minutes) / 2.5).floor() as usize;

    if slide_count > max {
        Some(format!(
            "{} slides for {} minutes is likely too many. Aim for {}-{} slides.",
            slide_count, minutes, min, max
        ))
    } else if slide_count > 0 && slide_count < min {
        Some(format!(
            "{} slides for {} minutes may feel rushed. Consider {}-{} slides.",
            slide_count, minutes, min, max
        ))
    } else {
        None
    }
}

/// `my-pitch` becomes `My Pitch`.
pub fn title_from_id(deck_id: &str) -> String {
    let spaced = deck_id.replace('-', " ");
    WORD_START_REGEX
        .replace_all(&spaced, |caps: &Captures| caps[0].to_uppercase())
        .into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideLayout {
    Title,
    Split,
    Metrics,
    Quote,
    Grid,
}

impl SlideLayout {
    pub const ALL: [SlideLayout; 5] = [
        SlideLayout::Title,
        SlideLayout::Split,
        SlideLayout::Metrics,
        SlideLayout::Quote,
        SlideLayout::Grid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SlideLayout::Title => "Title",
            SlideLayout::Split => "Split",
            SlideLayout::Metrics => "Metrics",
            SlideLayout::Quote => "Quote",
            SlideLayout::Grid => "Grid",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SlideLayout::Title => "title",
            SlideLayout::Split => "split",
            SlideLayout::Metrics => "metrics",
            SlideLayout::Quote => "quote",
            SlideLayout::Grid => "grid",
        }
    }

    fn description(self) -> &'static str {
        match self {
            SlideLayout::Title => "Opening slide with hero headline",
            SlideLayout::Split => "Text on left, visual on right",
            SlideLayout::Metrics => "Three big numbers",
            SlideLayout::Quote => "Centered quote for emphasis",
            SlideLayout::Grid => "Three or more cards",
        }
    }

    fn use_for(self) -> &'static str {
        match self {
            SlideLayout::Title => "Opening, section breaks, big claims",
            SlideLayout::Split => "Most content slides, explanations with visuals",
            SlideLayout::Metrics => "Key stats, proof points, impact numbers",
            SlideLayout::Quote => "Customer testimonials, powerful statements, transitions",
            SlideLayout::Grid => "Feature lists, team, options comparison",
        }
    }

    fn class(self) -> String {
        format!("layout-{}", self.key())
    }

    /// 1-based menu choice; anything else is split.
    pub fn from_choice(answer: &str) -> Self {
        answer
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(SlideLayout::Split)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckBrief {
    pub deck_id: String,
    pub title: String,
    pub entity: String,
    pub one_thing: String,
    pub audience: String,
    pub action: String,
    pub delivery: String,
    pub constraints: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSlide {
    pub headline: String,
    pub point: String,
    pub visual: String,
    pub layout: SlideLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSlide {
    pub index: usize,
    pub headline: String,
    pub point: String,
    pub visual: String,
    pub layout: SlideLayout,
}

/// Contents of `deck.json` and `deck-config.js`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckManifest {
    pub id: String,
    pub title: String,
    pub entity: String,
    pub one_thing: String,
    pub audience: String,
    pub action: String,
    pub delivery: String,
    pub constraints: Option<String>,
    pub slide_count: usize,
    pub created_at: DateTime<Utc>,
    pub slides: Vec<ManifestSlide>,
}

impl DeckManifest {
    pub fn new(brief: &DeckBrief, slides: &[WizardSlide], created_at: DateTime<Utc>) -> Self {
        Self {
            id: brief.deck_id.clone(),
            title: brief.title.clone(),
            entity: brief.entity.clone(),
            one_thing: brief.one_thing.clone(),
            audience: brief.audience.clone(),
            action: brief.action.clone(),
            delivery: brief.delivery.clone(),
            constraints: brief.constraints.clone(),
            slide_count: slides.len(),
            created_at,
            slides: slides
                .iter()
                .enumerate()
                .map(|(i, s)| ManifestSlide {
                    index: i + 1,
                    headline: s.headline.clone(),
                    point: s.point.clone(),
                    visual: s.visual.clone(),
                    layout: s.layout,
                })
                .collect(),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

pub fn slides_markdown(brief: &DeckBrief, slides: &[WizardSlide]) -> String {
    let mut lines = vec![
        format!("# {}", brief.title),
        String::new(),
        "## Deck Parameters".to_string(),
        String::new(),
        format!("**ONE thing:** {}", brief.one_thing),
        String::new(),
        format!("**Audience:** {}", brief.audience),
        String::new(),
        format!("**Action:** {}", brief.action),
        String::new(),
        format!("**Delivery:** {}", brief.delivery),
        String::new(),
    ];
    if let Some(constraints) = &brief.constraints {
        lines.push(format!("**Constraints:** {}", constraints));
        lines.push(String::new());
    }
    lines.extend([
        "---".to_string(),
        String::new(),
        "## Slide Outline".to_string(),
        String::new(),
    ]);

    for (i, slide) in slides.iter().enumerate() {
        lines.push(format!("### Slide {}: {}", i + 1, slide.headline));
        lines.push(String::new());
        lines.push(format!("**Point:** {}", slide.point));
        lines.push(String::new());
        lines.push(format!("**Visual:** {}", slide.visual));
        lines.push(String::new());
        lines.push(format!("**Layout:** {}", slide.layout.key()));
        lines.push(String::new());
        if let Some(notes) = &slide.notes {
            lines.push(format!("**Notes:** {}", notes));
            lines.push(String::new());
        }
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Image generation prompts for every slide with a concrete visual.
pub fn image_prompts(brief: &DeckBrief, slides: &[WizardSlide], prefix: Option<&str>) -> String {
    let mut lines = vec![
        "# Image Generation Prompts".to_string(),
        String::new(),
        format!("Deck: {}", brief.title),
        format!("Entity: {}", brief.entity),
    ];
    if let Some(prefix) = prefix {
        lines.push(format!("Brand prefix: {}", prefix));
    }
    lines.extend([String::new(), "---".to_string(), String::new()]);

    for (i, slide) in slides.iter().enumerate() {
        if is_vague_visual(&slide.visual) {
            continue;
        }
        let prompt = match prefix {
            Some(prefix) => format!("{}, {}", prefix, slide.visual),
            None => slide.visual.clone(),
        };
        lines.push(format!("## Slide {}: {}", i + 1, slide.headline));
        lines.push(String::new());
        lines.push("```".to_string());
        lines.push(prompt);
        lines.push("```".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Markup for one slide; the first slide starts active.
pub fn slide_html(slide: &WizardSlide, position: usize) -> String {
    let active = if position == 0 { " is-active" } else { "" };
    let layout = slide.layout.class();
    let headline = escape_html(&slide.headline);
    let point = escape_html(&slide.point);
    let notes = slide
        .notes
        .as_deref()
        .map(|n| {
            format!(
                "\n          <aside class=\"slide-notes\" aria-hidden=\"true\">{}</aside>",
                escape_html(n)
            )
        })
        .unwrap_or_default();

    match slide.layout {
        SlideLayout::Title => format!(
            r#"
      <section class="slide theme-ivory{active}" data-title="{headline}">
        <div class="slide-inner {layout}">
          <div class="eyebrow reveal" style="--reveal-index: 1"><!-- Eyebrow --></div>
          <h1 class="title reveal" style="--reveal-index: 2">{headline}</h1>
          <p class="subtitle reveal" style="--reveal-index: 3">{point}</p>
          {notes}
        </div>
      </section>"#
        ),
        SlideLayout::Metrics => format!(
            r#"
      <section class="slide theme-ivory{active}" data-title="{headline}">
        <div class="slide-inner {layout}">
          <div class="metric reveal" style="--reveal-index: 1">
            <div class="metric-number">XX%</div>
            <div class="metric-label">Metric 1</div>
          </div>
          <div class="metric reveal" style="--reveal-index: 2">
            <div class="metric-number">X.Xx</div>
            <div class="metric-label">Metric 2</div>
          </div>
          <div class="metric reveal" style="--reveal-index: 3">
            <div class="metric-number">XX</div>
            <div class="metric-label">Metric 3</div>
          </div>
          {notes}
        </div>
      </section>"#
        ),
        SlideLayout::Quote => format!(
            r#"
      <section class="slide theme-ink{active}" data-title="{headline}">
        <div class="slide-inner {layout}">
          <p class="quote reveal" style="--reveal-index: 1">"{point}"</p>
          <div class="quote-meta reveal" style="--reveal-index: 2">- Source</div>
          {notes}
        </div>
      </section>"#
        ),
        SlideLayout::Split | SlideLayout::Grid => {
            let visual = escape_html(&slide.visual);
            format!(
                r#"
      <section class="slide theme-ivory{active}" data-title="{headline}">
        <div class="slide-inner {layout}">
          <div>
            <h2 class="section-title reveal" style="--reveal-index: 1">{headline}</h2>
            <p class="body-text reveal" style="--reveal-index: 2">{point}</p>
          </div>
          <div class="media-frame reveal" style="--reveal-index: 2">
            <div class="media-placeholder">{visual}</div>
            <img
              class="gen-media"
              data-gen="text-to-image"
              data-prompt="{visual}"
              alt="{headline}"
            />
          </div>
          {notes}
        </div>
      </section>"#
            )
        }
    }
}

/// The deck document: the template with its `<main>` replaced, or a
/// minimal skeleton when no template is available.
pub fn index_html(brief: &DeckBrief, slides: &[WizardSlide], template: Option<&str>) -> String {
    let slides_html = slides
        .iter()
        .enumerate()
        .map(|(i, s)| slide_html(s, i))
        .collect::<Vec<_>>()
        .join("\n");

    match template {
        Some(template) if MAIN_REGEX.is_match(template) => MAIN_REGEX
            .replace(template, |caps: &Captures| {
                format!("{}\n{}\n    {}", &caps[1], slides_html, &caps[2])
            })
            .into_owned(),
        _ => format!(
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{title}</title>
    <script src="deck-config.js"></script>
  </head>
  <body>
    <main class="deck">
{slides_html}
    </main>
  </body>
</html>
"#,
            title = escape_html(&brief.title),
        ),
    }
}

pub fn deck_config_js(manifest: &DeckManifest) -> Result<String> {
    Ok(format!(
        "// Deck configuration for keynote-style slides.\n// Loaded before the main deck script.\nwindow.KEYNOTE_DECK = {};\n",
        serde_json::to_string_pretty(manifest)?
    ))
}

/// Write every deck file and return the paths created.
pub fn write_deck(
    deck_dir: &Path,
    brief: &DeckBrief,
    slides: &[WizardSlide],
    template: Option<&str>,
    image_prefix: Option<&str>,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(artifacts::assets_dir(deck_dir))?;
    std::fs::create_dir_all(artifacts::materials_dir(deck_dir))?;

    let manifest = DeckManifest::new(brief, slides, Utc::now());
    let outputs = [
        (deck_dir.join("slides.md"), slides_markdown(brief, slides)),
        (
            artifacts::material(deck_dir, artifacts::IMAGE_PROMPTS),
            image_prompts(brief, slides, image_prefix),
        ),
        (deck_dir.join("index.html"), index_html(brief, slides, template)),
        (
            deck_dir.join("deck.json"),
            serde_json::to_string_pretty(&manifest)?,
        ),
        (deck_dir.join("deck-config.js"), deck_config_js(&manifest)?),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (path, content) in outputs {
        artifacts::write_text(&path, &content)?;
        written.push(path);
    }
    Ok(written)
}

/// Interactive wizard over any line-based input.
pub struct Wizard<R, W> {
    io: Interviewer<R, W>,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Interviewer::new(input, output),
        }
    }

    fn heading(&mut self, title: &str) -> Result<()> {
        let rule = "=".repeat(60);
        self.io.say(&format!("\n{}\n{}\n{}", rule, title, rule))
    }

    /// Ask until a required answer is given; optional answers may be empty.
    fn ask(&mut self, question: &str, help: Option<&str>, required: bool) -> Result<String> {
        self.io.say(&format!("\n{}", question))?;
        if let Some(help) = help {
            self.io.say(&format!("   {}", help))?;
        }
        let prompt = if required {
            "(required) -> "
        } else {
            "(optional, Enter to skip) -> "
        };
        loop {
            let answer = self.io.ask(prompt)?;
            if !required || !answer.is_empty() {
                return Ok(answer);
            }
            self.io.say("   This field is required. Please provide an answer.")?;
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.io.ask(&format!("{} (y/n) -> ", question))?;
        Ok(answer.to_lowercase().starts_with('y'))
    }

    fn select_layout(&mut self) -> Result<SlideLayout> {
        self.io.say("\n   Available layouts:")?;
        for (i, layout) in SlideLayout::ALL.iter().enumerate() {
            self.io.say(&format!(
                "   {}. {}: {}\n      Best for: {}",
                i + 1,
                layout.name(),
                layout.description(),
                layout.use_for()
            ))?;
        }
        let answer = self.io.ask("\nSelect layout (1-5, or Enter for \"split\") -> ")?;
        Ok(SlideLayout::from_choice(&answer))
    }

    fn collect_brief(&mut self, deck_id: &str, entity: &str) -> Result<DeckBrief> {
        self.heading("DECK PARAMETERS")?;
        self.io.say("\nBefore we create slides, let's establish the foundation.")?;
        self.io.say(&format!("Remember: {}", CORE_PHILOSOPHY))?;

        let one_thing = self.ask(
            "What's the ONE thing the audience should remember?",
            Some("Not three things. Not a list. The single most important takeaway."),
            true,
        )?;
        let audience = self.ask(
            "Who is the audience? What do they care about?",
            Some("Be specific. \"Investors\" is too vague. \"Series A investors who care about TAM\" is better."),
            true,
        )?;
        let action = self.ask(
            "What action should they take after?",
            Some("Every deck should drive action. What do you want them to DO?"),
            true,
        )?;
        let delivery = self.ask(
            "How will this be delivered? How long?",
            Some("Live keynote vs async email changes everything. Duration affects slide count."),
            true,
        )?;
        let constraints = self.ask(
            "Any constraints or things to avoid?",
            Some("Legal restrictions, sensitive topics, competing narratives to counter."),
            false,
        )?;

        Ok(DeckBrief {
            deck_id: deck_id.to_string(),
            title: title_from_id(deck_id),
            entity: entity.to_string(),
            one_thing,
            audience,
            action,
            delivery,
            constraints: Some(constraints).filter(|c| !c.is_empty()),
        })
    }

    fn collect_slide(&mut self, number: usize) -> Result<WizardSlide> {
        self.io.say(&format!("\n--- SLIDE {} ---", number))?;

        let point = self.ask(
            "What's the SINGLE point of this slide?",
            Some("State it as a claim, not a topic. \"Our costs are 40% lower\" not \"Cost comparison\"."),
            true,
        )?;

        let visual = loop {
            let visual = self.ask(
                "How will you SHOW this? (describe the visual)",
                Some("What image, chart, or diagram makes this point instantly clear?"),
                true,
            )?;
            if !is_vague_visual(&visual) {
                break visual;
            }
            self.io.say("\n   [QUALITY GATE] That visual concept is too vague.")?;
            self.io.say("   Be specific: What would we SEE? A chart? A photo? A diagram?")?;
            self.io.say(&format!("   {}", RULES[0]))?;
        };

        let headline = loop {
            let headline = self.ask(
                "Write the headline (a claim, not a label):",
                Some("Headlines should be complete sentences that make your point."),
                true,
            )?;
            if !is_label(&headline) {
                break headline;
            }
            self.io.say("\n   [QUALITY GATE] That looks like a label, not a claim.")?;
            self.io.say("   Instead of \"Revenue\" try \"Revenue grew 3x in Q4\"")?;
            if self.confirm("   Keep this headline anyway?")? {
                break headline;
            }
        };

        let layout = self.select_layout()?;
        let notes = self.ask("Any speaker notes for this slide?", None, false)?;

        Ok(WizardSlide {
            headline,
            point,
            visual,
            layout,
            notes: Some(notes).filter(|n| !n.is_empty()),
        })
    }

    /// Run the wizard. `None` when the author declines the final duration check.
    pub fn run(&mut self, deck_id: &str, entity: &str) -> Result<Option<(DeckBrief, Vec<WizardSlide>)>> {
        self.heading("DECK CREATION WIZARD")?;
        self.io.say("\nPhilosophy:")?;
        self.io.say(&format!("  - {}", CORE_PHILOSOPHY))?;
        for rule in RULES {
            self.io.say(&format!("  - {}", rule))?;
        }
        self.io.say(&format!("\nDeck ID: {}\nEntity: {}", deck_id, entity))?;

        let brief = self.collect_brief(deck_id, entity)?;

        self.heading("SLIDE-BY-SLIDE CREATION")?;
        self.io.say(&format!("Remember: {}", RULES[1]))?;

        let mut slides = Vec::new();
        loop {
            slides.push(self.collect_slide(slides.len() + 1)?);
            if let Some(warning) = check_slide_count(slides.len(), &brief.delivery) {
                self.io.say(&format!("\n   [DURATION CHECK] {}", warning))?;
            }
            if !self.confirm("\nAdd another slide?")? {
                break;
            }
        }

        if let Some(warning) = check_slide_count(slides.len(), &brief.delivery) {
            self.io.say(&format!("\n[FINAL CHECK] {}", warning))?;
            if !self.confirm("Continue anyway?")? {
                self.io.say("Exiting. Re-run to try again.")?;
                return Ok(None);
            }
        }

        Ok(Some((brief, slides)))
    }
}

/// Read the deck template, if one exists at `path`.
pub fn load_template(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::IoError(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn brief() -> DeckBrief {
        DeckBrief {
            deck_id: "pilot-plan".to_string(),
            title: "Pilot Plan".to_string(),
            entity: "northwind".to_string(),
            one_thing: "The pilot pays for itself".to_string(),
            audience: "CFO".to_string(),
            action: "Approve the pilot".to_string(),
            delivery: "10-minute live presentation".to_string(),
            constraints: None,
        }
    }

    fn slide(layout: SlideLayout) -> WizardSlide {
        WizardSlide {
            headline: "Costs fell 40% in the first month".to_string(),
            point: "Savings arrive <before> rollout".to_string(),
            visual: "Bar chart of monthly cost".to_string(),
            layout,
            notes: None,
        }
    }

    #[test]
    fn test_label_detection() {
        assert!(is_label("Overview"));
        assert!(is_label("The Problem"));
        assert!(is_label("Our Team"));
        assert!(is_label("Product update"));
        assert!(!is_label("Revenue grew 3x in Q4"));
    }

    #[test]
    fn test_vague_visuals() {
        assert!(is_vague_visual("image"));
        assert!(is_vague_visual("  "));
        assert!(is_vague_visual("something with people"));
        assert!(is_vague_visual("TBD"));
        assert!(!is_vague_visual("Photo of a warehouse at dawn"));
    }

    #[test]
    fn test_slide_count_for_duration() {
        // 10 minutes allows 4 to 7 slides
        assert!(check_slide_count(5, "10-minute talk").is_none());
        assert_eq!(
            check_slide_count(8, "10-minute talk").unwrap(),
            "8 slides for 10 minutes is likely too many. Aim for 4-7 slides."
        );
        assert_eq!(
            check_slide_count(2, "10-minute talk").unwrap(),
            "2 slides for 10 minutes may feel rushed. Consider 4-7 slides."
        );
        // no number means 15 minutes
        assert!(check_slide_count(10, "self-paced").is_none());
        assert!(check_slide_count(11, "self-paced").is_some());
        assert!(check_slide_count(0, "self-paced").is_none());
    }

    #[test]
    fn test_title_from_id() {
        assert_eq!(title_from_id("my-pitch"), "My Pitch");
        assert_eq!(title_from_id("q4-board-update"), "Q4 Board Update");
    }

    #[test]
    fn test_layout_choice() {
        assert_eq!(SlideLayout::from_choice("1"), SlideLayout::Title);
        assert_eq!(SlideLayout::from_choice("5"), SlideLayout::Grid);
        assert_eq!(SlideLayout::from_choice(""), SlideLayout::Split);
        assert_eq!(SlideLayout::from_choice("0"), SlideLayout::Split);
        assert_eq!(SlideLayout::from_choice("9"), SlideLayout::Split);
    }

    #[test]
    fn test_slide_html_escapes_and_activates() {
        let html = slide_html(&slide(SlideLayout::Split), 0);
        assert!(html.contains(r#"class="slide theme-ivory is-active""#));
        assert!(html.contains("layout-split"));
        assert!(html.contains("Savings arrive &lt;before&gt; rollout"));
        assert!(html.contains(r#"data-prompt="Bar chart of monthly cost""#));

        let quote = slide_html(&slide(SlideLayout::Quote), 1);
        assert!(quote.contains(r#"class="slide theme-ink""#));
        assert!(!quote.contains("is-active"));
    }

    #[test]
    fn test_index_html_replaces_main() {
        let template = "<html><body><main class=\"deck\">\n<section>old</section>\n</main></body></html>";
        let html = index_html(&brief(), &[slide(SlideLayout::Title)], Some(template));
        assert!(!html.contains("<section>old</section>"));
        assert!(html.starts_with("<html><body><main class=\"deck\">\n"));
        assert!(html.contains("layout-title"));
        assert!(html.ends_with("</main></body></html>"));

        let skeleton = index_html(&brief(), &[slide(SlideLayout::Title)], None);
        assert!(skeleton.contains("<title>Pilot Plan</title>"));
        assert!(skeleton.contains("data-title=\"Costs fell 40% in the first month\""));
    }

    #[test]
    fn test_generated_deck_extracts() {
        let html = index_html(
            &brief(),
            &[slide(SlideLayout::Title), slide(SlideLayout::Split)],
            None,
        );
        let slides = keynote_html::DeckParser::new().parse(&html);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].headline, "Costs fell 40% in the first month");
    }

    #[test]
    fn test_image_prompts_skip_vague() {
        let mut vague = slide(SlideLayout::Split);
        vague.visual = "tbd".to_string();
        let text = image_prompts(&brief(), &[slide(SlideLayout::Split), vague], Some("Warm film still"));
        assert!(text.contains("Brand prefix: Warm film still"));
        assert!(text.contains("Warm film still, Bar chart of monthly cost"));
        assert!(text.contains("## Slide 1:"));
        assert!(!text.contains("## Slide 2:"));
    }

    #[test]
    fn test_run_with_quality_gates() {
        let script = [
            "Pilots pay back in a quarter",
            "CFO",
            "Approve the pilot",
            "10 minutes",
            "",
            // slide 1: empty point re-asked, vague visual re-asked, label kept after refusal
            "",
            "Costs fall fast",
            "image",
            "Line chart of cost per order",
            "Overview",
            "n",
            "Cost per order fell 40% in one month",
            "2",
            "Mention the Q2 pilot",
            "n",
            // final check: 1 slide for 10 minutes is rushed
            "y",
        ]
        .join("\n")
            + "\n";

        let mut output = Vec::new();
        let (brief, slides) = Wizard::new(Cursor::new(script), &mut output)
            .run("pilot-plan", "northwind")
            .unwrap()
            .unwrap();

        assert_eq!(brief.title, "Pilot Plan");
        assert_eq!(brief.constraints, None);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].point, "Costs fall fast");
        assert_eq!(slides[0].visual, "Line chart of cost per order");
        assert_eq!(slides[0].headline, "Cost per order fell 40% in one month");
        assert_eq!(slides[0].layout, SlideLayout::Split);
        assert_eq!(slides[0].notes.as_deref(), Some("Mention the Q2 pilot"));

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("This field is required"));
        assert!(transcript.contains("[QUALITY GATE] That visual concept is too vague."));
        assert!(transcript.contains("[QUALITY GATE] That looks like a label, not a claim."));
        assert!(transcript.contains("[FINAL CHECK] 1 slides for 10 minutes may feel rushed."));
    }

    #[test]
    fn test_declined_final_check() {
        let script = "One\nCFO\nApprove\n10 minutes\n\nPoint\nChart of savings\nSavings doubled this year\n\n\nn\nn\n";
        let result = Wizard::new(Cursor::new(script), Vec::new())
            .run("tiny", "northwind")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_deck() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("pilot-plan");
        let written = write_deck(&deck, &brief(), &[slide(SlideLayout::Metrics)], None, None).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));
        assert!(artifacts::assets_dir(&deck).is_dir());

        let manifest: DeckManifest = artifacts::read_json(&deck.join("deck.json")).unwrap();
        assert_eq!(manifest.slide_count, 1);
        assert_eq!(manifest.slides[0].layout, SlideLayout::Metrics);

        let config = std::fs::read_to_string(deck.join("deck-config.js")).unwrap();
        assert!(config.contains("window.KEYNOTE_DECK = {"));
        assert!(config.contains("\"oneThing\": \"The pilot pays for itself\""));
    }
}
