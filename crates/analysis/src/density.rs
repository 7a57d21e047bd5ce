//! Visual density: how much text each slide carries relative to its visuals.
//!
//! Reads the raw slide markup. Measurements are factual; flags mark where a
//! count crosses a configured boundary.

use crate::stats::{leading_int, round_half_up, round_to};
use keynote_core::{
    AnalysisConfig, Deck, DensityThresholds, Flag, FlagKind, Layout, SlideRecord, Theme,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

/// Words on an "ideal" slide; density reaches 50 at this count.
const IDEAL_WORDS: f64 = 40.0;

static LIST_ITEM_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<li[^>]*>").unwrap());

static CHIP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class="[^"]*chip[^"]*""#).unwrap());

static CARD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class="[^"]*card[^"]*""#).unwrap());

static IMG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img[^>]*>").unwrap());

static SRC_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"src="([^"]*)""#).unwrap());

static ALT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"alt="([^"]*)""#).unwrap());

static WIDTH_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"width="?(\d+)"?"#).unwrap());

static HEIGHT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"height="?(\d+)"?"#).unwrap());

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)placeholder").unwrap());

static SVG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg[^>]*>.*?</svg>").unwrap());

static VIEWBOX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"viewBox="([^"]*)""#).unwrap());

static MEDIA_FRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*class="[^"]*media-frame[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});

static GEN_MEDIA_IMG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*class="[^"]*gen-media[^"]*""#).unwrap());

/// Words per visual; a slide with words and no visuals has no finite ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextToVisualRatio {
    Ratio(f64),
    NoVisuals,
}

impl fmt::Display for TextToVisualRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextToVisualRatio::Ratio(r) => write!(f, "{}", r),
            TextToVisualRatio::NoVisuals => write!(f, "N/A (no visuals)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    /// Only known when both dimensions are declared.
    pub area: Option<u64>,
    pub is_placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgInfo {
    pub view_box: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub area: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFrame {
    pub has_placeholder: bool,
    pub has_image: bool,
    pub has_video: bool,
    pub is_ready: bool,
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletBreakdown {
    pub list_items: usize,
    pub chips: usize,
    pub cards: usize,
}

impl BulletBreakdown {
    pub fn total(&self) -> usize {
        self.list_items + self.chips + self.cards
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityMetrics {
    pub word_count: usize,
    pub char_count: usize,
    pub bullet_count: usize,
    pub bullet_breakdown: BulletBreakdown,
    pub image_count: usize,
    pub svg_count: usize,
    pub visual_count: usize,
    pub total_image_area: Option<u64>,
    pub total_svg_area: Option<u64>,
    pub total_visual_area: Option<u64>,
    pub media_frame_count: usize,
    pub empty_media_frames: usize,
    pub text_to_visual_ratio: TextToVisualRatio,
    pub content_density: u32,
    pub whitespace_estimate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDensity {
    pub index: usize,
    pub title: String,
    #[serde(rename = "slideType")]
    pub layout: Layout,
    pub theme: Theme,
    pub metrics: DensityMetrics,
    pub flags: Vec<Flag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityAverages {
    pub avg_word_count: f64,
    pub avg_char_count: f64,
    pub avg_bullet_count: f64,
    pub avg_visual_count: f64,
    pub avg_content_density: f64,
    pub avg_whitespace: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagSummary {
    pub total_flags: usize,
    pub slides_with_flags: usize,
    pub flags_by_type: BTreeMap<FlagKind, Vec<Flag>>,
}

impl FlagSummary {
    /// Slides carrying a flag of the given kind.
    pub fn slides_with(&self, kind: FlagKind) -> Vec<usize> {
        self.flags_by_type
            .get(&kind)
            .map(|flags| flags.iter().filter_map(|f| f.slide_index).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityReport {
    pub deck_path: String,
    pub slide_count: usize,
    pub thresholds: DensityThresholds,
    pub deck_averages: DensityAverages,
    pub slides: Vec<SlideDensity>,
    pub flag_summary: FlagSummary,
}

fn count_bullets(markup: &str) -> BulletBreakdown {
    BulletBreakdown {
        list_items: LIST_ITEM_REGEX.find_iter(markup).count(),
        chips: CHIP_REGEX.find_iter(markup).count(),
        cards: CARD_REGEX.find_iter(markup).count(),
    }
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
    regex.captures(text).map(|caps| caps[1].to_string())
}

/// Unknown when either dimension is missing or the product overflows.
fn area(width: Option<u64>, height: Option<u64>) -> Option<u64> {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => w.checked_mul(h),
        _ => None,
    }
}

fn total_area(areas: impl Iterator<Item = u64>) -> u64 {
    areas.fold(0, u64::saturating_add)
}

fn extract_images(markup: &str) -> Vec<ImageInfo> {
    IMG_REGEX
        .find_iter(markup)
        .map(|m| {
            let tag = m.as_str();
            let src = capture(&SRC_REGEX, tag);
            let width = capture(&WIDTH_REGEX, tag).and_then(|w| w.parse().ok());
            let height = capture(&HEIGHT_REGEX, tag).and_then(|h| h.parse().ok());

            let is_placeholder = PLACEHOLDER_REGEX.is_match(tag)
                || src
                    .as_deref()
                    .map_or(true, |s| s.is_empty() || s.starts_with("data:image/svg"));

            ImageInfo {
                alt: capture(&ALT_REGEX, tag),
                area: area(width, height),
                src,
                width,
                height,
                is_placeholder,
            }
        })
        .collect()
}

fn extract_svgs(markup: &str) -> Vec<SvgInfo> {
    SVG_REGEX
        .find_iter(markup)
        .map(|m| {
            let view_box = capture(&VIEWBOX_REGEX, m.as_str());
            let (width, height) = view_box
                .as_deref()
                .map(|vb| {
                    let parts: Vec<&str> = vb.split_whitespace().collect();
                    if parts.len() >= 4 {
                        (leading_int(parts[2]), leading_int(parts[3]))
                    } else {
                        (None, None)
                    }
                })
                .unwrap_or((None, None));

            SvgInfo {
                view_box,
                width,
                height,
                area: area(width, height),
            }
        })
        .collect()
}

fn extract_media_frames(markup: &str) -> Vec<MediaFrame> {
    MEDIA_FRAME_REGEX
        .captures_iter(markup)
        .map(|caps| {
            let inner = &caps[1];
            let has_placeholder = inner.contains("media-placeholder");
            let has_image = GEN_MEDIA_IMG_REGEX.is_match(inner);
            let has_video = inner.contains("<video");

            MediaFrame {
                has_placeholder,
                has_image,
                has_video,
                is_ready: caps[0].contains(r#"data-ready="true""#),
                is_empty: has_placeholder && !has_image && !has_video,
            }
        })
        .collect()
}

fn non_zero(value: u64) -> Option<u64> {
    (value > 0).then_some(value)
}

/// Measure one slide.
pub fn analyze_slide(slide: &SlideRecord, thresholds: &DensityThresholds) -> SlideDensity {
    let word_count = slide.content.split_whitespace().count();
    let char_count = slide.content.chars().count();
    let bullets = count_bullets(&slide.raw_markup);
    let images = extract_images(&slide.raw_markup);
    let svgs = extract_svgs(&slide.raw_markup);
    let frames = extract_media_frames(&slide.raw_markup);

    let real_images: Vec<&ImageInfo> = images.iter().filter(|i| !i.is_placeholder).collect();
    let image_area = total_area(real_images.iter().filter_map(|i| i.area));
    let svg_area = total_area(svgs.iter().filter_map(|s| s.area));
    let visual_count = real_images.len() + svgs.len();

    let text_to_visual_ratio = if visual_count > 0 {
        TextToVisualRatio::Ratio(round_to(word_count as f64 / visual_count as f64, 1))
    } else if word_count > 0 {
        TextToVisualRatio::NoVisuals
    } else {
        TextToVisualRatio::Ratio(0.0)
    };

    let content_density = round_half_up(word_count as f64 / IDEAL_WORDS * 50.0).min(100.0) as u32;
    let empty_frames = frames.iter().filter(|f| f.is_empty).count();

    let mut flags = Vec::new();
    if word_count > thresholds.high_word_count {
        flags.push(
            Flag::new(
                FlagKind::HighWordCount,
                format!(
                    "High word count: {} (threshold: {})",
                    word_count, thresholds.high_word_count
                ),
            )
            .with_value(word_count as f64, thresholds.high_word_count as f64),
        );
    }
    if char_count > thresholds.high_char_count {
        flags.push(
            Flag::new(
                FlagKind::HighCharCount,
                format!(
                    "High character count: {} (threshold: {})",
                    char_count, thresholds.high_char_count
                ),
            )
            .with_value(char_count as f64, thresholds.high_char_count as f64),
        );
    }
    if slide.layout.is_content() && visual_count == 0 && word_count > thresholds.no_visual_min_words
    {
        flags.push(Flag::new(
            FlagKind::NoVisualsOnContentSlide,
            format!("No visuals on {} slide", slide.layout.as_str()),
        ));
    }
    if bullets.total() > thresholds.many_bullets {
        flags.push(
            Flag::new(
                FlagKind::ManyListItems,
                format!(
                    "Many list items: {} (threshold: {})",
                    bullets.total(),
                    thresholds.many_bullets
                ),
            )
            .with_value(bullets.total() as f64, thresholds.many_bullets as f64),
        );
    }
    if empty_frames > 0 {
        flags.push(
            Flag::new(
                FlagKind::EmptyMediaFrames,
                format!("Empty media frames: {}", empty_frames),
            )
            .with_measurement(empty_frames as f64),
        );
    }

    let flags = flags.into_iter().map(|f| f.at_slide(slide.index)).collect();

    SlideDensity {
        index: slide.index,
        title: slide.title.clone(),
        layout: slide.layout,
        theme: slide.theme,
        metrics: DensityMetrics {
            word_count,
            char_count,
            bullet_count: bullets.total(),
            bullet_breakdown: bullets,
            image_count: real_images.len(),
            svg_count: svgs.len(),
            visual_count,
            total_image_area: non_zero(image_area),
            total_svg_area: non_zero(svg_area),
            total_visual_area: non_zero(image_area.saturating_add(svg_area)),
            media_frame_count: frames.len(),
            empty_media_frames: empty_frames,
            text_to_visual_ratio,
            content_density,
            whitespace_estimate: 100 - content_density,
        },
        flags,
    }
}

fn deck_averages(slides: &[SlideDensity]) -> DensityAverages {
    if slides.is_empty() {
        return DensityAverages::default();
    }

    let count = slides.len() as f64;
    let sum = |f: fn(&DensityMetrics) -> f64| slides.iter().map(|s| f(&s.metrics)).sum::<f64>();

    DensityAverages {
        avg_word_count: round_half_up(sum(|m| m.word_count as f64) / count),
        avg_char_count: round_half_up(sum(|m| m.char_count as f64) / count),
        avg_bullet_count: round_half_up(sum(|m| m.bullet_count as f64) / count * 10.0) / 10.0,
        avg_visual_count: round_half_up(sum(|m| m.visual_count as f64) / count * 10.0) / 10.0,
        avg_content_density: round_half_up(sum(|m| m.content_density as f64) / count),
        avg_whitespace: round_half_up(sum(|m| m.whitespace_estimate as f64) / count),
    }
}

/// Measure every slide and group the resulting flags by type.
pub fn analyze_deck(deck: &Deck, config: &AnalysisConfig) -> DensityReport {
    let thresholds = &config.density;
    let slides: Vec<SlideDensity> = deck
        .slides
        .iter()
        .map(|slide| analyze_slide(slide, thresholds))
        .collect();

    let mut flags_by_type: BTreeMap<FlagKind, Vec<Flag>> = BTreeMap::new();
    let mut flagged_slides = BTreeSet::new();
    for flag in slides.iter().flat_map(|s| s.flags.iter()) {
        flagged_slides.extend(flag.slide_index);
        flags_by_type.entry(flag.kind).or_default().push(flag.clone());
    }

    let flag_summary = FlagSummary {
        total_flags: flags_by_type.values().map(Vec::len).sum(),
        slides_with_flags: flagged_slides.len(),
        flags_by_type,
    };

    log::debug!(
        "Visual density: {} flags across {} slides",
        flag_summary.total_flags,
        flag_summary.slides_with_flags
    );

    DensityReport {
        deck_path: deck.deck_path.clone(),
        slide_count: deck.slide_count(),
        thresholds: thresholds.clone(),
        deck_averages: deck_averages(&slides),
        slides,
        flag_summary,
    }
}
