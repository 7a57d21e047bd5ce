//! Design quality scoring over rendered slide geometry.
//!
//! The browser probe in `keynote-render` produces a [`RenderedDeck`]; every
//! function here is pure and works on those measurements alone.

use crate::stats::{round_half_up, round_to};
use keynote_core::{AnalysisConfig, DesignThresholds, Flag, FlagKind, Severity};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Percentage positions treated as grid lines.
const GRID_POSITIONS: [f64; 11] = [0.0, 10.0, 20.0, 25.0, 33.33, 50.0, 66.67, 75.0, 80.0, 90.0, 100.0];

/// Fraction of the viewport width around the center that counts as centered.
const CENTER_TOLERANCE: f64 = 0.15;

const EXCELLENT_CONTRAST: f64 = 7.0;
const GOOD_CONTRAST: f64 = 4.5;
/// Worst ratios below this raise a high-severity contrast flag.
const SEVERE_CONTRAST: f64 = 2.0;

static RGB_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgba?\((\d+),\s*(\d+),\s*(\d+)").unwrap());

static HEX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([a-fA-F0-9]{6})").unwrap());

/// Bounding box of a significant element, in viewport pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBox {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBox {
    fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Computed text color of an element against the slide background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub element: String,
    pub color: String,
    pub background: String,
}

/// Measurements taken from one rendered slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSlide {
    pub index: usize,
    pub title: String,
    pub theme: String,
    /// Layout name from the `layout-*` class, or `unknown`.
    pub layout: String,
    pub elements: Vec<ElementBox>,
    /// Largest heading font size in px, 0 when there is none.
    pub heading_size: f64,
    pub body_size: f64,
    pub contrast: Vec<ColorSample>,
}

impl RenderedSlide {
    pub fn typography_ratio(&self) -> f64 {
        if self.body_size > 0.0 {
            self.heading_size / self.body_size
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDeck {
    pub deck_url: String,
    /// Slides present in the document, including any beyond the probe limit.
    pub slide_count: usize,
    pub slides: Vec<RenderedSlide>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Parse an `rgb()`/`rgba()` or six-digit hex color; anything else is black.
    pub fn parse(color: &str) -> Self {
        if let Some(caps) = RGB_REGEX.captures(color) {
            let channel = |i: usize| caps[i].parse::<u16>().map(|v| v.min(255) as u8).unwrap_or(0);
            return Rgb {
                r: channel(1),
                g: channel(2),
                b: channel(3),
            };
        }

        if let Some(caps) = HEX_REGEX.captures(color) {
            let hex = &caps[1];
            let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).unwrap_or(0);
            return Rgb {
                r: channel(0..2),
                g: channel(2..4),
                b: channel(4..6),
            };
        }

        Self::BLACK
    }

    /// WCAG relative luminance.
    pub fn luminance(self) -> f64 {
        let linear = |c: u8| {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }
}

pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (a.luminance(), b.luminance());
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HierarchyGrade {
    Excellent,
    Good,
    Acceptable,
    Poor,
    VeryPoor,
}

impl HierarchyGrade {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 1.8 {
            HierarchyGrade::Excellent
        } else if ratio >= 1.5 {
            HierarchyGrade::Good
        } else if ratio >= 1.3 {
            HierarchyGrade::Acceptable
        } else if ratio >= 1.0 {
            HierarchyGrade::Poor
        } else {
            HierarchyGrade::VeryPoor
        }
    }

    pub fn value(self) -> f64 {
        match self {
            HierarchyGrade::Excellent => 1.0,
            HierarchyGrade::Good => 0.8,
            HierarchyGrade::Acceptable => 0.6,
            HierarchyGrade::Poor => 0.3,
            HierarchyGrade::VeryPoor => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HierarchyGrade::Excellent => "excellent",
            HierarchyGrade::Good => "good",
            HierarchyGrade::Acceptable => "acceptable",
            HierarchyGrade::Poor => "poor",
            HierarchyGrade::VeryPoor => "very-poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContrastGrade {
    Excellent,
    Good,
    Acceptable,
    Failing,
}

impl ContrastGrade {
    fn from_ratio(ratio: f64, min_ratio: f64) -> Self {
        if ratio >= EXCELLENT_CONTRAST {
            ContrastGrade::Excellent
        } else if ratio >= GOOD_CONTRAST {
            ContrastGrade::Good
        } else if ratio >= min_ratio {
            ContrastGrade::Acceptable
        } else {
            ContrastGrade::Failing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lean {
    Balanced,
    LeftHeavy,
    RightHeavy,
    TopHeavy,
    BottomHeavy,
}

impl Lean {
    pub fn as_str(self) -> &'static str {
        match self {
            Lean::Balanced => "balanced",
            Lean::LeftHeavy => "left-heavy",
            Lean::RightHeavy => "right-heavy",
            Lean::TopHeavy => "top-heavy",
            Lean::BottomHeavy => "bottom-heavy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutClass {
    Empty,
    Centered,
    Split,
    LeftAligned,
    RightAligned,
    Asymmetric,
}

impl LayoutClass {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutClass::Empty => "empty",
            LayoutClass::Centered => "centered",
            LayoutClass::Split => "split",
            LayoutClass::LeftAligned => "left-aligned",
            LayoutClass::RightAligned => "right-aligned",
            LayoutClass::Asymmetric => "asymmetric",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyScore {
    pub score: HierarchyGrade,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub heading_size: f64,
    pub body_size: f64,
    pub ratio: f64,
    pub hierarchy_score: HierarchyScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub horizontal: Lean,
    pub vertical: Lean,
    /// Left share of horizontal weight in percent; absent for empty slides.
    /// Above 65 the slide is left-heavy, below 35 right-heavy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_ratio: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_ratio: Option<u32>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastResult {
    pub element: String,
    pub ratio: f64,
    pub grade: ContrastGrade,
    pub passes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContrastSummary {
    pub samples: Vec<ContrastResult>,
    pub worst_ratio: Option<f64>,
    pub all_pass: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridAlignment {
    /// Aligned share in percent.
    pub score: u32,
    pub aligned_elements: usize,
    pub total_elements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDesign {
    pub index: usize,
    pub title: String,
    pub theme: String,
    pub layout: String,
    pub typography: Typography,
    pub balance: Balance,
    pub layout_classification: LayoutClass,
    pub contrast: ContrastSummary,
    pub grid_alignment: GridAlignment,
    pub element_count: usize,
    pub flags: Vec<Flag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consistency {
    pub layout_distribution: BTreeMap<String, usize>,
    pub issues: Vec<Flag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSummary {
    pub total_flags: usize,
    pub by_type: BTreeMap<FlagKind, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignReport {
    pub deck_url: String,
    pub slide_count: usize,
    pub analyzed_slides: usize,
    pub slides: Vec<SlideDesign>,
    pub consistency: Consistency,
    pub flags: Vec<Flag>,
    pub summary: DesignSummary,
}

impl DesignReport {
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.summary.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Area-weighted balance of elements around the viewport center.
pub fn weight_distribution(elements: &[ElementBox], thresholds: &DesignThresholds) -> Balance {
    if elements.is_empty() {
        return Balance {
            horizontal: Lean::Balanced,
            vertical: Lean::Balanced,
            horizontal_ratio: None,
            vertical_ratio: None,
            score: 1.0,
        };
    }

    let center_x = thresholds.viewport_width as f64 / 2.0;
    let center_y = thresholds.viewport_height as f64 / 2.0;
    let (mut left, mut right, mut top, mut bottom) = (0.0, 0.0, 0.0, 0.0);

    for el in elements {
        let (cx, cy, weight) = (el.center_x(), el.center_y(), el.area());
        if cx < center_x {
            left += weight * (1.0 - cx / center_x);
        } else {
            right += weight * (cx / center_x - 1.0);
        }
        if cy < center_y {
            top += weight * (1.0 - cy / center_y);
        } else {
            bottom += weight * (cy / center_y - 1.0);
        }
    }

    let nonzero = |total: f64| if total == 0.0 { 1.0 } else { total };
    let horizontal_ratio = left / nonzero(left + right);
    let vertical_ratio = top / nonzero(top + bottom);

    let lean = |ratio: f64, low: Lean, high: Lean| {
        if ratio < 0.35 {
            low
        } else if ratio > 0.65 {
            high
        } else {
            Lean::Balanced
        }
    };
    let axis_score = |ratio: f64| 1.0 - (ratio - 0.5).abs() * 2.0;

    Balance {
        horizontal: lean(horizontal_ratio, Lean::RightHeavy, Lean::LeftHeavy),
        vertical: lean(vertical_ratio, Lean::BottomHeavy, Lean::TopHeavy),
        horizontal_ratio: Some(round_half_up(horizontal_ratio * 100.0) as u32),
        vertical_ratio: Some(round_half_up(vertical_ratio * 100.0) as u32),
        score: (axis_score(horizontal_ratio) + axis_score(vertical_ratio)) / 2.0,
    }
}

pub fn classify_layout(elements: &[ElementBox], thresholds: &DesignThresholds) -> LayoutClass {
    if elements.is_empty() {
        return LayoutClass::Empty;
    }

    let width = thresholds.viewport_width as f64;
    let center_x = width / 2.0;
    let tolerance = width * CENTER_TOLERANCE;
    let (mut centered, mut left, mut right) = (0usize, 0usize, 0usize);

    for el in elements {
        let cx = el.center_x();
        if (cx - center_x).abs() < tolerance {
            centered += 1;
        } else if cx < center_x {
            left += 1;
        } else {
            right += 1;
        }
    }

    if centered as f64 / elements.len() as f64 > 0.7 {
        LayoutClass::Centered
    } else if left > 0 && right > 0 && left.abs_diff(right) <= 1 {
        LayoutClass::Split
    } else if left > right * 2 {
        LayoutClass::LeftAligned
    } else if right > left * 2 {
        LayoutClass::RightAligned
    } else {
        LayoutClass::Asymmetric
    }
}

fn snaps_to_grid(position: f64, container: f64, tolerance: f64) -> bool {
    let percentage = position / container * 100.0;
    GRID_POSITIONS
        .iter()
        .any(|grid| (percentage - grid).abs() <= tolerance)
}

/// Elements whose left or top edge lies on a grid line.
pub fn grid_alignment(elements: &[ElementBox], thresholds: &DesignThresholds) -> (usize, f64) {
    if elements.is_empty() {
        return (0, 1.0);
    }
    let aligned = elements
        .iter()
        .filter(|el| {
            snaps_to_grid(el.x, thresholds.viewport_width as f64, thresholds.grid_tolerance)
                || snaps_to_grid(el.y, thresholds.viewport_height as f64, thresholds.grid_tolerance)
        })
        .count();
    (aligned, aligned as f64 / elements.len() as f64)
}

fn score_contrast(samples: &[ColorSample], thresholds: &DesignThresholds) -> ContrastSummary {
    let results: Vec<ContrastResult> = samples
        .iter()
        .map(|sample| {
            let ratio = contrast_ratio(Rgb::parse(&sample.color), Rgb::parse(&sample.background));
            ContrastResult {
                element: sample.element.clone(),
                ratio: round_to(ratio, 1),
                grade: ContrastGrade::from_ratio(ratio, thresholds.min_contrast_ratio),
                passes: ratio >= thresholds.min_contrast_ratio,
            }
        })
        .collect();

    ContrastSummary {
        worst_ratio: results.iter().map(|r| r.ratio).reduce(f64::min),
        all_pass: results.iter().all(|r| r.passes),
        samples: results,
    }
}

/// Score one rendered slide and raise its flags.
pub fn analyze_slide(slide: &RenderedSlide, thresholds: &DesignThresholds) -> SlideDesign {
    let ratio = slide.typography_ratio();
    let hierarchy = HierarchyGrade::from_ratio(ratio);
    let balance = weight_distribution(&slide.elements, thresholds);
    let contrast = score_contrast(&slide.contrast, thresholds);
    let (aligned, alignment_score) = grid_alignment(&slide.elements, thresholds);

    let mut flags = Vec::new();
    if matches!(hierarchy, HierarchyGrade::Poor | HierarchyGrade::VeryPoor) {
        flags.push(
            Flag::new(
                FlagKind::PoorHierarchy,
                format!("Typography hierarchy is {} (ratio: {:.2})", hierarchy.as_str(), ratio),
            )
            .with_severity(Severity::High)
            .with_measurement(round_to(ratio, 2)),
        );
    }
    if balance.score < thresholds.min_balance_score {
        flags.push(
            Flag::new(
                FlagKind::ImbalancedLayout,
                format!(
                    "Layout is {} and {}",
                    balance.horizontal.as_str(),
                    balance.vertical.as_str()
                ),
            )
            .with_severity(Severity::Medium)
            .with_value(round_to(balance.score, 2), thresholds.min_balance_score),
        );
    }
    if let Some(worst) = contrast.worst_ratio.filter(|_| !contrast.all_pass) {
        let failed = contrast.samples.iter().filter(|s| !s.passes).count();
        let severity = if worst < SEVERE_CONTRAST {
            Severity::High
        } else {
            Severity::Medium
        };
        flags.push(
            Flag::new(
                FlagKind::ContrastIssue,
                format!(
                    "{} element(s) have insufficient contrast (min ratio: {})",
                    failed, worst
                ),
            )
            .with_severity(severity)
            .with_value(worst, thresholds.min_contrast_ratio),
        );
    }
    let alignment_percent = round_half_up(alignment_score * 100.0) as u32;
    if alignment_score < thresholds.min_grid_alignment {
        flags.push(
            Flag::new(
                FlagKind::GridMisalignment,
                format!("Only {}% of elements align to grid", alignment_percent),
            )
            .with_severity(Severity::Low)
            .with_value(round_to(alignment_score, 2), thresholds.min_grid_alignment),
        );
    }

    SlideDesign {
        index: slide.index,
        title: slide.title.clone(),
        theme: slide.theme.clone(),
        layout: slide.layout.clone(),
        typography: Typography {
            heading_size: slide.heading_size,
            body_size: slide.body_size,
            ratio,
            hierarchy_score: HierarchyScore {
                score: hierarchy,
                value: hierarchy.value(),
            },
        },
        balance,
        layout_classification: classify_layout(&slide.elements, thresholds),
        contrast,
        grid_alignment: GridAlignment {
            score: alignment_percent,
            aligned_elements: aligned,
            total_elements: slide.elements.len(),
        },
        element_count: slide.elements.len(),
        flags: flags.into_iter().map(|f| f.at_slide(slide.index)).collect(),
    }
}

fn spread(values: &[f64]) -> Option<(f64, f64)> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;
    Some((min, max))
}

/// Compare slides that share a layout.
pub fn analyze_consistency(slides: &[SlideDesign], thresholds: &DesignThresholds) -> Consistency {
    let mut by_layout: BTreeMap<String, Vec<&SlideDesign>> = BTreeMap::new();
    for slide in slides {
        by_layout.entry(slide.layout.clone()).or_default().push(slide);
    }

    let mut issues = Vec::new();
    for (layout, group) in &by_layout {
        if group.len() < 2 {
            continue;
        }

        let heading_sizes: Vec<f64> = group
            .iter()
            .map(|s| s.typography.heading_size)
            .filter(|size| *size > 0.0)
            .collect();
        if heading_sizes.len() > 1 {
            if let Some((min, max)) = spread(&heading_sizes) {
                let variance = max - min;
                if variance > thresholds.typography_variance {
                    let severity = if variance > thresholds.typography_variance_high {
                        Severity::High
                    } else {
                        Severity::Medium
                    };
                    issues.push(
                        Flag::new(
                            FlagKind::TypographyVariance,
                            format!(
                                "Heading sizes vary by {:.1}px across {} slides",
                                variance, layout
                            ),
                        )
                        .with_severity(severity)
                        .with_value(round_to(variance, 1), thresholds.typography_variance),
                    );
                }
            }
        }

        let counts: Vec<f64> = group.iter().map(|s| s.element_count as f64).collect();
        if let Some((min, max)) = spread(&counts) {
            if max - min > thresholds.element_count_variance {
                issues.push(
                    Flag::new(
                        FlagKind::ElementCountVariance,
                        format!(
                            "Element counts vary significantly in {} slides ({}-{})",
                            layout, min, max
                        ),
                    )
                    .with_severity(Severity::Low)
                    .with_value(max - min, thresholds.element_count_variance),
                );
            }
        }
    }

    Consistency {
        layout_distribution: by_layout
            .iter()
            .map(|(layout, group)| (layout.clone(), group.len()))
            .collect(),
        issues,
    }
}

/// Score a rendered deck: per-slide checks, then cross-slide consistency.
pub fn analyze_deck(rendered: &RenderedDeck, config: &AnalysisConfig) -> DesignReport {
    let thresholds = &config.design;
    let slides: Vec<SlideDesign> = rendered
        .slides
        .iter()
        .map(|slide| analyze_slide(slide, thresholds))
        .collect();
    let consistency = analyze_consistency(&slides, thresholds);

    let flags: Vec<Flag> = slides
        .iter()
        .flat_map(|s| s.flags.iter().cloned())
        .chain(consistency.issues.iter().cloned())
        .collect();

    let mut by_type = BTreeMap::new();
    let mut by_severity = BTreeMap::new();
    for flag in &flags {
        *by_type.entry(flag.kind).or_insert(0) += 1;
        if let Some(severity) = flag.severity {
            *by_severity.entry(severity).or_insert(0) += 1;
        }
    }

    log::debug!(
        "Design quality: {} of {} slides analyzed, {} flags",
        slides.len(),
        rendered.slide_count,
        flags.len()
    );

    DesignReport {
        deck_url: rendered.deck_url.clone(),
        slide_count: rendered.slide_count,
        analyzed_slides: slides.len(),
        slides,
        consistency,
        summary: DesignSummary {
            total_flags: flags.len(),
            by_type,
            by_severity,
        },
        flags,
    }
}
