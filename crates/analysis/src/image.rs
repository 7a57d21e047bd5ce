//! Image inventory: which slides carry images, whether those images have
//! alt text and generation prompts, and the text each image sits beside.
//!
//! Gathers facts only; whether an image is meaningful is judged downstream.

use keynote_core::{Deck, MarkupNormalizer, SlideRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static IMG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img[^>]*>").unwrap());

static SRC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)src=["']([^"']+)["']"#).unwrap());

static ALT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)alt=["']([^"']*)["']"#).unwrap());

static PROMPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)data-prompt=["']([^"']*)["']"#).unwrap());

static GEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)data-gen=["']([^"']*)["']"#).unwrap());

static H1_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<h1[^>]*class="[^"]*title[^"]*"[^>]*>(.*?)</h1>"#).unwrap()
});

static H2_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<h2[^>]*class="[^"]*(?:section-title|title)[^"]*"[^>]*>(.*?)</h2>"#)
        .unwrap()
});

static EYEBROW_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*class="[^"]*eyebrow[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});

static BODY_TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<p[^>]*class="[^"]*(?:body-text|subtitle)[^"]*"[^>]*>(.*?)</p>"#).unwrap()
});

static QUOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<p[^>]*class="[^"]*quote[^"]*"[^>]*>(.*?)</p>"#).unwrap()
});

static CHIP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*class="[^"]*chip[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});

static CARD_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*class="[^"]*card-title[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub src: Option<String>,
    pub alt: Option<String>,
    /// Last path segment of `src`; often descriptive.
    pub filename: Option<String>,
    pub data_prompt: Option<String>,
    pub data_gen: Option<String>,
    pub in_media_frame: bool,
    pub has_alt: bool,
}

/// Text around the images, for judging whether they fit the slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContext {
    pub headline: Option<String>,
    pub eyebrow: Option<String>,
    pub body_text: Vec<String>,
    pub quote: Option<String>,
    pub chips: Vec<String>,
    pub card_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideImages {
    pub index: usize,
    pub title: String,
    pub images: Vec<ImageRecord>,
    pub text_context: TextContext,
    pub is_text_only: bool,
    /// A media placeholder that was never filled.
    pub has_empty_media_frame: bool,
    pub image_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub total_slides: usize,
    pub slides_with_images: usize,
    pub text_only_slides: usize,
    pub slides_with_empty_frames: usize,
    pub total_images: usize,
    pub images_with_alt: usize,
    pub images_missing_alt: usize,
    pub images_with_prompt: usize,
    pub images_in_media_frame: usize,
    pub standalone_images: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReport {
    pub deck_path: String,
    pub summary: ImageSummary,
    pub slides: Vec<SlideImages>,
}

impl ImageReport {
    /// Slides with at least one image lacking alt text.
    pub fn slides_missing_alt(&self) -> Vec<usize> {
        self.slides
            .iter()
            .filter(|s| s.images.iter().any(|i| !i.has_alt))
            .map(|s| s.index)
            .collect()
    }

    pub fn slides_with_empty_frames(&self) -> Vec<usize> {
        self.slides
            .iter()
            .filter(|s| s.has_empty_media_frame)
            .map(|s| s.index)
            .collect()
    }
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
    regex.captures(text).map(|caps| caps[1].to_string())
}

/// An image is framed when the nearest `media-frame` before it opens after
/// the last closed `<div>`.
fn in_media_frame(before: &str) -> bool {
    before.rfind("media-frame") > before.rfind("</div>")
}

fn extract_images(markup: &str, normalizer: &MarkupNormalizer) -> Vec<ImageRecord> {
    IMG_REGEX
        .find_iter(markup)
        .map(|m| {
            let tag = m.as_str();
            let src = capture(&SRC_REGEX, tag);
            let alt = capture(&ALT_REGEX, tag).map(|a| normalizer.attribute_text(&a));
            let filename = src
                .as_deref()
                .and_then(|s| s.rsplit('/').next())
                .map(str::to_string);

            ImageRecord {
                has_alt: alt.as_deref().is_some_and(|a| !a.trim().is_empty()),
                filename,
                src,
                alt,
                data_prompt: capture(&PROMPT_REGEX, tag).map(|p| normalizer.attribute_text(&p)),
                data_gen: capture(&GEN_REGEX, tag),
                in_media_frame: in_media_frame(&markup[..m.start()]),
            }
        })
        .collect()
}

fn all_text(regex: &Regex, markup: &str, normalizer: &MarkupNormalizer) -> Vec<String> {
    regex
        .captures_iter(markup)
        .map(|caps| normalizer.inline_text(&caps[1]))
        .filter(|text| !text.is_empty())
        .collect()
}

fn extract_text_context(markup: &str, normalizer: &MarkupNormalizer) -> TextContext {
    let first = |regex: &Regex| {
        regex
            .captures(markup)
            .map(|caps| normalizer.inline_text(&caps[1]))
    };

    TextContext {
        headline: first(&H1_TITLE_REGEX).or_else(|| first(&H2_TITLE_REGEX)),
        eyebrow: first(&EYEBROW_REGEX),
        body_text: all_text(&BODY_TEXT_REGEX, markup, normalizer),
        quote: first(&QUOTE_REGEX),
        chips: all_text(&CHIP_REGEX, markup, normalizer)
            .into_iter()
            .filter(|chip| !chip.contains("chip-row"))
            .collect(),
        card_titles: all_text(&CARD_TITLE_REGEX, markup, normalizer),
    }
}

/// Inventory the images on one slide.
pub fn analyze_slide(slide: &SlideRecord) -> SlideImages {
    let normalizer = MarkupNormalizer::new();
    let markup = &slide.raw_markup;
    let images = extract_images(markup, &normalizer);

    SlideImages {
        index: slide.index,
        title: slide.title.clone(),
        text_context: extract_text_context(markup, &normalizer),
        is_text_only: images.is_empty(),
        has_empty_media_frame: markup.contains("media-placeholder")
            && !markup.contains(r#"data-ready="true""#),
        image_count: images.len(),
        images,
    }
}

pub fn analyze_deck(deck: &Deck) -> ImageReport {
    let slides: Vec<SlideImages> = deck.slides.iter().map(analyze_slide).collect();
    let images: Vec<&ImageRecord> = slides.iter().flat_map(|s| s.images.iter()).collect();

    let images_with_alt = images.iter().filter(|i| i.has_alt).count();
    let images_in_media_frame = images.iter().filter(|i| i.in_media_frame).count();

    let summary = ImageSummary {
        total_slides: slides.len(),
        slides_with_images: slides.iter().filter(|s| s.image_count > 0).count(),
        text_only_slides: slides.iter().filter(|s| s.is_text_only).count(),
        slides_with_empty_frames: slides.iter().filter(|s| s.has_empty_media_frame).count(),
        total_images: images.len(),
        images_with_alt,
        images_missing_alt: images.len() - images_with_alt,
        images_with_prompt: images.iter().filter(|i| i.data_prompt.is_some()).count(),
        images_in_media_frame,
        standalone_images: images.len() - images_in_media_frame,
    };

    log::debug!(
        "Image analysis: {} images on {} of {} slides",
        summary.total_images,
        summary.slides_with_images,
        summary.total_slides
    );

    ImageReport {
        deck_path: deck.deck_path.clone(),
        summary,
        slides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keynote_core::{Layout, Theme};

    fn slide(index: usize, raw_markup: &str) -> SlideRecord {
        SlideRecord {
            index,
            title: format!("Slide {}", index),
            headline: String::new(),
            content: String::new(),
            raw_markup: raw_markup.to_string(),
            layout: Layout::Split,
            theme: Theme::Ivory,
        }
    }

    const FRAMED: &str = r#"
        <h2 class="title">Pilots cut onboarding time in half</h2>
        <p class="body-text">Eleven teams, three markets.</p>
        <div class="media-frame" data-ready="true">
          <img class="gen-media" src="resources/assets/pilot-map.png" alt="Map of pilot sites"
               data-prompt="Editorial map of three regions" data-gen="image">
        </div>
    "#;

    #[test]
    fn test_framed_image_with_alt_and_prompt() {
        let result = analyze_slide(&slide(1, FRAMED));
        assert_eq!(result.image_count, 1);
        assert!(!result.is_text_only);
        assert!(!result.has_empty_media_frame);

        let image = &result.images[0];
        assert_eq!(image.filename.as_deref(), Some("pilot-map.png"));
        assert_eq!(image.alt.as_deref(), Some("Map of pilot sites"));
        assert_eq!(image.data_prompt.as_deref(), Some("Editorial map of three regions"));
        assert_eq!(image.data_gen.as_deref(), Some("image"));
        assert!(image.in_media_frame);
        assert!(image.has_alt);
    }

    #[test]
    fn test_standalone_image_missing_alt() {
        let markup = r#"<div class="card">Team</div><img src='logo.svg' alt="  ">"#;
        let image = &analyze_slide(&slide(1, markup)).images[0];
        assert!(!image.in_media_frame);
        assert!(!image.has_alt);
        assert_eq!(image.src.as_deref(), Some("logo.svg"));
        assert_eq!(image.data_prompt, None);
    }

    #[test]
    fn test_empty_media_frame() {
        let markup = r#"<div class="media-frame"><div class="media-placeholder">Chart</div></div>"#;
        let result = analyze_slide(&slide(1, markup));
        assert!(result.is_text_only);
        assert!(result.has_empty_media_frame);

        let ready = r#"<div class="media-frame" data-ready="true"><div class="media-placeholder"></div></div>"#;
        assert!(!analyze_slide(&slide(2, ready)).has_empty_media_frame);
    }

    #[test]
    fn test_text_context() {
        let markup = r#"
            <div class="eyebrow">Q3 results</div>
            <h1 class="title">Revenue <em>doubled</em></h1>
            <p class="subtitle">Across every region</p>
            <p class="body-text"></p>
            <p class="quote">We finally shipped</p>
            <div class="chip">Growth</div>
            <div class="card-title">EMEA</div>
        "#;
        let context = analyze_slide(&slide(1, markup)).text_context;
        assert_eq!(context.headline.as_deref(), Some("Revenue doubled"));
        assert_eq!(context.eyebrow.as_deref(), Some("Q3 results"));
        assert_eq!(context.body_text, vec!["Across every region".to_string()]);
        assert_eq!(context.quote.as_deref(), Some("We finally shipped"));
        assert_eq!(context.chips, vec!["Growth".to_string()]);
        assert_eq!(context.card_titles, vec!["EMEA".to_string()]);
    }

    #[test]
    fn test_deck_summary() {
        let mut deck = Deck::new("decks/demo");
        deck.add_slide(slide(1, FRAMED));
        deck.add_slide(slide(2, r#"<img src="a.png">"#));
        deck.add_slide(slide(3, "<p>Just words</p>"));

        let report = analyze_deck(&deck);
        let summary = &report.summary;
        assert_eq!(summary.total_slides, 3);
        assert_eq!(summary.slides_with_images, 2);
        assert_eq!(summary.text_only_slides, 1);
        assert_eq!(summary.total_images, 2);
        assert_eq!(summary.images_with_alt, 1);
        assert_eq!(summary.images_missing_alt, 1);
        assert_eq!(summary.images_with_prompt, 1);
        assert_eq!(summary.images_in_media_frame, 1);
        assert_eq!(summary.standalone_images, 1);
        assert_eq!(report.slides_missing_alt(), vec![2]);
        assert!(report.slides_with_empty_frames().is_empty());
    }
}
