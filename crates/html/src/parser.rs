//! Deck document parser implementation.

use keynote_core::{Deck, Error, Layout, MarkupNormalizer, Result, SlideRecord, Theme};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// File name of the deck document inside a deck directory.
pub const DECK_DOCUMENT: &str = "index.html";

static SECTION_START_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<section\b[^>]*>").unwrap());

static SECTION_END_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</section\s*>").unwrap());

static ATTRIBUTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:-]+)\s*=\s*"([^"]*)""#).unwrap());

static HEADLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<h[12][^>]*class="[^"]*title[^"]*"[^>]*>(.*?)</h[12]>"#).unwrap()
});

/// Parser for keynote-style HTML decks.
///
/// A slide container is a `<section>` whose class list carries the `slide`
/// token and which has a `data-title` attribute. The body runs to the next
/// `</section>`.
pub struct DeckParser {
    normalizer: MarkupNormalizer,
}

impl DeckParser {
    /// Create a new deck parser.
    pub fn new() -> Self {
        Self {
            normalizer: MarkupNormalizer::new(),
        }
    }

    /// Use a custom normalizer for slide text.
    pub fn with_normalizer(mut self, normalizer: MarkupNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Extract slides from a deck document in document order.
    ///
    /// Returns an empty vector when no container is found. Unclosed
    /// containers are skipped.
    pub fn parse(&self, html: &str) -> Vec<SlideRecord> {
        let mut slides = Vec::new();
        let mut cursor = 0;

        while let Some(start) = SECTION_START_REGEX.find_at(html, cursor) {
            cursor = start.end();

            let attributes = parse_attributes(start.as_str());
            let Some(title) = attribute(&attributes, "data-title") else {
                continue;
            };
            let class_attr = attribute(&attributes, "class").unwrap_or_default();
            if !class_attr.split_whitespace().any(|c| c == "slide") {
                continue;
            }

            let Some(end) = SECTION_END_REGEX.find_at(html, start.end()) else {
                log::warn!("Skipping unclosed slide container \"{}\"", title);
                break;
            };
            let body = &html[start.end()..end.start()];

            if SECTION_START_REGEX.is_match(body) {
                log::warn!("Skipping unclosed slide container \"{}\"", title);
                continue;
            }

            let index = slides.len() + 1;
            slides.push(self.build_slide(index, &title, &class_attr, body));
            cursor = end.end();
        }

        log::debug!("Extracted {} slides", slides.len());
        slides
    }

    fn build_slide(&self, index: usize, title: &str, class_attr: &str, body: &str) -> SlideRecord {
        let title = self.normalizer.attribute_text(title);

        let headline = HEADLINE_REGEX
            .captures(body)
            .map(|caps| self.normalizer.inline_text(&caps[1]))
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| title.clone());

        SlideRecord {
            index,
            headline,
            content: self.normalizer.to_text(body),
            raw_markup: body.to_string(),
            layout: Layout::from_markup(body),
            theme: Theme::from_class(class_attr),
            title,
        }
    }
}

impl Default for DeckParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and parse `<deck_dir>/index.html`.
pub fn load_deck(deck_dir: &Path) -> Result<Deck> {
    let html_path = deck_dir.join(DECK_DOCUMENT);
    if !html_path.is_file() {
        return Err(Error::DeckNotFound(html_path));
    }

    let html = std::fs::read_to_string(&html_path)?;
    let slides = DeckParser::new().parse(&html);
    if slides.is_empty() {
        return Err(Error::NoSlides);
    }

    let mut deck = Deck::new(deck_dir.to_string_lossy());
    for slide in slides {
        deck.add_slide(slide);
    }
    Ok(deck)
}

fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    ATTRIBUTE_REGEX
        .captures_iter(tag)
        .map(|caps| (caps[1].to_lowercase(), caps[2].to_string()))
        .collect()
}

fn attribute(attributes: &[(String, String)], name: &str) -> Option<String> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SLIDES: &str = r#"<!doctype html>
<html><body><main>
  <section class="slide theme-ink" data-title="Opening">
    <div class="slide-inner layout-title">
      <h1 class="title">Why <em>now</em>?</h1>
      <p>Three markets moved at once.</p>
    </div>
  </section>
  <section class="slide" data-title="Details">
    <div class="slide-inner layout-split">
      <style>.x { color: red }</style>
      <p>Plain text &amp; more</p>
      <script>window.hidden = true;</script>
    </div>
  </section>
</main></body></html>"#;

    #[test]
    fn test_parse_two_slides() {
        let slides = DeckParser::new().parse(TWO_SLIDES);
        assert_eq!(slides.len(), 2);

        assert_eq!(slides[0].index, 1);
        assert_eq!(slides[0].title, "Opening");
        assert_eq!(slides[0].headline, "Why now?");
        assert_eq!(slides[0].layout, Layout::Title);
        assert_eq!(slides[0].theme, Theme::Ink);
        assert_eq!(slides[0].content, "Why now ? Three markets moved at once.");

        assert_eq!(slides[1].index, 2);
        assert_eq!(slides[1].headline, "Details");
        assert_eq!(slides[1].layout, Layout::Split);
        assert_eq!(slides[1].theme, Theme::Ivory);
        assert_eq!(slides[1].content, "Plain text & more");
        assert!(slides[1].raw_markup.contains("<script>"));
    }

    #[test]
    fn test_zero_slides() {
        let slides = DeckParser::new().parse("<html><body><p>nothing</p></body></html>");
        assert!(slides.is_empty());
    }

    #[test]
    fn test_section_without_title_or_slide_class_is_ignored() {
        let html = r#"
            <section class="slide">no title</section>
            <section class="slides" data-title="Wrong">wrong class</section>
            <section class="intro slide" data-title="Kept"><p>kept</p></section>
        "#;
        let slides = DeckParser::new().parse(html);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "Kept");
        assert_eq!(slides[0].index, 1);
    }

    #[test]
    fn test_unclosed_container_is_skipped() {
        let html = r#"
            <section class="slide" data-title="Broken"><p>never closed</p>
            <section class="slide" data-title="Good"><p>fine</p></section>
        "#;
        let slides = DeckParser::new().parse(html);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "Good");
    }

    #[test]
    fn test_trailing_unclosed_container() {
        let html = r#"<section class="slide" data-title="A">a</section>
            <section class="slide" data-title="B">b"#;
        let slides = DeckParser::new().parse(html);
        assert_eq!(slides.len(), 1);
    }

    #[test]
    fn test_attribute_order_does_not_matter() {
        let html = r#"<section data-title="Q&amp;A" class="slide"><p>Questions</p></section>"#;
        let slides = DeckParser::new().parse(html);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "Q&A");
    }

    #[test]
    fn test_load_deck_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_deck(dir.path()).unwrap_err();
        assert!(matches!(err, Error::DeckNotFound(_)));
    }

    #[test]
    fn test_load_deck_without_slides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DECK_DOCUMENT), "<html></html>").unwrap();
        let err = load_deck(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoSlides));
    }

    #[test]
    fn test_load_deck() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DECK_DOCUMENT), TWO_SLIDES).unwrap();
        let deck = load_deck(dir.path()).unwrap();
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.overview(), "1. Opening\n2. Details");
    }
}
