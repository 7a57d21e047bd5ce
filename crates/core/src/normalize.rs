//! Markup-to-text normalization for slide bodies.
//!
//! Strips scripts, styles and tags, decodes the handful of entities decks
//! actually use, and collapses whitespace so that every analyzer sees the
//! same plain text.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static SCRIPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());

static STYLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Any entity left after the named ones are decoded.
static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#?\w+;").unwrap());

static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Named entities decoded to their character.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#039;", "'"),
    ("&#39;", "'"),
];

/// Decoded last so that `&amp;lt;` stays literal text.
const AMPERSAND_ENTITY: &str = "&amp;";

/// Converts slide markup into plain text.
#[derive(Debug, Clone)]
pub struct MarkupNormalizer {
    /// Whether to apply NFKC compatibility normalization.
    unicode_compat: bool,
}

impl Default for MarkupNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupNormalizer {
    /// Create a normalizer with NFKC normalization enabled.
    pub fn new() -> Self {
        Self {
            unicode_compat: true,
        }
    }

    /// Set whether to apply NFKC normalization (folds ligatures, non-breaking
    /// spaces, full-width digits).
    pub fn with_unicode_compat(mut self, enabled: bool) -> Self {
        self.unicode_compat = enabled;
        self
    }

    /// Render markup as a single line of plain text.
    ///
    /// `&amp;` and the other named entities decode to their character, so
    /// `R&amp;D` counts as one three-character word for every analyzer,
    /// density included. Other entities become a space.
    pub fn to_text(&self, markup: &str) -> String {
        let without_scripts = SCRIPT_REGEX.replace_all(markup, "");
        let without_styles = STYLE_REGEX.replace_all(&without_scripts, "");
        let without_tags = TAG_REGEX.replace_all(&without_styles, " ");

        let decoded = self.decode_entities(&without_tags);
        let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&decoded, " ");
        collapsed.trim().to_string()
    }

    /// Strip tags from an inline fragment such as a heading, without the
    /// script/style pass.
    pub fn inline_text(&self, fragment: &str) -> String {
        let without_tags = TAG_REGEX.replace_all(fragment, "");
        let decoded = self.decode_entities(&without_tags);
        let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&decoded, " ");
        collapsed.trim().to_string()
    }

    /// Decode an attribute value (entities only, no whitespace changes).
    pub fn attribute_text(&self, value: &str) -> String {
        let mut result = value.to_string();
        for (entity, replacement) in NAMED_ENTITIES {
            result = result.replace(entity, replacement);
        }
        result.replace(AMPERSAND_ENTITY, "&")
    }

    fn decode_entities(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (entity, replacement) in NAMED_ENTITIES {
            result = result.replace(entity, replacement);
        }

        // Unknown entities read as word breaks.
        result = ENTITY_REGEX
            .replace_all(&result, |caps: &regex::Captures| {
                if &caps[0] == AMPERSAND_ENTITY {
                    caps[0].to_string()
                } else {
                    " ".to_string()
                }
            })
            .into_owned();
        result = result.replace(AMPERSAND_ENTITY, "&");

        if self.unicode_compat {
            result.nfkc().collect()
        } else {
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_to_spaces() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(
            normalizer.to_text("<h1>Hello</h1><p>world</p>"),
            "Hello world"
        );
    }

    #[test]
    fn test_removes_scripts_and_styles_with_content() {
        let normalizer = MarkupNormalizer::new();
        let markup = r#"<style>.a { color: red; }</style><p>Visible</p>
            <script type="module">console.log("hidden");</script>"#;
        assert_eq!(normalizer.to_text(markup), "Visible");
    }

    #[test]
    fn test_decodes_named_entities() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(normalizer.to_text("R&amp;D&nbsp;costs"), "R&D costs");
        assert_eq!(normalizer.to_text("a &lt; b &gt; c"), "a < b > c");
    }

    #[test]
    fn test_unknown_entities_become_spaces() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(normalizer.to_text("one&mdash;two"), "one two");
        assert_eq!(normalizer.to_text("x&#8217;y"), "x y");
    }

    #[test]
    fn test_double_escaped_stays_literal() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(normalizer.to_text("&amp;lt;tag"), "&lt;tag");
    }

    #[test]
    fn test_collapses_whitespace() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(
            normalizer.to_text("  <p>a\n\n   b\t c</p>  "),
            "a b c"
        );
    }

    #[test]
    fn test_nfkc_folds_ligatures() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(normalizer.to_text("\u{FB01}nal"), "final");

        let raw = MarkupNormalizer::new().with_unicode_compat(false);
        assert_eq!(raw.to_text("\u{FB01}nal"), "\u{FB01}nal");
    }

    #[test]
    fn test_inline_text_joins_fragments() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(
            normalizer.inline_text("Revenue <em>grew</em> 3x"),
            "Revenue grew 3x"
        );
    }

    #[test]
    fn test_attribute_text() {
        let normalizer = MarkupNormalizer::new();
        assert_eq!(normalizer.attribute_text("Q&amp;A"), "Q&A");
    }
}
