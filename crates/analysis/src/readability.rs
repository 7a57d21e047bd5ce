//! Readability scoring: Flesch-Kincaid grade, passive voice, and jargon.

use crate::stats::{mean, round_to, truncate_chars};
use keynote_core::{AnalysisConfig, Deck, Flag, FlagKind, ReadabilityThresholds, SlideRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Context window searched for an acronym's spelled-out form.
const EXPANSION_WINDOW_CHARS: usize = 100;

/// Complex sentences longer than this are truncated in reports.
const SENTENCE_PREVIEW_CHARS: usize = 100;

static SENTENCE_SPLIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

static SILENT_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[^laeiouy]es|ed|[^laeiouy]e)$").unwrap());

static LEADING_Y_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^y").unwrap());

static VOWEL_GROUP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[aeiouy]+").unwrap());

static PASSIVE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(is|are|was|were|been|being|be)\s+(\w+ed)\b",
        r"(?i)\b(is|are|was|were|been|being|be)\s+(\w+en)\b",
        r"(?i)\b(is|are|was|were|been|being|be)\s+(built|made|done|given|taken|shown|known|seen|found|thought|told|held|brought|bought|caught|taught|sent|spent|left|lost|met|paid|sold|read|written|driven|spoken|chosen|broken|frozen|stolen|worn|torn|born|drawn|grown|thrown|blown|flown|hidden|ridden|bitten|eaten|beaten|forgotten|forgiven)\b",
        r"(?i)\b(get|gets|got|gotten|getting)\s+(\w+ed)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static BUZZWORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(synerg|leverage|paradigm|holistic|scalable|robust|seamless|disrupt|ideate|actionable|incentivize|optimize|streamline|empower|innovate|pivot|ecosystem|bandwidth|circle back|deep dive|low-hanging fruit|move the needle|best practice|game-?changer|value-?add|thought leader|core competenc|stakeholder|deliverable|proactive|take offline|double-?click|unpack)\w*\b").unwrap()
});

static ACRONYM_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}\b").unwrap());

static TECH_TERM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(API|SDK|SaaS|IaaS|PaaS|DevOps|CI/CD|microservice|containeriz|kubernetes|serverless|blockchain|machine learning|neural network|algorithm|backend|frontend|middleware|deployment|integration|infrastructure|architecture|repository|framework|runtime|endpoint)\w*\b").unwrap()
});

/// Acronyms audiences are expected to know.
const COMMON_ACRONYMS: &[&str] = &[
    "CEO", "CFO", "CTO", "COO", "VP", "USA", "UK", "EU", "UN", "FBI", "CIA", "NASA", "HTML",
    "CSS", "PDF", "URL", "FAQ", "DIY", "ASAP", "FYI", "TBD", "AM", "PM", "TV", "DVD", "USB",
    "GPS", "ATM", "PIN", "ID", "HR", "PR", "VS", "EG", "IE", "OK", "PS", "AD", "BC", "AI", "IT",
    "VR", "AR",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JargonKind {
    Buzzword,
    Acronym,
    Technical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JargonTerm {
    pub term: String,
    #[serde(rename = "type")]
    pub kind: JargonKind,
}

/// A passive-voice occurrence and its byte offset in the slide text.
#[derive(Debug, Clone, PartialEq)]
struct PassiveMatch {
    text: String,
    offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexSentence {
    pub text: String,
    pub word_count: usize,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideComplexSentence {
    pub slide: usize,
    pub slide_title: String,
    #[serde(flatten)]
    pub sentence: ComplexSentence,
}

/// Readability metrics for one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideReadability {
    pub index: usize,
    pub title: String,
    pub word_count: usize,
    pub sentence_count: usize,
    /// `None` when the slide has no sentences or no words.
    pub flesch_kincaid_grade: Option<f64>,
    pub avg_sentence_length: Option<f64>,
    pub avg_word_length: Option<f64>,
    pub avg_syllables_per_word: Option<f64>,
    pub passive_voice: Vec<String>,
    pub passive_voice_percent: f64,
    pub jargon: Vec<JargonTerm>,
    pub jargon_density: f64,
    pub complex_sentences: Vec<ComplexSentence>,
    pub flags: Vec<Flag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityAverages {
    pub flesch_kincaid_grade: Option<f64>,
    pub avg_sentence_length: Option<f64>,
    pub passive_voice_percent: f64,
    pub jargon_density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilitySummary {
    pub slides_with_flags: usize,
    pub total_flags: usize,
    pub total_complex_sentences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityReport {
    pub deck_path: String,
    pub slide_count: usize,
    pub total_words: usize,
    pub total_sentences: usize,
    pub deck_average: ReadabilityAverages,
    pub deck_flags: Vec<Flag>,
    pub slides: Vec<SlideReadability>,
    pub complex_sentences: Vec<SlideComplexSentence>,
    pub summary: ReadabilitySummary,
}

/// Estimate syllables with a vowel-group heuristic.
pub fn count_syllables(word: &str) -> usize {
    let word: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    if word.len() <= 2 {
        return 1;
    }

    let trimmed = SILENT_SUFFIX_REGEX.replace(&word, "");
    let trimmed = LEADING_Y_REGEX.replace(&trimmed, "");

    VOWEL_GROUP_REGEX.find_iter(&trimmed).count().max(1)
}

/// Split text into sentences and purely alphabetic lowercase words.
fn tokenize(text: &str) -> (Vec<String>, Vec<String>) {
    let sentences = SENTENCE_SPLIT_REGEX
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let words = text
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_string)
        .collect();

    (sentences, words)
}

/// Find passive constructions, keeping the first match at each offset.
fn find_passive_voice(text: &str) -> Vec<PassiveMatch> {
    let mut seen = HashSet::new();
    let mut passives = Vec::new();

    for pattern in PASSIVE_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            if seen.insert(m.start()) {
                passives.push(PassiveMatch {
                    text: m.as_str().to_string(),
                    offset: m.start(),
                });
            }
        }
    }

    passives
}

/// Whether an acronym is spelled out shortly before it appears.
fn is_expanded(text: &str, acronym: &str, position: usize) -> bool {
    let before = &text[..position];
    let window_start = before
        .char_indices()
        .rev()
        .nth(EXPANSION_WINDOW_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let context = &before[window_start..];

    let letters: Vec<String> = acronym.chars().map(|c| c.to_string()).collect();
    let pattern = format!(r"(?i)\b{}", letters.join(r"\w*\s+"));

    Regex::new(&pattern)
        .map(|re| re.is_match(context))
        .unwrap_or(false)
}

fn find_jargon(text: &str) -> Vec<JargonTerm> {
    let mut jargon: Vec<JargonTerm> = BUZZWORD_REGEX
        .find_iter(text)
        .map(|m| JargonTerm {
            term: m.as_str().to_string(),
            kind: JargonKind::Buzzword,
        })
        .collect();

    for m in ACRONYM_REGEX.find_iter(text) {
        let acronym = m.as_str();
        if COMMON_ACRONYMS.contains(&acronym) || is_expanded(text, acronym, m.start()) {
            continue;
        }
        jargon.push(JargonTerm {
            term: acronym.to_string(),
            kind: JargonKind::Acronym,
        });
    }

    jargon.extend(TECH_TERM_REGEX.find_iter(text).map(|m| JargonTerm {
        term: m.as_str().to_string(),
        kind: JargonKind::Technical,
    }));

    jargon
}

fn complex_sentences(sentences: &[String], max_words: usize) -> Vec<ComplexSentence> {
    sentences
        .iter()
        .filter_map(|sentence| {
            let word_count = sentence.split_whitespace().count();
            let is_long = word_count > max_words;
            let passive = find_passive_voice(sentence);

            if !is_long && passive.is_empty() {
                return None;
            }

            let mut issues = Vec::new();
            if is_long {
                issues.push(format!("Long sentence (>{} words)", max_words));
            }
            if let Some(first) = passive.first() {
                issues.push(format!("Passive voice: \"{}\"", first.text));
            }

            Some(ComplexSentence {
                text: truncate_chars(sentence, SENTENCE_PREVIEW_CHARS),
                word_count,
                issues,
            })
        })
        .collect()
}

/// Score a single slide's plain text.
pub fn analyze_slide(slide: &SlideRecord, thresholds: &ReadabilityThresholds) -> SlideReadability {
    let (sentences, words) = tokenize(&slide.content);

    if words.is_empty() {
        return SlideReadability {
            index: slide.index,
            title: slide.title.clone(),
            word_count: 0,
            sentence_count: 0,
            flesch_kincaid_grade: None,
            avg_sentence_length: None,
            avg_word_length: None,
            avg_syllables_per_word: None,
            passive_voice: Vec::new(),
            passive_voice_percent: 0.0,
            jargon: Vec::new(),
            jargon_density: 0.0,
            complex_sentences: Vec::new(),
            flags: Vec::new(),
        };
    }

    let word_total = words.len() as f64;
    let total_syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let total_characters: usize = words.iter().map(|w| w.len()).sum();

    let avg_sentence_length = if sentences.is_empty() {
        word_total
    } else {
        word_total / sentences.len() as f64
    };
    let avg_syllables_per_word = total_syllables as f64 / word_total;
    let avg_word_length = total_characters as f64 / word_total;

    let grade = (!sentences.is_empty())
        .then(|| 0.39 * avg_sentence_length + 11.8 * avg_syllables_per_word - 15.59);

    let passive = find_passive_voice(&slide.content);
    let passive_percent = if sentences.is_empty() {
        0.0
    } else {
        passive.len() as f64 / sentences.len() as f64 * 100.0
    };

    let jargon = find_jargon(&slide.content);
    let jargon_density = jargon.len() as f64 / word_total * 100.0;

    let mut flags = Vec::new();
    if let Some(g) = grade.filter(|g| *g > thresholds.max_grade_level) {
        flags.push(
            Flag::new(
                FlagKind::HighGradeLevel,
                format!("High grade level: {:.1} (target: <{})", g, thresholds.max_grade_level),
            )
            .with_value(round_to(g, 2), thresholds.max_grade_level)
            .at_slide(slide.index),
        );
    }
    if passive_percent > thresholds.max_passive_percent {
        flags.push(
            Flag::new(
                FlagKind::HighPassiveVoice,
                format!(
                    "High passive voice: {:.0}% (target: <{}%)",
                    passive_percent, thresholds.max_passive_percent
                ),
            )
            .with_value(round_to(passive_percent, 1), thresholds.max_passive_percent)
            .at_slide(slide.index),
        );
    }
    if jargon_density > thresholds.max_jargon_percent {
        flags.push(
            Flag::new(
                FlagKind::HighJargonDensity,
                format!(
                    "High jargon density: {:.1}% (target: <{}%)",
                    jargon_density, thresholds.max_jargon_percent
                ),
            )
            .with_value(round_to(jargon_density, 2), thresholds.max_jargon_percent)
            .at_slide(slide.index),
        );
    }

    SlideReadability {
        index: slide.index,
        title: slide.title.clone(),
        word_count: words.len(),
        sentence_count: sentences.len(),
        flesch_kincaid_grade: grade.map(|g| round_to(g, 2)),
        avg_sentence_length: Some(round_to(avg_sentence_length, 2)),
        avg_word_length: Some(round_to(avg_word_length, 2)),
        avg_syllables_per_word: Some(round_to(avg_syllables_per_word, 2)),
        passive_voice: passive.into_iter().map(|p| p.text).collect(),
        passive_voice_percent: round_to(passive_percent, 1),
        jargon,
        jargon_density: round_to(jargon_density, 2),
        complex_sentences: complex_sentences(&sentences, thresholds.max_sentence_words),
        flags,
    }
}

/// Score every slide and average across slides that contain words.
pub fn analyze_deck(deck: &Deck, config: &AnalysisConfig) -> ReadabilityReport {
    let thresholds = &config.readability;
    let slides: Vec<SlideReadability> = deck
        .slides
        .iter()
        .map(|slide| analyze_slide(slide, thresholds))
        .collect();

    let with_content: Vec<&SlideReadability> = slides.iter().filter(|s| s.word_count > 0).collect();
    let total_words: usize = with_content.iter().map(|s| s.word_count).sum();
    let total_sentences: usize = with_content.iter().map(|s| s.sentence_count).sum();

    let grades: Vec<f64> = with_content
        .iter()
        .filter_map(|s| s.flesch_kincaid_grade)
        .collect();
    let avg_grade = mean(&grades);
    let passive: Vec<f64> = with_content.iter().map(|s| s.passive_voice_percent).collect();
    let avg_passive = mean(&passive).unwrap_or(0.0);
    let jargon: Vec<f64> = with_content.iter().map(|s| s.jargon_density).collect();
    let avg_jargon = mean(&jargon).unwrap_or(0.0);

    let mut deck_flags = Vec::new();
    if let Some(g) = avg_grade.filter(|g| *g > thresholds.max_grade_level) {
        deck_flags.push(
            Flag::new(FlagKind::HighGradeLevel, format!("Average grade level high: {:.1}", g))
                .with_value(round_to(g, 2), thresholds.max_grade_level),
        );
    }
    if avg_passive > thresholds.max_passive_percent {
        deck_flags.push(
            Flag::new(
                FlagKind::HighPassiveVoice,
                format!("Average passive voice high: {:.0}%", avg_passive),
            )
            .with_value(round_to(avg_passive, 1), thresholds.max_passive_percent),
        );
    }
    if avg_jargon > thresholds.max_jargon_percent {
        deck_flags.push(
            Flag::new(
                FlagKind::HighJargonDensity,
                format!("Average jargon density high: {:.1}%", avg_jargon),
            )
            .with_value(round_to(avg_jargon, 2), thresholds.max_jargon_percent),
        );
    }

    let complex_sentences: Vec<SlideComplexSentence> = slides
        .iter()
        .flat_map(|s| {
            s.complex_sentences.iter().map(move |cs| SlideComplexSentence {
                slide: s.index,
                slide_title: s.title.clone(),
                sentence: cs.clone(),
            })
        })
        .collect();

    let summary = ReadabilitySummary {
        slides_with_flags: slides.iter().filter(|s| !s.flags.is_empty()).count(),
        total_flags: slides.iter().map(|s| s.flags.len()).sum(),
        total_complex_sentences: complex_sentences.len(),
    };

    log::debug!(
        "Readability: {} words, {} sentences, {} flags",
        total_words,
        total_sentences,
        summary.total_flags
    );

    ReadabilityReport {
        deck_path: deck.deck_path.clone(),
        slide_count: deck.slide_count(),
        total_words,
        total_sentences,
        deck_average: ReadabilityAverages {
            flesch_kincaid_grade: avg_grade.map(|g| round_to(g, 2)),
            avg_sentence_length: (total_sentences > 0)
                .then(|| round_to(total_words as f64 / total_sentences as f64, 2)),
            passive_voice_percent: round_to(avg_passive, 1),
            jargon_density: round_to(avg_jargon, 2),
        },
        deck_flags,
        slides,
        complex_sentences,
        summary,
    }
}
