//! Human-readable console output for each command.

use keynote_analysis::{
    ArcReport, DensityReport, DesignReport, ImageReport, NarrativeReport, ReadabilityReport,
};
use keynote_core::{Flag, Severity};
use keynote_workflow::aggregate::letter_grade;
use keynote_workflow::prompts::EXECUTION_ORDER;
use keynote_workflow::{Analyzer, BuildOutcome, DeckAnalysisReport, ReviewOutcome};
use std::path::Path;

const MAX_COMPLEX_SENTENCES: usize = 10;

fn rule(width: usize) -> String {
    "=".repeat(width)
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Ten-cell bar plus percentage and letter grade.
fn score_bar(score: Option<u32>) -> String {
    match score {
        Some(score) => {
            let filled = ((score as f64 / 10.0).round() as usize).min(10);
            format!(
                "{}{} {}% ({})",
                "█".repeat(filled),
                "░".repeat(10 - filled),
                score,
                letter_grade(score)
            )
        }
        None => "N/A".to_string(),
    }
}

fn tally_bar(score: usize) -> String {
    if score == 0 {
        "-".to_string()
    } else {
        "|".repeat(score.min(10))
    }
}

fn print_flags(indent: &str, flags: &[Flag]) {
    for flag in flags {
        println!("{}- {}", indent, flag.message);
    }
}

pub fn readability(report: &ReadabilityReport) {
    println!("\nReadability Analysis: {}", report.deck_path);
    println!("{}", rule(50));
    println!("\nSlides: {}", report.slide_count);
    println!("Total words: {}", report.total_words);
    println!("Total sentences: {}", report.total_sentences);

    let average = &report.deck_average;
    println!("\n--- Deck Averages ---");
    if let Some(grade) = average.flesch_kincaid_grade {
        println!("Flesch-Kincaid Grade: {} (target: <10)", grade);
    }
    if let Some(length) = average.avg_sentence_length {
        println!("Avg sentence length: {} words", length);
    }
    println!("Passive voice: {}% (target: <20%)", average.passive_voice_percent);
    println!("Jargon density: {}% (target: <5%)", average.jargon_density);

    if !report.deck_flags.is_empty() {
        println!("\n--- Deck Flags ---");
        print_flags("  ", &report.deck_flags);
    }

    let flagged: Vec<_> = report.slides.iter().filter(|s| !s.flags.is_empty()).collect();
    if !flagged.is_empty() {
        println!("\n--- Slide Flags ---");
        for slide in flagged {
            println!("\nSlide {}: {}", slide.index, slide.title);
            println!(
                "  Words: {}, Grade: {}",
                slide.word_count,
                or_na(slide.flesch_kincaid_grade)
            );
            print_flags("  ", &slide.flags);

            let mut terms: Vec<&str> = Vec::new();
            for jargon in &slide.jargon {
                if !terms.contains(&jargon.term.as_str()) {
                    terms.push(&jargon.term);
                }
            }
            if !terms.is_empty() {
                let more = if terms.len() > 5 { "..." } else { "" };
                terms.truncate(5);
                println!("  Jargon: {}{}", terms.join(", "), more);
            }
        }
    }

    if !report.complex_sentences.is_empty() {
        println!("\n--- Complex Sentences ---");
        for entry in report.complex_sentences.iter().take(MAX_COMPLEX_SENTENCES) {
            println!("\nSlide {} ({}):", entry.slide, entry.slide_title);
            println!("  \"{}\"", entry.sentence.text);
            println!("  Issues: {}", entry.sentence.issues.join(", "));
        }
        if report.complex_sentences.len() > MAX_COMPLEX_SENTENCES {
            println!(
                "\n  ... and {} more",
                report.complex_sentences.len() - MAX_COMPLEX_SENTENCES
            );
        }
    }

    println!("\n{}", rule(50));
    println!(
        "Summary: {} flags across {} slides",
        report.summary.total_flags, report.summary.slides_with_flags
    );
    println!("Complex sentences: {}", report.summary.total_complex_sentences);
    if report.summary.total_flags == 0 {
        println!("No readability issues detected!");
    }
}

pub fn density(report: &DensityReport) {
    println!("\nVisual Density Analysis: {}", report.deck_path);
    println!("{}", rule(50));
    println!("\nSlides: {}", report.slide_count);

    let averages = &report.deck_averages;
    println!("\nDeck Averages:");
    println!("  Words per slide: {}", averages.avg_word_count);
    println!("  Characters per slide: {}", averages.avg_char_count);
    println!("  Bullets/items per slide: {}", averages.avg_bullet_count);
    println!("  Visuals per slide: {}", averages.avg_visual_count);
    println!("  Content density: {}%", averages.avg_content_density);
    println!("  Whitespace estimate: {}%", averages.avg_whitespace);

    println!("\nPer-Slide Metrics:");
    for slide in &report.slides {
        let marker = if slide.flags.is_empty() { "" } else { " [!]" };
        let m = &slide.metrics;
        println!(
            "\n  Slide {}: {} ({}){}",
            slide.index,
            slide.title,
            slide.layout.as_str(),
            marker
        );
        println!("    Words: {} | Chars: {}", m.word_count, m.char_count);
        println!("    Bullets: {} | Visuals: {}", m.bullet_count, m.visual_count);
        println!("    Text:Visual ratio: {}", m.text_to_visual_ratio);
        println!(
            "    Content density: {}% | Whitespace: {}%",
            m.content_density, m.whitespace_estimate
        );
        if !slide.flags.is_empty() {
            println!("    Flags:");
            print_flags("      ", &slide.flags);
        }
    }

    println!("\n{}", rule(50));
    println!(
        "Summary: {} flags across {} slides",
        report.flag_summary.total_flags, report.flag_summary.slides_with_flags
    );
    if report.flag_summary.total_flags == 0 {
        println!("No density flags detected.");
    }
}

const BODY_PREVIEW_CHARS: usize = 60;

pub fn images(report: &ImageReport) {
    let summary = &report.summary;
    println!("\nImage Analysis: {}", report.deck_path);
    println!("{}", rule(50));
    println!(
        "\nSlides: {} total, {} with images, {} text-only",
        summary.total_slides, summary.slides_with_images, summary.text_only_slides
    );
    println!(
        "Images: {} total, {} with alt text, {} with prompts",
        summary.total_images, summary.images_with_alt, summary.images_with_prompt
    );
    if summary.slides_with_empty_frames > 0 {
        println!("\nEmpty media frames: {}", summary.slides_with_empty_frames);
    }

    println!("\n--- Per-Slide Breakdown ---\n");
    for slide in &report.slides {
        println!("Slide {}: {}", slide.index, slide.title);
        if let Some(headline) = &slide.text_context.headline {
            println!("  Headline: \"{}\"", headline);
        }

        if slide.is_text_only {
            println!("  [TEXT-ONLY] No images on this slide");
            if slide.has_empty_media_frame {
                println!("  [EMPTY FRAME] Has media placeholder without content");
            }
        }
        for image in &slide.images {
            let name = image.filename.as_deref().or(image.src.as_deref());
            println!("  Image: {}", name.unwrap_or("(no source)"));
            match image.alt.as_deref().filter(|_| image.has_alt) {
                Some(alt) => println!("    Alt: \"{}\"", alt),
                None => println!("    Alt: [MISSING]"),
            }
            if let Some(prompt) = &image.data_prompt {
                println!("    Prompt: \"{}\"", prompt);
            }
            let framed = if image.in_media_frame { "yes" } else { "no (standalone)" };
            println!("    In media-frame: {}", framed);
        }

        if let Some(body) = slide.text_context.body_text.first() {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            println!("  Body text: \"{}...\"", preview);
        }
        println!();
    }

    println!("{}", rule(50));
}

pub fn arc(report: &ArcReport) {
    println!("\nEmotional Arc Analysis: {}", report.deck_path);
    println!("{}", rule(50));
    println!("\nSlides: {}", report.slide_count);

    let hooks = &report.hook_analysis;
    println!("\n--- HOOK ANALYSIS ---");
    println!("Overall Hook Grade: {}", hooks.overall_grade.as_str().to_uppercase());
    for hook in &hooks.opening_slides {
        println!("\nSlide {}: \"{}\"", hook.slide_index, hook.headline);
        println!("  Type: {}", hook.hook_type.as_str());
        println!("  Grade: {}", hook.grade.as_str());
        let indicators = if hook.indicators.is_empty() {
            "none".to_string()
        } else {
            hook.indicators.join(", ")
        };
        println!("  Indicators: {}", indicators);
        println!("  Notes: {}", hook.reasons.join("; "));
    }

    let emotional = &report.emotional_arc;
    println!("\n--- EMOTIONAL ARC ---");
    println!("Shape: {}", emotional.arc_shape.shape.as_str());
    println!("Assessment: {}", emotional.arc_shape.description);
    if let Some(metrics) = &emotional.arc_shape.metrics {
        println!("\nPer-section metrics:");
        for (label, third) in [
            ("First third: ", &metrics.first_third),
            ("Middle third:", &metrics.middle_third),
            ("Last third:  ", &metrics.last_third),
        ] {
            println!(
                "  {} Tension {:.2}, Resolution {:.2}",
                label, third.tension, third.resolution
            );
        }
    }

    println!("\nPer-slide breakdown:");
    for slide in &emotional.per_slide {
        println!("  {}. {}", slide.slide_index, slide.title);
        println!(
            "     Tension: {} ({}) {}",
            tally_bar(slide.tension.score),
            slide.tension.score,
            slide.tension.words.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        );
        println!(
            "     Resolution: {} ({}) {}",
            tally_bar(slide.resolution.score),
            slide.resolution.score,
            slide.resolution.words.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        );
        if !slide.stakes.indicators.is_empty() {
            println!(
                "     Stakes: {}",
                slide.stakes.indicators.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
            );
        }
    }

    let flow = &report.flow_chain;
    println!("\n--- FLOW CHAIN (\"So What?\" Analysis) ---");
    println!("Assessment: {}", flow.assessment);
    if flow.gaps.is_empty() {
        println!("No significant flow gaps detected.");
    } else {
        println!("\nDisconnects found:");
        for gap in &flow.gaps {
            println!("  Slide {} -> {}: {}", gap.from_slide, gap.to_slide, gap.issue);
            println!("    \"{}\" -> \"{}\"", gap.from_title, gap.to_title);
            println!("    Suggestion: {}", gap.suggestion);
        }
    }

    println!("\n--- RECOMMENDATIONS ---");
    if report.summary.recommendations.is_empty() {
        println!("  Emotional arc looks solid!");
    } else {
        for (i, rec) in report.summary.recommendations.iter().enumerate() {
            println!("  {}. {}", i + 1, rec);
        }
    }
    println!("\n{}", rule(50));
}

pub fn narrative(report: &NarrativeReport) {
    println!("\nNarrative Review: {}", report.deck_path);
    println!("{}", rule(50));
    println!("\nSlides: {}", report.slide_count);

    println!("\nNarrative Arc:");
    for entry in &report.narrative_arc {
        println!(
            "  {}. [{}] {}",
            entry.index,
            entry.role.as_str().to_uppercase(),
            entry.title
        );
    }

    if !report.narrative_issues.is_empty() {
        println!("\nNarrative Issues:");
        for issue in &report.narrative_issues {
            println!("  - {}", issue);
        }
    }
    if !report.flow_issues.is_empty() {
        println!("\nFlow Issues:");
        for issue in &report.flow_issues {
            println!("  - {}", issue);
        }
    }
    if !report.redundancies.is_empty() {
        println!("\nPotential Redundancies:");
        for r in &report.redundancies {
            println!(
                "  - Slides {} & {}: {}% similar",
                r.slides[0], r.slides[1], r.similarity
            );
            println!("    (\"{}\" / \"{}\")", r.titles[0], r.titles[1]);
        }
    }

    let with_issues: Vec<_> = report.slides.iter().filter(|s| !s.issues.is_empty()).collect();
    if !with_issues.is_empty() {
        println!("\nSlide-Level Issues:");
        for slide in with_issues {
            println!("  Slide {} ({}):", slide.index, slide.title);
            for issue in &slide.issues {
                println!("    - {}", issue.message);
            }
        }
    }

    println!("\n{}", rule(50));
    println!(
        "Summary: {} issues across {} slides",
        report.summary.total_issues, report.summary.slides_with_issues
    );
    if report.summary.total_issues == 0 {
        println!("No issues detected - narrative looks solid!");
    }
}

pub fn design(report: &DesignReport, deck_dir: &Path) {
    println!("Design Quality Report: {}", deck_dir.display());
    println!("{}", rule(60));
    println!(
        "\nSlides Analyzed: {}/{}",
        report.analyzed_slides, report.slide_count
    );

    println!("\n--- Layout Distribution ---");
    for (layout, count) in &report.consistency.layout_distribution {
        println!("  {}: {} slide(s)", layout, count);
    }

    println!("\n--- Slide Analysis ---\n");
    for slide in &report.slides {
        println!("Slide {}: {}", slide.index, slide.title);
        println!(
            "  Theme: {} | Layout: {} ({})",
            slide.theme,
            slide.layout,
            slide.layout_classification.as_str()
        );
        println!(
            "  Typography: {} (ratio {:.2})",
            slide.typography.hierarchy_score.score.as_str(),
            slide.typography.ratio
        );
        println!(
            "  Balance: {}/{} (score: {:.0}%)",
            slide.balance.horizontal.as_str(),
            slide.balance.vertical.as_str(),
            slide.balance.score * 100.0
        );
        println!("  Grid Alignment: {}%", slide.grid_alignment.score);
        if let Some(worst) = slide.contrast.worst_ratio {
            let verdict = if slide.contrast.all_pass { "Pass" } else { "FAIL" };
            println!("  Contrast: {} (min ratio: {})", verdict, worst);
        }
        println!();
    }

    if report.flags.is_empty() {
        println!("\nNo design issues flagged.");
    } else {
        println!("--- Flags ---\n");
        for (severity, marker) in [
            (Severity::High, "!!!"),
            (Severity::Medium, "!!"),
            (Severity::Low, "!"),
        ] {
            let flags: Vec<_> = report
                .flags
                .iter()
                .filter(|f| f.severity == Some(severity))
                .collect();
            if flags.is_empty() {
                continue;
            }
            println!(
                "[{}] {} ({}):",
                marker,
                severity.as_str().to_uppercase(),
                flags.len()
            );
            for flag in flags {
                let place = match flag.slide_index {
                    Some(index) => format!("Slide {}", index),
                    None => "Global".to_string(),
                };
                println!("  - {}: {}", place, flag.message);
            }
            println!();
        }
    }

    println!("{}", rule(60));
    println!("Summary: {} flag(s)", report.summary.total_flags);
}

/// One line per analyzer: OK, ERROR, or SKIPPED.
pub fn analyzer_status(report: &DeckAnalysisReport, design_enabled: bool) {
    for analyzer in Analyzer::ALL {
        let status = if analyzer == Analyzer::DesignQuality && !design_enabled {
            "SKIPPED (use --serve)".to_string()
        } else {
            match report.error_for(analyzer) {
                Some(error) => format!("ERROR: {}", error),
                None => "OK".to_string(),
            }
        };
        println!("  {:<18} {}", analyzer.name(), status);
    }
}

pub fn summary(report: &DeckAnalysisReport) {
    let summary = &report.summary;
    let signals = &summary.north_star_signals;

    println!("\n{}", rule(60));
    println!("DECK REVIEW SUMMARY: {}", report.deck_path);
    println!("{}", rule(60));

    println!("\n--- NORTH STAR ALIGNMENT ---\n");
    println!("  Compelling Storytelling:    {}", score_bar(signals.storytelling));
    println!("  Clear Messaging:            {}", score_bar(signals.clarity));
    println!("  Beautiful Design:           {}", score_bar(signals.design));
    println!("  Image > Text Balance:       {}", score_bar(signals.visual_balance));
    println!();
    println!(
        "  OVERALL (heuristic): {} ({}%)",
        or_na(summary.overall.heuristic_grade.as_deref()),
        or_na(summary.overall.heuristic_score)
    );

    if !summary.overall.flags.is_empty() {
        println!("\n--- SIGNALS (model decides priority) ---\n");
        for (i, flag) in summary.overall.flags.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, flag.category.as_str(), flag.message);
            if let Some(slides) = &flag.slides {
                let list: Vec<String> = slides.iter().map(|s| s.to_string()).collect();
                println!("     Slides: {}", list.join(", "));
            }
            for detail in flag.details.iter().flatten() {
                println!("     - {}", detail);
            }
        }
    }

    println!("\n--- QUICK STATS ---\n");
    let digests = &summary.by_category;
    if let Some(vd) = &digests.visual_density {
        println!(
            "  Avg words/slide: {} | Avg visuals/slide: {}",
            vd.avg_words_per_slide, vd.avg_visuals_per_slide
        );
    }
    if let Some(ia) = &digests.image_analysis {
        println!(
            "  Images: {} | Missing alt: {} | Empty frames: {}",
            ia.total_images, ia.images_missing_alt, ia.slides_with_empty_frames
        );
    }
    if let Some(rd) = &digests.readability {
        println!(
            "  Reading grade: {} | Jargon: {:.1}%",
            rd.avg_grade_level
                .map(|g| format!("{:.1}", g))
                .unwrap_or_else(|| "N/A".to_string()),
            rd.jargon_density
        );
    }
    if let Some(ea) = &digests.emotional_arc {
        println!(
            "  Hook: {} | Arc: {} | Flow gaps: {}",
            ea.hook_grade.as_str(),
            ea.arc_shape.as_str(),
            ea.flow_gaps
        );
    }
    println!("\n{}", rule(60));
}

pub fn review(outcome: &ReviewOutcome) {
    println!("{}", rule(50));
    println!("Review preparation complete!\n");
    println!("Slides: {}", outcome.slide_count);
    if outcome.context_reused {
        println!("Using existing context from {}", outcome.context_path.display());
    }

    let digest = &outcome.digest;
    if outcome.analysis.is_some() {
        let signals = &digest.north_star_signals;
        println!("\n--- AUTOMATED ANALYSIS SUMMARY ---");
        println!(
            "   Overall Grade: {} ({}%)",
            or_na(digest.overall_grade.as_deref()),
            or_na(digest.overall_score)
        );
        println!("   Storytelling:   {}%", or_na(signals.storytelling));
        println!("   Clarity:        {}%", or_na(signals.clarity));
        println!("   Visual Balance: {}%", or_na(signals.visual_balance));
        println!("   Design:         {}%", or_na(signals.design));
        if !digest.analysis_flags.is_empty() {
            println!("\n   Signals: {}", digest.analysis_flags.len());
            for flag in &digest.analysis_flags {
                println!("     - {}", flag.message);
            }
        }
        for error in &digest.errors {
            println!("   {} failed: {}", error.analyzer, error.error);
        }
    }

    println!("\nPrompts saved to: {}", outcome.prompts_path.display());
    println!("Context saved to: {}", outcome.context_path.display());
    println!("Analysis summary saved to: {}", outcome.summary_path.display());
    if let Some(path) = &outcome.analysis_path {
        println!("Full analysis saved to: {}", path.display());
    }
    println!("Work run saved to: {}", outcome.work_run_path.display());

    println!("\n--- AGENT EXECUTION ORDER ---");
    for (i, step) in EXECUTION_ORDER.iter().enumerate() {
        println!("{}. {}", i + 1, step);
    }
}

pub fn build(outcome: &BuildOutcome) {
    println!("Model-mediated narrative build prepared.");
    println!("Ingestion saved to: {}", outcome.ingestion_path.display());
    println!("Prompt saved to: {}", outcome.prompt_path.display());
    println!("Work run saved to: {}", outcome.work_run_path.display());
    println!("Next: run the prompt in the model to generate slides.md and narrative-context.json.");
}

/// Print the conformance result; true when nothing is missing.
pub fn conformance(missing: &[String]) -> bool {
    if missing.is_empty() {
        println!("Conformance OK.");
        return true;
    }
    println!("Conformance failed. Missing:");
    for item in missing {
        println!("- {}", item);
    }
    false
}

pub fn wizard_next_steps(deck_dir: &Path) {
    println!("\n{}", rule(60));
    println!("DECK CREATED SUCCESSFULLY");
    println!("{}", rule(60));
    println!("\nDeck directory: {}", deck_dir.display());
    println!("\nNext steps:");
    println!("  1. Review slides.md for the outline");
    println!("  2. Use image-prompts.md to generate visuals");
    println!("  3. Analyze with: keynote review-all {}", deck_dir.display());
    println!("  4. Review with: keynote review {}", deck_dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bar() {
        assert_eq!(score_bar(Some(84)), "████████░░ 84% (B)");
        assert_eq!(score_bar(Some(100)), "██████████ 100% (A)");
        assert_eq!(score_bar(Some(0)), "░░░░░░░░░░ 0% (F)");
        assert_eq!(score_bar(None), "N/A");
    }

    #[test]
    fn test_tally_bar() {
        assert_eq!(tally_bar(0), "-");
        assert_eq!(tally_bar(3), "|||");
        assert_eq!(tally_bar(14), "|".repeat(10));
    }

    #[test]
    fn test_conformance_result() {
        assert!(conformance(&[]));
        assert!(!conformance(&["resources/materials/ingestion.json".to_string()]));
    }
}
