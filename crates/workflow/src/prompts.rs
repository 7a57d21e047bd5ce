//! Agent prompt templates for the antagonistic deck review, and the
//! placeholder filling that turns them into ready-to-run prompts.
//!
//! Templates carry `{token}` markers. Every token is resolved when a review
//! is packaged; tokens that depend on another agent's output resolve to a
//! hand-off note naming that agent.

use crate::interview::InterviewContext;
use crate::review::AnalysisDigest;
use keynote_core::{Deck, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const NO_BRAND_PROFILE: &str = "No brand profile found.";

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([A-Za-z]+)\}").unwrap());

pub struct AgentTemplate {
    pub name: &'static str,
    pub template: &'static str,
}

/// Suggested run order; agents on one line may run in parallel.
pub const EXECUTION_ORDER: [&str; 6] = [
    "narrativeCritic -> narrativeDefender (use critic findings)",
    "claritySceptic + simplicityAdvocate (parallel)",
    "brandGuardian -> creativeChallenger (use guardian findings)",
    "audienceAdvocate + expertPerspective (parallel)",
    "accessibilityAuditor",
    "synthesizer (with all findings + conflicts)",
];

pub const AGENT_TEMPLATES: [AgentTemplate; 10] = [
    AgentTemplate {
        name: "narrativeCritic",
        template: r#"You are the NARRATIVE CRITIC. Your job is to find structural problems.

CONTEXT:
{interviewContext}

DECK OVERVIEW:
{deckOverview}

FLOW GAPS DETECTED BY ANALYSIS:
{flowGaps}

Your perspective: What's BROKEN in the narrative?
- Where does the logic fail or skip steps?
- What's missing that the audience needs?
- Where would someone get lost or confused?
- Does the arc match the goal: {goal}?

Be specific. Cite slide numbers. Explain WHY it's a problem for THIS audience.

ADVERSARIAL CHECK: Before finalizing, ask yourself:
- Am I being too harsh on intentional choices?
- What would the Narrative Defender say?

Report findings as JSON array."#,
    },
    AgentTemplate {
        name: "narrativeDefender",
        template: r#"You are the NARRATIVE DEFENDER. Your job is to find what WORKS.

CONTEXT:
{interviewContext}

DECK OVERVIEW:
{deckOverview}

CRITIC'S FINDINGS:
{criticFindings}

Your perspective: Challenge the critic's findings.
- What might be INTENTIONAL that the critic called a problem?
- What's the throughline the critic missed?
- What works well for THIS specific audience?

Steel-man the deck's choices. Find the best interpretation.

Then: Which critic findings do you AGREE with despite your defense?

Report as JSON with: {"defended": [...], "conceded": [...]}"#,
    },
    AgentTemplate {
        name: "claritySceptic",
        template: r#"You are the CLARITY SKEPTIC. Your job is to find confusion.

CONTEXT:
{interviewContext}

DECK CONTENT:
{deckContent}

Your perspective: What's CONFUSING?
- What jargon would {audience} not understand?
- What assumes knowledge they might not have?
- What's ambiguous or could be misread?
- What would make someone say "wait, what?"

Consider: {audience} with {priorKnowledge}

Report findings as JSON array."#,
    },
    AgentTemplate {
        name: "simplicityAdvocate",
        template: r#"You are the SIMPLICITY ADVOCATE. Your job is to find bloat.

CONTEXT:
{interviewContext}

DECK CONTENT:
{deckContent}

Your perspective: What's UNNECESSARY?
- What can be cut without losing the message?
- What's redundant across slides?
- What's over-explained for {audience}?
- What would a ruthless editor remove?

Given only {duration}, what MUST stay vs what's nice-to-have?

Report findings as JSON array."#,
    },
    AgentTemplate {
        name: "brandGuardian",
        template: r#"You are the BRAND GUARDIAN. Your job is to protect brand consistency.

BRAND PROFILE:
{brandProfile}

DECK CONTENT:
{deckContent}

Your perspective: What VIOLATES brand guidelines?
- Wrong colors, fonts, or visual style?
- Tone of voice inconsistencies?
- Messaging that contradicts brand positioning?

Be specific. Cite exact violations.

Report findings as JSON array."#,
    },
    AgentTemplate {
        name: "creativeChallenger",
        template: r#"You are the CREATIVE CHALLENGER. Your job is to push past safe.

BRAND PROFILE:
{brandProfile}

DECK CONTENT:
{deckContent}

GUARDIAN'S FINDINGS:
{guardianFindings}

Your perspective: What's TOO SAFE?
- Where is the deck boring or forgettable?
- What's missing personality or distinctive voice?
- Where could it take more creative risk?

Challenge the Guardian: Are they being too restrictive?

Report as JSON with: {"tooSafe": [...], "guardianOverreach": [...]}"#,
    },
    AgentTemplate {
        name: "audienceAdvocate",
        template: r#"You ARE the audience. Embody them completely.

YOU ARE: {audiencePersona}

You care about: {audienceCares}
You're skeptical of: {audienceSkeptical}
You have {duration} and {stakes} stakes.

DECK CONTENT:
{deckContent}

React authentically as this person:
- What makes you tune out?
- What do you not care about?
- What's missing that you need?
- What would make you say yes to {goal}?

Don't analyze. EXPERIENCE. Report your genuine reactions."#,
    },
    AgentTemplate {
        name: "expertPerspective",
        template: r#"You represent what the audience ALREADY KNOWS.

AUDIENCE: {audience}
THEIR BACKGROUND: {priorKnowledge}

DECK CONTENT:
{deckContent}

Your perspective: What's PATRONIZING?
- What does {audience} already know that's over-explained?
- What basics are wasting their time?
- Where does the deck underestimate their sophistication?

Also: What does {audience} NOT know that's assumed?

Report findings as JSON array."#,
    },
    AgentTemplate {
        name: "accessibilityAuditor",
        template: r#"You are the ACCESSIBILITY AUDITOR.

DECK VISUAL DESCRIPTIONS:
{visualDescriptions}

DECK CONTENT:
{deckContent}

Check for barriers:
- Color contrast issues?
- Font sizes too small?
- Missing alt text for images?
- Cognitive overload (too much per slide)?
- Animations that could cause issues?
- Content that requires audio/video without alternatives?

Report findings as JSON array with severity levels."#,
    },
    AgentTemplate {
        name: "synthesizer",
        template: r#"You are the SYNTHESIS AGENT. Resolve conflicts and prioritize.

INTERVIEW CONTEXT:
{interviewContext}

AUTOMATED ANALYSIS:
{analysisData}

ALL FINDINGS:
{allFindings}

CONFLICTS:
{conflicts}

Your job:
1. Review all findings from antagonistic agents
2. Resolve conflicts using interview context as tiebreaker
3. Prioritize by impact on the STATED GOAL: {goal}
4. Consider the STAKES: {stakes}
5. Consider the DURATION: {duration}

Output a prioritized action list:
- BLOCKING: Must fix before presenting
- IMPORTANT: Should fix, significant impact
- SUGGESTION: Nice to have, lower priority

For each item: specific slide, what to change, why it matters for {audience}."#,
    },
];

/// Everything a review packages into its prompts.
pub struct PromptInputs<'a> {
    pub context: &'a InterviewContext,
    pub deck: &'a Deck,
    pub brand_profile: &'a str,
    pub analysis: Option<&'a AnalysisDigest>,
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn handoff(agent: &str) -> String {
    format!("[Hand-off: insert the JSON findings produced by the {} agent.]", agent)
}

/// One line per slide describing its layout and visual load.
pub fn visual_descriptions(deck: &Deck, analysis: Option<&AnalysisDigest>) -> String {
    deck.slides
        .iter()
        .map(|slide| {
            let mut line = format!(
                "Slide {} \"{}\": {} layout, {} theme",
                slide.index,
                slide.title,
                slide.layout.as_str(),
                slide.theme.as_str()
            );
            let measured = analysis.and_then(|a| {
                a.per_slide_visual_density
                    .iter()
                    .find(|d| d.index == slide.index)
            });
            if let Some(density) = measured {
                let m = &density.metrics;
                line.push_str(&format!(
                    ", {} words, {} visual(s), {} empty media frame(s)",
                    m.word_count, m.visual_count, m.empty_media_frames
                ));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Values for every token used by [`AGENT_TEMPLATES`].
pub fn placeholder_values(inputs: &PromptInputs<'_>) -> Result<BTreeMap<&'static str, String>> {
    let context = inputs.context;
    let mut values = BTreeMap::new();

    values.insert("interviewContext", serde_json::to_string_pretty(context)?);
    values.insert("deckOverview", inputs.deck.overview());
    values.insert("deckContent", inputs.deck.full_content());
    values.insert("brandProfile", or_default(inputs.brand_profile, NO_BRAND_PROFILE));
    values.insert("audience", or_default(&context.audience, "unknown audience"));
    values.insert("goal", or_default(&context.goal, "unknown goal"));
    values.insert("duration", or_default(&context.duration, "unknown duration"));
    values.insert("stakes", or_default(&context.stakes, "unknown stakes"));
    values.insert(
        "priorKnowledge",
        or_default(context.prior_knowledge.as_deref().unwrap_or(""), "unknown"),
    );
    values.insert("audiencePersona", or_default(&context.audience, "general audience"));
    values.insert("audienceCares", or_default(&context.audience_follow_up, "their goals"));
    values.insert(
        "audienceSkeptical",
        or_default(context.objections.as_deref().unwrap_or(""), "nothing specific"),
    );
    values.insert(
        "visualDescriptions",
        visual_descriptions(inputs.deck, inputs.analysis),
    );

    match inputs.analysis {
        Some(digest) => {
            values.insert("analysisData", serde_json::to_string_pretty(digest)?);
            values.insert("flowGaps", serde_json::to_string_pretty(&digest.flow_gaps)?);
        }
        None => {
            values.insert("analysisData", "No automated analysis was run.".to_string());
            values.insert("flowGaps", "Not analyzed.".to_string());
        }
    }

    values.insert("criticFindings", handoff("narrativeCritic"));
    values.insert("guardianFindings", handoff("brandGuardian"));
    values.insert(
        "allFindings",
        "[Hand-off: insert the JSON findings from every agent that ran before the synthesizer.]"
            .to_string(),
    );
    values.insert(
        "conflicts",
        "[Hand-off: list where paired agents disagree: narrativeCritic vs narrativeDefender, \
         brandGuardian vs creativeChallenger, audienceAdvocate vs expertPerspective.]"
            .to_string(),
    );

    Ok(values)
}

/// Replace every known `{token}` in one pass; substituted text is not rescanned.
pub fn fill(template: &str, values: &BTreeMap<&'static str, String>) -> String {
    TOKEN_REGEX
        .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Fill every agent template; keyed by agent name.
pub fn package(inputs: &PromptInputs<'_>) -> Result<BTreeMap<String, String>> {
    let values = placeholder_values(inputs)?;
    Ok(AGENT_TEMPLATES
        .iter()
        .map(|agent| (agent.name.to_string(), fill(agent.template, &values)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keynote_core::{Layout, SlideRecord, Theme};

    fn sample_deck() -> Deck {
        let mut deck = Deck::new("decks/demo");
        deck.add_slide(SlideRecord {
            index: 1,
            title: "Opening".to_string(),
            headline: "What if onboarding took a day?".to_string(),
            content: "What if onboarding took a day? New hires wait {weeks} today.".to_string(),
            raw_markup: String::new(),
            layout: Layout::Title,
            theme: Theme::Ink,
        });
        deck.add_slide(SlideRecord {
            index: 2,
            title: "Plan".to_string(),
            headline: "Three steps get us there".to_string(),
            content: "Three steps get us there".to_string(),
            raw_markup: String::new(),
            layout: Layout::Split,
            theme: Theme::Ivory,
        });
        deck
    }

    fn has_token(text: &str) -> bool {
        TOKEN_REGEX
            .captures_iter(text)
            .any(|caps| AGENT_TEMPLATES.iter().any(|t| t.template.contains(&caps[0])))
    }

    #[test]
    fn test_every_token_resolved() {
        let deck = sample_deck();
        let mut context = InterviewContext::new(std::path::Path::new("decks/demo"));
        context.set("audience", "engineering managers".to_string());
        context.set("goal", "fund the pilot".to_string());

        let prompts = package(&PromptInputs {
            context: &context,
            deck: &deck,
            brand_profile: "",
            analysis: None,
        })
        .unwrap();

        assert_eq!(prompts.len(), 10);
        for (name, prompt) in &prompts {
            assert!(!has_token(prompt), "{} still has a placeholder", name);
        }
        assert!(prompts["claritySceptic"].contains("What jargon would engineering managers"));
        assert!(prompts["narrativeCritic"].contains("Does the arc match the goal: fund the pilot?"));
        assert!(prompts["narrativeDefender"].contains("narrativeCritic agent"));
        assert!(prompts["narrativeDefender"].contains(r#"{"defended": [...], "conceded": [...]}"#));
    }

    #[test]
    fn test_defaults_for_missing_answers() {
        let deck = sample_deck();
        let context = InterviewContext::default();
        let prompts = package(&PromptInputs {
            context: &context,
            deck: &deck,
            brand_profile: "",
            analysis: None,
        })
        .unwrap();

        assert!(prompts["brandGuardian"].contains(NO_BRAND_PROFILE));
        assert!(prompts["audienceAdvocate"].contains("YOU ARE: general audience"));
        assert!(prompts["audienceAdvocate"].contains("You care about: their goals"));
        assert!(prompts["audienceAdvocate"].contains("You're skeptical of: nothing specific"));
        assert!(prompts["audienceAdvocate"].contains("You have unknown duration and unknown stakes stakes."));
        assert!(prompts["expertPerspective"].contains("THEIR BACKGROUND: unknown"));
        assert!(prompts["synthesizer"].contains("STATED GOAL: unknown goal"));
        assert!(prompts["claritySceptic"].contains("unknown audience"));
    }

    #[test]
    fn test_deck_text_is_not_rescanned() {
        let deck = sample_deck();
        let context = InterviewContext::default();
        let prompts = package(&PromptInputs {
            context: &context,
            deck: &deck,
            brand_profile: "Brand: Northwind",
            analysis: None,
        })
        .unwrap();
        assert!(prompts["simplicityAdvocate"].contains("New hires wait {weeks} today."));
        assert!(prompts["creativeChallenger"].contains("Brand: Northwind"));
    }

    #[test]
    fn test_visual_descriptions_without_analysis() {
        let text = visual_descriptions(&sample_deck(), None);
        assert_eq!(
            text,
            "Slide 1 \"Opening\": title layout, ink theme\nSlide 2 \"Plan\": split layout, ivory theme"
        );
    }
}
