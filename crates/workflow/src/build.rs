//! Narrative build preparation: ingest resources and package the prompt the
//! model follows to write `slides.md` and `narrative-context.json`.

use crate::artifacts;
use crate::ingest::{self, Ingestion};
use crate::workrun::WorkRun;
use chrono::{DateTime, Utc};
use keynote_core::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeBuildPrompt {
    pub deck_path: String,
    pub created_at: DateTime<Utc>,
    pub ingestion_path: String,
    pub narrative_context_path: String,
    pub prompt: String,
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub ingestion_path: PathBuf,
    pub prompt_path: PathBuf,
    pub work_run_path: PathBuf,
}

pub fn build_prompt(ingestion: &Ingestion, ingestion_path: &Path, narrative_context_path: &Path) -> String {
    let title = ingestion.deck_field("title").unwrap_or("Untitled");
    let entity = ingestion.deck_field("entity").unwrap_or("unknown");
    let deck_type = ingestion.deck_field("deckType").unwrap_or("unspecified");

    [
        "You are the Narrative Engine for keynote slides.".to_string(),
        "Model decides; code executes. Do not hardcode decisions in code.".to_string(),
        String::new(),
        format!("Deck title: {}", title),
        format!("Deck entity: {}", entity),
        format!("Deck type: {}", deck_type),
        String::new(),
        "Inputs:".to_string(),
        format!("- Resource ingestion: {}", ingestion_path.display()),
        format!(
            "- Existing narrative context (if any): {}",
            narrative_context_path.display()
        ),
        String::new(),
        "Workflow:".to_string(),
        "1) Confirm output format: presentation (default).".to_string(),
        "2) Focal discovery: propose 2-3 focal statements and ask the user to pick.".to_string(),
        "3) Ask discovery questions one at a time: audience, purpose, content type, tone, reveal."
            .to_string(),
        "4) Ask density mode: High-Impact, Narrative, or Evidence.".to_string(),
        "5) Recommend 2-3 frameworks (arc + communication).".to_string(),
        "6) Ask for length: short, medium, or full.".to_string(),
        "7) Generate slides.md with: headline, spotlight, design note, source tag.".to_string(),
        "8) Write narrative-context.json with decisions and rationale.".to_string(),
        "9) Build generation-queue.json for visuals to generate.".to_string(),
        String::new(),
        "Source tags: [DIRECT], [PARAPHRASE], [ELABORATED], [SYNTHESIZED], [GENERATED].".to_string(),
        String::new(),
        "References:".to_string(),
        "- skills/keynote-slides/references/narrative-engine/framework-selection.md".to_string(),
        "- skills/keynote-slides/references/narrative-engine/framework_selection_guide.md"
            .to_string(),
        "- skills/keynote-slides/references/narrative-engine/narrative-arcs.md".to_string(),
        "- skills/keynote-slides/references/narrative-engine/communication-frameworks.md"
            .to_string(),
        "- skills/keynote-slides/references/narrative-engine/checklists.md".to_string(),
    ]
    .join("\n")
}

/// Write `ingestion.json`, `narrative-build-prompts.json`, and a prepared
/// `narrative-build` work run.
pub fn prepare_build(deck_dir: &Path) -> Result<BuildOutcome> {
    let ingestion = ingest::ingest(deck_dir)?;

    let ingestion_path = artifacts::material(deck_dir, artifacts::INGESTION);
    let prompt_path = artifacts::material(deck_dir, artifacts::NARRATIVE_BUILD_PROMPTS);
    let narrative_context_path = deck_dir.join("narrative-context.json");

    artifacts::write_json(&ingestion_path, &ingestion)?;

    let created_at = Utc::now();
    let payload = NarrativeBuildPrompt {
        deck_path: deck_dir.display().to_string(),
        created_at,
        ingestion_path: ingestion_path.display().to_string(),
        narrative_context_path: narrative_context_path.display().to_string(),
        prompt: build_prompt(&ingestion, &ingestion_path, &narrative_context_path),
    };
    artifacts::write_json(&prompt_path, &payload)?;

    let work_run_path = WorkRun::prepared("narrative-build", deck_dir, created_at)
        .with_input("ingestionPath", &ingestion_path)
        .with_input("promptPath", &prompt_path)
        .save(deck_dir)?;

    Ok(BuildOutcome {
        ingestion_path,
        prompt_path,
        work_run_path,
    })
}
