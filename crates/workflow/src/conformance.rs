//! Checks that the build and review stages left their artifacts behind.

use crate::artifacts;
use keynote_core::{Error, Result};
use serde_json::Value;
use std::path::Path;

fn require_file(missing: &mut Vec<String>, deck_dir: &Path, name: &str) -> bool {
    let present = artifacts::material(deck_dir, name).is_file();
    if !present {
        missing.push(format!("resources/materials/{}", name));
    }
    present
}

fn require_work_runs(missing: &mut Vec<String>, deck_dir: &Path) -> Result<()> {
    let dir = artifacts::material(deck_dir, artifacts::WORK_RUNS);
    if !dir.is_dir() {
        missing.push("resources/materials/work-runs".to_string());
        return Ok(());
    }
    let has_json = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.path().extension().is_some_and(|ext| ext == "json"));
    if !has_json {
        missing.push("resources/materials/work-runs (no JSON files)".to_string());
    }
    Ok(())
}

/// Missing narrative build artifacts.
pub fn check_build(deck_dir: &Path) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    require_file(&mut missing, deck_dir, artifacts::INGESTION);
    require_file(&mut missing, deck_dir, artifacts::NARRATIVE_BUILD_PROMPTS);
    require_work_runs(&mut missing, deck_dir)?;
    Ok(missing)
}

/// Missing or malformed review artifacts.
pub fn check_review(deck_dir: &Path) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    let context = require_file(&mut missing, deck_dir, artifacts::REVIEW_CONTEXT);
    let prompts = require_file(&mut missing, deck_dir, artifacts::REVIEW_PROMPTS);
    let summary = require_file(&mut missing, deck_dir, artifacts::ANALYSIS_SUMMARY);

    if context && prompts && summary {
        let path = artifacts::material(deck_dir, artifacts::ANALYSIS_SUMMARY);
        match artifacts::read_json::<Value>(&path) {
            Ok(value) if value.get("analysisFlags").is_some_and(Value::is_array) => {}
            Ok(_) => missing.push("analysis-summary.json (missing analysisFlags)".to_string()),
            Err(Error::ArtifactError { message, .. }) => {
                missing.push(format!("analysis-summary.json (invalid JSON: {})", message))
            }
            Err(e) => return Err(e),
        }
    }

    Ok(missing)
}

/// Build checks, plus review checks when `review` is set.
pub fn check(deck_dir: &Path, review: bool) -> Result<Vec<String>> {
    if !deck_dir.is_dir() {
        return Err(Error::DeckNotFound(deck_dir.to_path_buf()));
    }
    let mut missing = check_build(deck_dir)?;
    if review {
        missing.extend(check_review(deck_dir)?);
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::prepare_build;

    #[test]
    fn test_empty_deck_reports_everything() {
        let dir = tempfile::tempdir().unwrap();
        let missing = check(dir.path(), true).unwrap();
        assert_eq!(
            missing,
            vec![
                "resources/materials/ingestion.json",
                "resources/materials/narrative-build-prompts.json",
                "resources/materials/work-runs",
                "resources/materials/review-context.json",
                "resources/materials/review-prompts.json",
                "resources/materials/analysis-summary.json",
            ]
        );
    }

    #[test]
    fn test_build_conforms_after_prepare() {
        let dir = tempfile::tempdir().unwrap();
        prepare_build(dir.path()).unwrap();
        assert!(check(dir.path(), false).unwrap().is_empty());
    }

    #[test]
    fn test_summary_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        for name in [artifacts::REVIEW_CONTEXT, artifacts::REVIEW_PROMPTS] {
            artifacts::write_json(&artifacts::material(dir.path(), name), &serde_json::json!({}))
                .unwrap();
        }
        let summary = artifacts::material(dir.path(), artifacts::ANALYSIS_SUMMARY);
        artifacts::write_json(&summary, &serde_json::json!({ "northStarSignals": {} })).unwrap();
        assert_eq!(
            check_review(dir.path()).unwrap(),
            vec!["analysis-summary.json (missing analysisFlags)"]
        );

        std::fs::write(&summary, "{").unwrap();
        let missing = check_review(dir.path()).unwrap();
        assert!(missing[0].starts_with("analysis-summary.json (invalid JSON:"));
    }

    #[test]
    fn test_empty_work_runs_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(artifacts::material(dir.path(), artifacts::WORK_RUNS)).unwrap();
        let missing = check_build(dir.path()).unwrap();
        assert!(missing.contains(&"resources/materials/work-runs (no JSON files)".to_string()));
    }

    #[test]
    fn test_missing_deck() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            check(&dir.path().join("nope"), false),
            Err(Error::DeckNotFound(_))
        ));
    }
}
