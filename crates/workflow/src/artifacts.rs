//! Locations and JSON persistence for the files each stage leaves behind.

use keynote_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const FULL_ANALYSIS: &str = "full-analysis.json";
pub const IMAGE_ANALYSIS: &str = "image-analysis.json";
pub const REVIEW_CONTEXT: &str = "review-context.json";
pub const REVIEW_PROMPTS: &str = "review-prompts.json";
pub const ANALYSIS_SUMMARY: &str = "analysis-summary.json";
pub const INGESTION: &str = "ingestion.json";
pub const NARRATIVE_BUILD_PROMPTS: &str = "narrative-build-prompts.json";
pub const IMAGE_PROMPTS: &str = "image-prompts.md";
pub const WORK_RUNS: &str = "work-runs";

/// `<deck>/resources/materials`
pub fn materials_dir(deck_dir: &Path) -> PathBuf {
    deck_dir.join("resources").join("materials")
}

/// `<deck>/resources/assets`
pub fn assets_dir(deck_dir: &Path) -> PathBuf {
    deck_dir.join("resources").join("assets")
}

pub fn material(deck_dir: &Path, name: &str) -> PathBuf {
    materials_dir(deck_dir).join(name)
}

/// Write pretty-printed JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_text(path, &json)
}

pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Read back an artifact written by an earlier stage.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| Error::ArtifactError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Like [`read_json`], but a missing file is `None`.
pub fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}
