//! Work-run records: one JSON file per prepared stage, kept as an audit trail.

use crate::artifacts;
use chrono::{DateTime, SecondsFormat, Utc};
use keynote_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRun {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub deck_path: String,
    /// Artifact name to path.
    pub inputs: BTreeMap<String, String>,
}

impl WorkRun {
    /// A run in the `prepared` state.
    pub fn prepared(kind: &str, deck_path: &Path, created_at: DateTime<Utc>) -> Self {
        Self {
            id: run_id(kind, created_at),
            kind: kind.to_string(),
            status: "prepared".to_string(),
            created_at,
            deck_path: deck_path.display().to_string(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, name: &str, path: &Path) -> Self {
        self.inputs.insert(name.to_string(), path.display().to_string());
        self
    }

    /// Write under `resources/materials/work-runs/`. Existing runs are never
    /// replaced; a clashing id gets a numeric suffix.
    pub fn save(&self, deck_dir: &Path) -> Result<PathBuf> {
        let dir = artifacts::material(deck_dir, artifacts::WORK_RUNS);
        std::fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(self)?;

        let mut attempt = 0;
        loop {
            let name = match attempt {
                0 => format!("{}.json", self.id),
                n => format!("{}-{}.json", self.id, n),
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    log::debug!("Recorded work run {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// `<kind>-<ISO timestamp with ':' and '.' replaced by '-'>`
pub fn run_id(kind: &str, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}-{}", kind, stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 9, 15, 30).unwrap()
    }

    #[test]
    fn test_run_id() {
        assert_eq!(
            run_id("narrative-build", fixed_time()),
            "narrative-build-2026-03-04T09-15-30-000Z"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let run = WorkRun::prepared("deck-review", Path::new("decks/demo"), fixed_time())
            .with_input("promptsPath", Path::new("decks/demo/resources/materials/review-prompts.json"));
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["type"], "deck-review");
        assert_eq!(value["status"], "prepared");
        assert_eq!(value["deckPath"], "decks/demo");
        assert_eq!(value["createdAt"], "2026-03-04T09:15:30Z");
        assert!(value["inputs"]["promptsPath"].is_string());
    }

    #[test]
    fn test_save_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let run = WorkRun::prepared("narrative-build", dir.path(), fixed_time());

        let first = run.save(dir.path()).unwrap();
        let second = run.save(dir.path()).unwrap();
        assert_ne!(first, second);
        assert!(second
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-000Z-1.json"));

        let saved: WorkRun = artifacts::read_json(&first).unwrap();
        assert_eq!(saved, run);
    }
}
