//! Resource ingestion: inventories a deck's source materials and assets so a
//! model can synthesize a narrative from them.

use crate::artifacts;
use chrono::{DateTime, Utc};
use keynote_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const TEXT_EXTENSIONS: [&str; 5] = ["md", "txt", "json", "csv", "html"];
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];
const DATA_EXTENSIONS: [&str; 3] = ["csv", "json", "xlsx"];

/// Longest material excerpt included in the model-facing summary.
const MAX_EXCERPT_CHARS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Pdf,
    Data,
    Markdown,
    Text,
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

impl ResourceKind {
    pub fn for_path(path: &Path) -> Self {
        let ext = extension(path);
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            ResourceKind::Image
        } else if ext == "pdf" {
            ResourceKind::Pdf
        } else if DATA_EXTENSIONS.contains(&ext.as_str()) {
            ResourceKind::Data
        } else if ext == "md" {
            ResourceKind::Markdown
        } else {
            ResourceKind::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFile {
    pub filename: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(rename = "sizeKB", default, skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Read failure; the other optional fields are then absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceFile {
    fn new(path: &Path, kind: ResourceKind) -> Self {
        Self {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
            kind,
            size: None,
            modified: None,
            content: None,
            line_count: None,
            word_count: None,
            size_kb: None,
            note: None,
            error: None,
        }
    }

    fn failed(mut self, err: std::io::Error) -> Self {
        self.error = Some(err.to_string());
        self
    }

    fn read_text(path: &Path) -> Self {
        let file = Self::new(path, ResourceKind::for_path(path));
        let (content, metadata) = match std::fs::read_to_string(path)
            .and_then(|content| Ok((content, std::fs::metadata(path)?)))
        {
            Ok(read) => read,
            Err(e) => return file.failed(e),
        };
        Self {
            size: Some(metadata.len()),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            line_count: Some(content.split('\n').count()),
            word_count: Some(content.split_whitespace().count()),
            content: Some(content),
            ..file
        }
    }

    fn read_image(path: &Path) -> Self {
        let file = Self::new(path, ResourceKind::Image);
        match std::fs::metadata(path) {
            Ok(metadata) => Self {
                size: Some(metadata.len()),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                size_kb: Some((metadata.len() + 512) / 1024),
                ..file
            },
            Err(e) => file.failed(e),
        }
    }

    fn note_pdf(path: &Path) -> Self {
        let file = Self::new(path, ResourceKind::Pdf);
        match std::fs::metadata(path) {
            Ok(metadata) => Self {
                size: Some(metadata.len()),
                note: Some("PDF detected - extract text separately if needed".to_string()),
                ..file
            },
            Err(e) => file.failed(e),
        }
    }

    fn name_contains(&self, needle: &str) -> bool {
        self.filename.to_lowercase().contains(needle)
    }
}

/// Recursively collect supported files under `dir`; a missing directory is empty.
pub fn scan_directory(dir: &Path) -> Result<Vec<ResourceFile>> {
    let mut results = Vec::new();
    if !dir.is_dir() {
        return Ok(results);
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            results.extend(scan_directory(&path)?);
            continue;
        }
        let ext = extension(&path);
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            results.push(ResourceFile::read_image(&path));
        } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            results.push(ResourceFile::read_text(&path));
        } else if ext == "pdf" {
            results.push(ResourceFile::note_pdf(&path));
        } else {
            log::debug!("Skipping unsupported resource {}", path.display());
        }
    }

    Ok(results)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsInventory {
    pub count: usize,
    pub total_word_count: usize,
    pub files: Vec<ResourceFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsInventory {
    pub count: usize,
    pub images: Vec<ResourceFile>,
    pub other: Vec<ResourceFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSummary {
    pub has_brief: bool,
    pub has_data: bool,
    pub has_research: bool,
    pub has_notes: bool,
    pub image_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingestion {
    pub deck_path: String,
    /// `deck.json`, or `{ "error": ... }` when it does not parse.
    pub deck_config: Option<Value>,
    pub narrative_context: Option<Value>,
    pub materials: MaterialsInventory,
    pub assets: AssetsInventory,
    pub summary: IngestionSummary,
}

impl Ingestion {
    /// A string field of `deck.json`, when the file parsed.
    pub fn deck_field(&self, key: &str) -> Option<&str> {
        self.deck_config.as_ref()?.get(key)?.as_str()
    }
}

/// Parse errors are kept in place of the document rather than failing.
fn read_optional_json(path: &Path) -> Result<Option<Value>> {
    match artifacts::read_json::<Value>(path) {
        Ok(value) => Ok(Some(value)),
        Err(Error::ArtifactError { message, .. }) => Ok(Some(json!({ "error": message }))),
        Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Inventory `resources/materials` and `resources/assets` of a deck.
pub fn ingest(deck_dir: &Path) -> Result<Ingestion> {
    if !deck_dir.is_dir() {
        return Err(Error::DeckNotFound(deck_dir.to_path_buf()));
    }

    let materials = scan_directory(&artifacts::materials_dir(deck_dir))?;
    let assets = scan_directory(&artifacts::assets_dir(deck_dir))?;

    let summary = IngestionSummary {
        has_brief: materials.iter().any(|m| m.name_contains("brief")),
        has_data: materials.iter().any(|m| m.kind == ResourceKind::Data),
        has_research: materials
            .iter()
            .any(|m| m.name_contains("research") || m.name_contains("study")),
        has_notes: materials
            .iter()
            .any(|m| m.name_contains("note") || m.name_contains("draft")),
        image_count: assets.iter().filter(|a| a.kind == ResourceKind::Image).count(),
    };

    let total_word_count = materials.iter().filter_map(|m| m.word_count).sum();
    let (images, other): (Vec<_>, Vec<_>) = assets
        .iter()
        .cloned()
        .partition(|a| a.kind == ResourceKind::Image);

    log::debug!(
        "Ingested {} materials and {} assets from {}",
        materials.len(),
        assets.len(),
        deck_dir.display()
    );

    Ok(Ingestion {
        deck_path: deck_dir.display().to_string(),
        deck_config: read_optional_json(&deck_dir.join("deck.json"))?,
        narrative_context: read_optional_json(&deck_dir.join("narrative-context.json"))?,
        materials: MaterialsInventory {
            count: materials.len(),
            total_word_count,
            files: materials,
        },
        assets: AssetsInventory {
            count: assets.len(),
            images,
            other,
        },
        summary,
    })
}

fn parsed(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| v.get("error").is_none())
}

fn field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("not set")
}

/// Markdown summary of an ingestion for a model prompt.
pub fn format_for_model(ingestion: &Ingestion) -> String {
    let mut out = String::from("# Resource Ingestion Summary\n\n");
    out.push_str(&format!("**Deck:** {}\n\n", ingestion.deck_path));

    if let Some(config) = parsed(&ingestion.deck_config) {
        out.push_str("## Deck Configuration\n");
        out.push_str(&format!("- Entity: {}\n", field(config, "entity")));
        out.push_str(&format!("- Title: {}\n", field(config, "title")));
        out.push_str(&format!("- Type: {}\n\n", field(config, "deckType")));
    }

    if let Some(context) = parsed(&ingestion.narrative_context) {
        let created = context.get("created").and_then(Value::as_str).unwrap_or("unknown");
        let framework = context
            .pointer("/framework/name")
            .and_then(Value::as_str)
            .unwrap_or("not selected");
        out.push_str("## Existing Narrative Context\n");
        out.push_str(&format!("Previous discovery completed: {}\n", created));
        out.push_str(&format!("Framework: {}\n\n", framework));
    }

    let materials = &ingestion.materials;
    out.push_str(&format!(
        "## Materials ({} files, ~{} words)\n\n",
        materials.count, materials.total_word_count
    ));
    let summary = &ingestion.summary;
    for (present, line) in [
        (summary.has_brief, "- Has brief document\n"),
        (summary.has_data, "- Has data files\n"),
        (summary.has_research, "- Has research documents\n"),
        (summary.has_notes, "- Has notes/drafts\n"),
    ] {
        if present {
            out.push_str(line);
        }
    }

    out.push_str("\n### Material Contents\n\n");
    for material in &materials.files {
        if let Some(error) = &material.error {
            out.push_str(&format!("#### {} (error: {})\n\n", material.filename, error));
        } else if let Some(content) = &material.content {
            out.push_str(&format!("#### {}\n", material.filename));
            out.push_str(&format!(
                "*Type: {} | {} words | {} lines*\n\n",
                kind_label(material.kind),
                material.word_count.unwrap_or(0),
                material.line_count.unwrap_or(0)
            ));
            out.push_str("```\n");
            let total = content.chars().count();
            if total > MAX_EXCERPT_CHARS {
                out.extend(content.chars().take(MAX_EXCERPT_CHARS));
                out.push_str(&format!(
                    "\n\n... [truncated, {} more characters]\n",
                    total - MAX_EXCERPT_CHARS
                ));
            } else {
                out.push_str(content);
            }
            out.push_str("\n```\n\n");
        } else {
            out.push_str(&format!("#### {}\n", material.filename));
            out.push_str(&format!(
                "*Type: {} | {}*\n\n",
                kind_label(material.kind),
                material.note.as_deref().unwrap_or("binary file")
            ));
        }
    }

    let assets = &ingestion.assets;
    out.push_str(&format!("## Visual Assets ({} files)\n\n", assets.count));
    if !assets.images.is_empty() {
        out.push_str("### Images Available\n");
        for image in &assets.images {
            out.push_str(&format!("- {} ({}KB)\n", image.filename, image.size_kb.unwrap_or(0)));
        }
        out.push('\n');
    }
    if !assets.other.is_empty() {
        out.push_str("### Other Assets\n");
        for asset in &assets.other {
            out.push_str(&format!("- {}\n", asset.filename));
        }
        out.push('\n');
    }

    out
}

fn kind_label(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Image => "image",
        ResourceKind::Pdf => "pdf",
        ResourceKind::Data => "data",
        ResourceKind::Markdown => "markdown",
        ResourceKind::Text => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_deck() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let materials = artifacts::materials_dir(dir.path());
        let assets = artifacts::assets_dir(dir.path());
        fs::create_dir_all(materials.join("research")).unwrap();
        fs::create_dir_all(&assets).unwrap();

        fs::write(materials.join("brief.md"), "# Brief\nShip the pilot in May.\n").unwrap();
        fs::write(materials.join("research/survey.csv"), "team,score\nops,4\n").unwrap();
        fs::write(materials.join("scan.pdf"), b"%PDF-1.4").unwrap();
        fs::write(materials.join("archive.zip"), b"PK").unwrap();
        fs::write(assets.join("hero.png"), vec![0u8; 2048]).unwrap();
        fs::write(assets.join("palette.txt"), "ink ivory").unwrap();
        fs::write(
            dir.path().join("deck.json"),
            r#"{ "title": "Pilot plan", "entity": "northwind" }"#,
        )
        .unwrap();
        fs::write(dir.path().join("narrative-context.json"), "{ broken").unwrap();
        dir
    }

    #[test]
    fn test_kind_for_path() {
        assert_eq!(ResourceKind::for_path(Path::new("a.PNG")), ResourceKind::Image);
        assert_eq!(ResourceKind::for_path(Path::new("a.csv")), ResourceKind::Data);
        assert_eq!(ResourceKind::for_path(Path::new("a.md")), ResourceKind::Markdown);
        assert_eq!(ResourceKind::for_path(Path::new("a.html")), ResourceKind::Text);
        assert_eq!(ResourceKind::for_path(Path::new("a.pdf")), ResourceKind::Pdf);
    }

    #[test]
    fn test_ingest_inventory() {
        let dir = sample_deck();
        let ingestion = ingest(dir.path()).unwrap();

        assert_eq!(ingestion.materials.count, 3);
        let names: Vec<&str> = ingestion
            .materials
            .files
            .iter()
            .map(|f| f.filename.as_str())
            .collect();
        assert_eq!(names, vec!["brief.md", "survey.csv", "scan.pdf"]);

        let brief = &ingestion.materials.files[0];
        assert_eq!(brief.kind, ResourceKind::Markdown);
        assert_eq!(brief.word_count, Some(7));
        assert_eq!(brief.line_count, Some(3));
        assert_eq!(ingestion.materials.total_word_count, 9);

        assert!(ingestion.summary.has_brief);
        assert!(ingestion.summary.has_data);
        assert!(!ingestion.summary.has_research);
        assert_eq!(ingestion.summary.image_count, 1);
        assert_eq!(ingestion.assets.images[0].size_kb, Some(2));
        assert_eq!(ingestion.assets.other.len(), 1);

        assert_eq!(ingestion.deck_field("title"), Some("Pilot plan"));
        assert!(ingestion.narrative_context.as_ref().unwrap()["error"].is_string());
    }

    #[test]
    fn test_missing_deck_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingest(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::DeckNotFound(_)));
    }

    #[test]
    fn test_format_for_model() {
        let dir = sample_deck();
        let text = format_for_model(&ingest(dir.path()).unwrap());
        assert!(text.contains("- Title: Pilot plan"));
        assert!(text.contains("- Type: not set"));
        assert!(!text.contains("## Existing Narrative Context"));
        assert!(text.contains("## Materials (3 files, ~9 words)"));
        assert!(text.contains("*Type: markdown | 7 words | 3 lines*"));
        assert!(text.contains("*Type: pdf | PDF detected - extract text separately if needed*"));
        assert!(text.contains("- hero.png (2KB)"));
    }
}
