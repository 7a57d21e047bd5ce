//! Rendering support for design quality: a local static server and a
//! headless browser probe that measures slide geometry.

pub mod browser;
pub mod server;

pub use browser::DesignProbe;
pub use server::StaticServer;

use keynote_analysis::RenderedDeck;
use keynote_core::{DesignThresholds, Error, Result};
use std::path::{Component, Path, PathBuf};

/// Where the browser loads the deck from.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderTarget {
    /// Start a local static server rooted at the working directory.
    Serve,
    /// Deck is already hosted under this base URL.
    BaseUrl(String),
    /// Open the deck document directly from disk.
    File,
}

impl RenderTarget {
    /// Build from the command-line options; a base URL wins over `--serve`.
    pub fn from_options(serve: bool, base_url: Option<&str>) -> Self {
        match base_url {
            Some(url) => RenderTarget::BaseUrl(url.to_string()),
            None if serve => RenderTarget::Serve,
            None => RenderTarget::File,
        }
    }

    /// Whether the deck is loaded over HTTP.
    pub fn is_hosted(&self) -> bool {
        !matches!(self, RenderTarget::File)
    }
}

/// Deck directory as a `/`-separated URL path.
fn url_path(deck_dir: &Path) -> String {
    deck_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Deck directory relative to the serve root. An absolute directory must
/// live under the root for the server to reach it.
fn served_path(deck_dir: &Path, root: &Path) -> Result<PathBuf> {
    if deck_dir.is_relative() {
        return Ok(deck_dir.to_path_buf());
    }
    deck_dir
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| {
            Error::RenderError(format!(
                "{} is outside the served directory {}",
                deck_dir.display(),
                root.display()
            ))
        })
}

/// Render a deck and measure every slide up to the configured limit.
pub async fn render_deck(
    deck_dir: &Path,
    target: &RenderTarget,
    thresholds: &DesignThresholds,
) -> Result<RenderedDeck> {
    let probe = DesignProbe::new(thresholds);

    match target {
        RenderTarget::Serve => {
            let root = std::env::current_dir()?;
            let relative = served_path(deck_dir, &root)?;
            let server = StaticServer::start(&root, thresholds.serve_port).await?;
            let url = server.url_for(&format!("{}/index.html", url_path(&relative)));
            let result = probe.probe(&url).await;
            server.shutdown().await;
            result
        }
        RenderTarget::BaseUrl(base) => {
            let url = format!(
                "{}/{}/index.html",
                base.trim_end_matches('/'),
                url_path(deck_dir)
            );
            probe.probe(&url).await
        }
        RenderTarget::File => {
            let document = deck_dir.join("index.html");
            let absolute = document.canonicalize().map_err(|_| Error::DeckNotFound(document))?;
            probe
                .probe(&format!("file://{}", absolute.display()))
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_options() {
        assert_eq!(RenderTarget::from_options(false, None), RenderTarget::File);
        assert_eq!(RenderTarget::from_options(true, None), RenderTarget::Serve);
        assert_eq!(
            RenderTarget::from_options(true, Some("http://localhost:3000")),
            RenderTarget::BaseUrl("http://localhost:3000".to_string())
        );
        assert!(!RenderTarget::File.is_hosted());
        assert!(RenderTarget::Serve.is_hosted());
    }

    #[test]
    fn test_url_path() {
        assert_eq!(url_path(Path::new("decks/skill-demo")), "decks/skill-demo");
        assert_eq!(url_path(Path::new("./decks/skill-demo/")), "decks/skill-demo");
    }

    #[test]
    fn test_served_path() {
        let root = Path::new("/work/site");
        assert_eq!(
            served_path(Path::new("decks/demo"), root).unwrap(),
            PathBuf::from("decks/demo")
        );
        assert_eq!(
            served_path(Path::new("/work/site/decks/demo"), root).unwrap(),
            PathBuf::from("decks/demo")
        );

        let err = served_path(Path::new("/elsewhere/demo"), root).unwrap_err();
        assert!(matches!(err, Error::RenderError(_)));
        assert!(err.to_string().contains("outside the served directory"));
    }
}
