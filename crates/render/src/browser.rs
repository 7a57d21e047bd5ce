//! Headless browser probe that walks a deck and measures each slide.

use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use keynote_analysis::design::{ColorSample, ElementBox};
use keynote_analysis::{RenderedDeck, RenderedSlide};
use keynote_core::{DesignThresholds, Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;

const SLIDE_COUNT_JS: &str = "document.querySelectorAll('.slide').length";

/// Measures the active slide. Returns `{ active: false }` when no slide is shown.
const MEASURE_ACTIVE_SLIDE_JS: &str = r#"() => {
  const activeSlide = document.querySelector('.slide.is-active');
  if (!activeSlide) return { active: false };

  const slideInner = activeSlide.querySelector('.slide-inner');
  const theme = activeSlide.classList.contains('theme-ink') ? 'ink' : 'ivory';
  const layoutClass = [...(slideInner ? slideInner.classList : [])].find((c) => c.startsWith('layout-'));
  const layout = layoutClass ? layoutClass.replace('layout-', '') : 'unknown';

  const elements = [];
  const selectors = ['.title', '.section-title', '.subtitle', '.body-text', '.card', '.media-frame', '.quote', '.metric', '.chip-row'];
  for (const selector of selectors) {
    for (const el of activeSlide.querySelectorAll(selector)) {
      const rect = el.getBoundingClientRect();
      if (rect.width > 0 && rect.height > 0) {
        elements.push({ type: selector.slice(1), x: rect.x, y: rect.y, width: rect.width, height: rect.height });
      }
    }
  }

  const largestFont = (selector) => {
    let size = 0;
    for (const el of activeSlide.querySelectorAll(selector)) {
      const value = parseFloat(window.getComputedStyle(el).fontSize);
      if (value > size) size = value;
    }
    return size;
  };

  const background = slideInner ? window.getComputedStyle(slideInner).backgroundColor : '';
  const contrast = [];
  for (const el of activeSlide.querySelectorAll('.title, .section-title, .subtitle, .body-text, .quote')) {
    contrast.push({ element: el.className, color: window.getComputedStyle(el).color, background });
  }

  return {
    active: true,
    title: activeSlide.getAttribute('data-title'),
    theme,
    layout,
    elements,
    headingSize: largestFont('.title, .section-title, .quote'),
    bodySize: largestFont('.subtitle, .body-text, .card-caption'),
    contrast,
  };
}"#;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MeasuredSlide {
    active: bool,
    title: Option<String>,
    theme: String,
    layout: String,
    elements: Vec<ElementBox>,
    heading_size: f64,
    body_size: f64,
    contrast: Vec<ColorSample>,
}

fn render_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::RenderError(format!("{}: {}", context, err))
}

/// Drives a headless Chromium through a deck one slide at a time.
pub struct DesignProbe {
    thresholds: DesignThresholds,
    chrome_executable: Option<PathBuf>,
}

impl DesignProbe {
    pub fn new(thresholds: &DesignThresholds) -> Self {
        Self {
            thresholds: thresholds.clone(),
            chrome_executable: None,
        }
    }

    /// Use a specific Chrome or Chromium binary instead of auto-detection.
    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    async fn launch(&self) -> Result<Browser> {
        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .window_size(self.thresholds.viewport_width, self.thresholds.viewport_height)
            .viewport(Viewport {
                width: self.thresholds.viewport_width,
                height: self.thresholds.viewport_height,
                ..Viewport::default()
            })
            .args(vec!["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"]);
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| render_error("Invalid browser configuration", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| render_error("Failed to launch headless browser", e))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(browser)
    }

    /// Load `url` and measure up to `max_slides` slides.
    pub async fn probe(&self, url: &str) -> Result<RenderedDeck> {
        log::debug!("Probing rendered deck at {}", url);
        let mut browser = self.launch().await?;

        let result = self.walk_slides(&browser, url).await;

        if let Err(e) = browser.close().await {
            log::debug!("Browser did not close cleanly: {}", e);
        }
        result
    }

    async fn walk_slides(&self, browser: &Browser, url: &str) -> Result<RenderedDeck> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| render_error(&format!("Failed to open {}", url), e))?;
        sleep(Duration::from_millis(self.thresholds.initial_wait_ms)).await;

        let slide_count: usize = page
            .evaluate_expression(SLIDE_COUNT_JS)
            .await
            .map_err(|e| render_error("Failed to count slides", e))?
            .into_value()
            .map_err(|e| render_error("Unexpected slide count", e))?;
        if slide_count == 0 {
            return Err(Error::RenderError(format!("No slides rendered at {}", url)));
        }

        let mut slides = Vec::new();
        for i in 0..slide_count.min(self.thresholds.max_slides) {
            let measured = measure_active_slide(&page).await?;
            if measured.active {
                slides.push(RenderedSlide {
                    index: i + 1,
                    title: measured.title.unwrap_or_else(|| format!("Slide {}", i + 1)),
                    theme: measured.theme,
                    layout: measured.layout,
                    elements: measured.elements,
                    heading_size: measured.heading_size,
                    body_size: measured.body_size,
                    contrast: measured.contrast,
                });
            } else {
                log::warn!("No active slide at position {}", i + 1);
            }
            self.advance(&page).await?;
        }

        log::debug!("Measured {} of {} slides", slides.len(), slide_count);
        if slides.is_empty() {
            return Err(Error::RenderError(format!("No active slide rendered at {}", url)));
        }

        Ok(RenderedDeck {
            deck_url: url.to_string(),
            slide_count,
            slides,
        })
    }

    async fn advance(&self, page: &Page) -> Result<()> {
        page.find_element("body")
            .await
            .map_err(|e| render_error("Deck has no body", e))?
            .press_key("ArrowRight")
            .await
            .map_err(|e| render_error("Failed to advance slide", e))?;
        sleep(Duration::from_millis(self.thresholds.transition_wait_ms)).await;
        Ok(())
    }
}

async fn measure_active_slide(page: &Page) -> Result<MeasuredSlide> {
    page.evaluate_function(MEASURE_ACTIVE_SLIDE_JS)
        .await
        .map_err(|e| render_error("Failed to measure slide", e))?
        .into_value()
        .map_err(|e| render_error("Unexpected slide measurements", e))
}
