//! CLI for analyzing, reviewing, and authoring keynote decks.

mod report;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use keynote_analysis::{arc, density, design, image, narrative, readability};
use keynote_core::{AnalysisConfig, Deck};
use keynote_render::RenderTarget;
use keynote_workflow::{
    artifacts, build, conformance, ingest, review, wizard, Aggregator, Interviewer, ReviewOptions,
    Wizard,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DECK: &str = "decks/skill-demo";

/// How long exit waits for analyzer jobs that outlived their time limit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Heuristic analysis and model-mediated review for keynote decks.
#[derive(Parser, Debug)]
#[command(name = "keynote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file overriding analysis thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DeckArgs {
    /// Deck directory containing index.html
    #[arg(default_value = DEFAULT_DECK)]
    deck: PathBuf,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Serve the working directory locally while rendering
    #[arg(long)]
    serve: bool,

    /// Base URL where decks are already hosted
    #[arg(long)]
    base_url: Option<String>,
}

impl RenderArgs {
    fn target(&self) -> RenderTarget {
        RenderTarget::from_options(self.serve, self.base_url.as_deref())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reading level, passive voice, jargon, and complex sentences
    Readability(DeckArgs),

    /// Words, bullets, and visuals per slide
    Density(DeckArgs),

    /// Images, alt text, and generation prompts per slide
    Images {
        #[command(flatten)]
        deck: DeckArgs,

        /// Save the report to resources/materials/image-analysis.json
        #[arg(long)]
        save: bool,
    },

    /// Opening hook, emotional arc, and slide-to-slide flow
    Arc(DeckArgs),

    /// Narrative roles, headline anti-patterns, and redundancy
    Narrative(DeckArgs),

    /// Typography, balance, contrast, and grid alignment of rendered slides
    Design {
        #[command(flatten)]
        deck: DeckArgs,
        #[command(flatten)]
        render: RenderArgs,
    },

    /// Run every analyzer and summarize the deck
    ReviewAll {
        #[command(flatten)]
        deck: DeckArgs,
        #[command(flatten)]
        render: RenderArgs,
    },

    /// Interview, analyze, and package prompts for the review agents
    Review {
        /// Deck directory containing index.html
        #[arg(default_value = DEFAULT_DECK)]
        deck: PathBuf,

        /// Reuse the saved review context
        #[arg(long)]
        skip_interview: bool,

        /// Package prompts without automated analysis
        #[arg(long)]
        skip_analysis: bool,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Inventory deck materials and assets
    Ingest(DeckArgs),

    /// Prepare the narrative build prompt
    Build {
        /// Deck directory
        #[arg(default_value = DEFAULT_DECK)]
        deck: PathBuf,
    },

    /// Check that build (and review) artifacts exist
    Conformance {
        /// Deck directory
        #[arg(default_value = DEFAULT_DECK)]
        deck: PathBuf,

        /// Also check review artifacts
        #[arg(long)]
        review: bool,
    },

    /// Create a new deck one slide at a time
    Wizard {
        /// Deck identifier, e.g. my-pitch
        deck_id: String,

        /// Brand entity the deck belongs to
        #[arg(long, default_value = "northwind")]
        entity: String,

        /// Directory that holds all decks
        #[arg(long, default_value = "decks")]
        decks_dir: PathBuf,

        /// Deck document template
        #[arg(long, default_value = "skills/keynote-slides/assets/keynote-slides.html")]
        template: PathBuf,

        /// Prefix added to every image prompt
        #[arg(long)]
        image_prefix: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let runtime = build_runtime()?;
    let result = runtime.block_on(run(cli));
    // A timed-out analyzer keeps its blocking thread; don't wait for it.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Command::Readability(args) => {
            let deck = load_deck(&args.deck)?;
            let result = readability::analyze_deck(&deck, &config);
            emit(args.json, &result, report::readability)?;
        }
        Command::Density(args) => {
            let deck = load_deck(&args.deck)?;
            let result = density::analyze_deck(&deck, &config);
            emit(args.json, &result, report::density)?;
        }
        Command::Images { deck, save } => {
            let loaded = load_deck(&deck.deck)?;
            let result = image::analyze_deck(&loaded);
            emit(deck.json, &result, report::images)?;
            if save {
                let path = artifacts::material(&deck.deck, artifacts::IMAGE_ANALYSIS);
                artifacts::write_json(&path, &result)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
                println!("Saved analysis to: {}", path.display());
            }
        }
        Command::Arc(args) => {
            let deck = load_deck(&args.deck)?;
            let result = arc::analyze_deck(&deck);
            emit(args.json, &result, report::arc)?;
        }
        Command::Narrative(args) => {
            let deck = load_deck(&args.deck)?;
            let result = narrative::analyze_deck(&deck);
            emit(args.json, &result, report::narrative)?;
        }
        Command::Design { deck, render } => {
            let rendered = keynote_render::render_deck(&deck.deck, &render.target(), &config.design)
                .await
                .with_context(|| format!("Failed to render {}", deck.deck.display()))?;
            let result = design::analyze_deck(&rendered, &config);
            emit(deck.json, &result, |r| report::design(r, &deck.deck))?;
        }
        Command::ReviewAll { deck, render } => run_review_all(config, &deck, &render).await?,
        Command::Review {
            deck,
            skip_interview,
            skip_analysis,
            render,
        } => {
            let options = ReviewOptions {
                skip_interview,
                skip_analysis,
                render_target: render.target(),
            };
            run_review(&config, &deck, &options).await?;
        }
        Command::Ingest(args) => {
            let ingestion = ingest::ingest(&args.deck)
                .with_context(|| format!("Failed to ingest {}", args.deck.display()))?;
            if args.json {
                print_json(&ingestion)?;
            } else {
                println!("{}", ingest::format_for_model(&ingestion));
            }
        }
        Command::Build { deck } => {
            let outcome = build::prepare_build(&deck)
                .with_context(|| format!("Failed to prepare build for {}", deck.display()))?;
            report::build(&outcome);
        }
        Command::Conformance { deck, review } => {
            let missing = conformance::check(&deck, review)
                .with_context(|| format!("Failed to check {}", deck.display()))?;
            if !report::conformance(&missing) {
                std::process::exit(1);
            }
        }
        Command::Wizard {
            deck_id,
            entity,
            decks_dir,
            template,
            image_prefix,
        } => run_wizard(&deck_id, &entity, &decks_dir, &template, image_prefix.as_deref())?,
    }

    Ok(())
}

fn load_deck(path: &Path) -> Result<Deck> {
    keynote_html::load_deck(path).with_context(|| format!("Failed to load deck {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON when requested, otherwise the human-readable report.
fn emit<T: Serialize>(json: bool, value: &T, pretty: impl FnOnce(&T)) -> Result<()> {
    if json {
        print_json(value)
    } else {
        pretty(value);
        Ok(())
    }
}

async fn run_review_all(config: AnalysisConfig, args: &DeckArgs, render: &RenderArgs) -> Result<()> {
    let deck = load_deck(&args.deck)?;
    let aggregator = Aggregator::new(config).with_render_target(render.target());

    if !args.json {
        println!("\nRunning comprehensive deck analysis: {}", args.deck.display());
        println!("{}", "=".repeat(50));
    }

    let result = aggregator.analyze(deck, &args.deck).await;
    let saved = result
        .save(&args.deck)
        .with_context(|| format!("Failed to save analysis for {}", args.deck.display()))?;

    if args.json {
        print_json(&result)?;
    } else {
        report::analyzer_status(&result, aggregator.design_enabled());
        report::summary(&result);
        println!("\nFull analysis saved to: {}", saved.display());
    }
    Ok(())
}

async fn run_review(config: &AnalysisConfig, deck: &Path, options: &ReviewOptions) -> Result<()> {
    println!("Model-Mediated Deck Review");
    println!("{}", "=".repeat(50));

    let stdin = std::io::stdin();
    let mut interviewer = Interviewer::new(stdin.lock(), std::io::stdout());
    let outcome = review::prepare_review(deck, config, options, &mut interviewer)
        .await
        .with_context(|| format!("Failed to prepare review for {}", deck.display()))?;

    report::review(&outcome);
    Ok(())
}

fn run_wizard(
    deck_id: &str,
    entity: &str,
    decks_dir: &Path,
    template_path: &Path,
    image_prefix: Option<&str>,
) -> Result<()> {
    let deck_dir = decks_dir.join(deck_id);

    let stdin = std::io::stdin();
    let mut session = Wizard::new(stdin.lock(), std::io::stdout());
    let Some((brief, slides)) = session.run(deck_id, entity)? else {
        return Ok(());
    };

    let template = wizard::load_template(template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;
    if template.is_none() {
        log::warn!(
            "Template not found at {}, writing a minimal deck document",
            template_path.display()
        );
    }

    println!("\n{}\nGENERATING OUTPUT FILES\n{}", "=".repeat(60), "=".repeat(60));
    let written = wizard::write_deck(&deck_dir, &brief, &slides, template.as_deref(), image_prefix)
        .with_context(|| format!("Failed to write deck {}", deck_dir.display()))?;
    for path in &written {
        println!("Created: {}", path.display());
    }

    report::wizard_next_steps(&deck_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_shutdown_does_not_wait_for_stuck_jobs() {
        let runtime = build_runtime().unwrap();
        runtime.spawn_blocking(|| std::thread::sleep(Duration::from_secs(30)));

        let started = Instant::now();
        runtime.shutdown_timeout(SHUTDOWN_GRACE);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_cli_parses_review_all() {
        let cli = Cli::try_parse_from(["keynote", "review-all", "decks/demo", "--serve"]).unwrap();
        match cli.command {
            Command::ReviewAll { deck, render } => {
                assert_eq!(deck.deck, PathBuf::from("decks/demo"));
                assert_eq!(render.target(), RenderTarget::Serve);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
