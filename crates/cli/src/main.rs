//! CLI tool for splitting, rendering and checking slide markup documents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slidemark_core::{
    extract_section_headings, generate_table_of_contents, validate_document, AttributeMap,
    EngineConfig, SlideDeck, SplitLevel,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Split a slide markup document into slides and render them for the viewer.
#[derive(Parser, Debug)]
#[command(name = "slidemark")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Saved attribute map (JSON object of line index to token)
    #[arg(short, long, global = true)]
    attributes: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List slides with their start lines and layouts
    Split {
        /// Input document
        input: PathBuf,

        /// Heading level that starts a slide (1-3)
        #[arg(short, long)]
        level: Option<u8>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render annotated slide markup
    Render {
        /// Input document
        input: PathBuf,

        /// Heading level that starts a slide (1-3)
        #[arg(short, long)]
        level: Option<u8>,

        /// Render only this slide (0-based)
        #[arg(short, long)]
        slide: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the table of contents
    Toc {
        /// Input document
        input: PathBuf,

        /// Deepest heading level to list
        #[arg(short, long)]
        max_level: Option<u8>,
    },

    /// Report malformed annotations and overlong headings
    Check {
        /// Input document
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Dump the parsed line model
    Lines {
        /// Input document
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct SlideSummary<'a> {
    index: usize,
    start_line: usize,
    layout: &'a str,
    title: &'a str,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = load_config(args.config.as_deref())?;
    let map = load_attribute_map(args.attributes.as_deref())?;

    match &args.command {
        Command::Split { input, level, json } => {
            let deck = build_deck(input, &config, *level, map.as_ref())?;
            let summaries: Vec<SlideSummary> = deck
                .slides()
                .iter()
                .map(|slide| SlideSummary {
                    index: slide.index,
                    start_line: slide.start_line,
                    layout: slide.layout.as_str(),
                    title: slide_title(&slide.content),
                })
                .collect();

            if *json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for summary in &summaries {
                    println!(
                        "{:>3}  line {:>4}  {:<8} {}",
                        summary.index,
                        summary.start_line + 1,
                        summary.layout,
                        summary.title
                    );
                }
            }
        }
        Command::Render {
            input,
            level,
            slide,
            json,
        } => {
            let deck = build_deck(input, &config, *level, map.as_ref())?;
            let rendered = match slide {
                Some(index) => vec![deck.render_slide(*index).with_context(|| {
                    format!("Slide {} out of range ({} slides)", index, deck.len())
                })?],
                None => deck.render_all(),
            };

            if *json {
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            } else {
                for slide in &rendered {
                    println!("<!-- slide {} ({}) -->", slide.index, slide.layout);
                    println!("{}", slide.markup);
                    println!();
                }
            }
        }
        Command::Toc { input, max_level } => {
            let content = read_document(input)?;
            let map = reconcile_for(&content, &config, map.as_ref());
            let max_level = max_level.unwrap_or(config.toc_level);
            let sections = extract_section_headings(&content, max_level, map.as_ref());
            println!("{}", generate_table_of_contents(&sections));
        }
        Command::Check { input, json } => {
            let content = read_document(input)?;
            let map = reconcile_for(&content, &config, map.as_ref());
            let diagnostics = validate_document(&content, &config, map.as_ref());

            if *json {
                println!("{}", serde_json::to_string_pretty(&diagnostics)?);
            } else {
                for diagnostic in &diagnostics {
                    println!("{}: {}", input.display(), diagnostic);
                }
            }

            if !diagnostics.is_empty() {
                if args.verbose {
                    eprintln!("{} problem(s) found", diagnostics.len());
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Lines { input, json } => {
            let content = read_document(input)?;
            let mut lines = config.codec().content_to_lines(&content);
            if let Some(map) = reconcile_for(&content, &config, map.as_ref()) {
                // Reconciled entries differ from the parse only on untyped lines.
                for (index, line) in lines.iter_mut().enumerate() {
                    if let Some(attribute) = map.get(index) {
                        line.attribute = Some(attribute);
                    }
                }
            }

            if *json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                for (index, line) in lines.iter().enumerate() {
                    let token = line.attribute.map(|a| a.token()).unwrap_or_default();
                    println!("{:>4}  {:<6} {}", index + 1, token, line.text);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Read the configuration file, or fall back to defaults.
fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EngineConfig::from_json_str(&json)
        .with_context(|| format!("Invalid config {}", path.display()))
}

/// Read a saved attribute map, if one was given.
fn load_attribute_map(path: Option<&Path>) -> Result<Option<AttributeMap>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read attribute map {}", path.display()))?;
    let map: AttributeMap = serde_json::from_str(&json)
        .with_context(|| format!("Invalid attribute map {}", path.display()))?;
    Ok(Some(map))
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read and segment a document, reconciling the saved map against its lines.
fn build_deck(
    input: &Path,
    config: &EngineConfig,
    level: Option<u8>,
    saved: Option<&AttributeMap>,
) -> Result<SlideDeck> {
    let content = read_document(input)?;

    let config = match level {
        Some(level) => config.clone().with_split_level(SplitLevel::new(level)?),
        None => config.clone(),
    };

    let map = reconcile_for(&content, &config, saved);

    log::debug!(
        "Splitting {} ({} lines) at level {}",
        input.display(),
        content.split('\n').count(),
        config.split_level.get()
    );

    Ok(SlideDeck::build(&content, &config, map.as_ref()))
}

/// Reconcile the saved attribute map, if any, against `content`.
fn reconcile_for(
    content: &str,
    config: &EngineConfig,
    saved: Option<&AttributeMap>,
) -> Option<AttributeMap> {
    saved.map(|saved| config.codec().reconcile(content, saved))
}

/// First non-blank line of a slide, trimmed, for listings.
fn slide_title(content: &str) -> &str {
    content
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(str::trim)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidemark_core::Attribute;

    #[test]
    fn test_stale_saved_heading_does_not_override_typed_one() {
        let content = "# Typed\nplain";
        let mut saved = AttributeMap::new();
        saved.insert(0, Attribute::Dash);
        saved.insert(1, Attribute::Heading2);
        saved.insert(5, Attribute::Heading1);

        let map = reconcile_for(content, &EngineConfig::default(), Some(&saved)).unwrap();
        assert_eq!(map.get(0), Some(Attribute::Heading1));
        assert_eq!(map.get(1), Some(Attribute::Heading2));
        assert_eq!(map.get(5), None);

        let sections = extract_section_headings(content, 2, Some(&map));
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Typed", "plain"]);
    }

    #[test]
    fn test_no_saved_map() {
        assert!(reconcile_for("# A", &EngineConfig::default(), None).is_none());
    }
}
