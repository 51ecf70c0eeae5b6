//! `lexbg`: search Bulgarian legal sources from the command line.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexbg::{AppConfig, RequestOverrides, render};
use lexbg_search::{Methodology, classify_area, extract_citations};
use tracing_subscriber::EnvFilter;

/// Bulgarian legal research: search, classify, cite.
#[derive(Parser)]
#[command(name = "lexbg", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search the legal domains for a query.
    Search {
        /// The legal question, usually in Bulgarian.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Domain key to search (repeatable). Defaults to the configured set.
        #[arg(short, long = "domain")]
        domains: Vec<String>,

        /// Maximum number of results.
        #[arg(short = 'n', long)]
        max_results: Option<usize>,

        /// Minimum relevance in [0, 1].
        #[arg(long)]
        min_relevancy: Option<f64>,

        /// Scoring methodology: enhanced, standard or experimental.
        #[arg(short, long)]
        methodology: Option<Methodology>,
    },

    /// List the searchable legal domains.
    Domains,

    /// Classify text into a legal area and suggest sources.
    Classify {
        /// Text to classify.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Extract legal citations from a file (`-` for stdin).
    Citations {
        /// Input file.
        file: PathBuf,
    },

    /// Fetch a legal document and summarise it.
    Analyze {
        /// Document URL.
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for results and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lexbg=info,lexbg_search=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Search {
            query,
            domains,
            max_results,
            min_relevancy,
            methodology,
        } => {
            let overrides = RequestOverrides {
                domains,
                max_results,
                min_relevancy,
                methodology,
            };
            run_search(&config, &query.join(" "), &overrides, cli.json).await
        }
        Command::Domains => list_domains(&config, cli.json),
        Command::Classify { text } => classify(&config, &text.join(" "), cli.json),
        Command::Citations { file } => citations(&file, cli.json),
        Command::Analyze { url } => analyze(&config, &url, cli.json).await,
    }
}

async fn run_search(
    config: &AppConfig,
    query: &str,
    overrides: &RequestOverrides,
    json: bool,
) -> anyhow::Result<()> {
    let request = lexbg::build_request(config, query, overrides)?;
    let engine = lexbg::build_engine(config)?;
    let outcome = engine.search(&request).await?;

    for note in &outcome.degradations {
        eprintln!("warning: {note}");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render::search_outcome(&outcome));
    }
    Ok(())
}

fn list_domains(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let registry = config.registry()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&registry.prioritized())?);
    } else {
        print!("{}", render::domains(&registry));
    }
    Ok(())
}

fn classify(config: &AppConfig, text: &str, json: bool) -> anyhow::Result<()> {
    let classification = classify_area(text);
    let registry = config.registry()?;
    let recommended = classification
        .area
        .map(|area| registry.for_area(area))
        .unwrap_or_default();

    if json {
        let keys: Vec<&str> = recommended.iter().map(|d| d.key.as_str()).collect();
        let value = serde_json::json!({
            "classification": classification,
            "recommended_domains": keys,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render::classification(&classification, &recommended));
    }
    Ok(())
}

fn citations(file: &Path, json: bool) -> anyhow::Result<()> {
    let text = if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?
    };

    let found = extract_citations(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        print!("{}", render::citations(&found));
    }
    Ok(())
}

async fn analyze(config: &AppConfig, url: &str, json: bool) -> anyhow::Result<()> {
    let analysis = lexbg_search::fetch_document(url, &config.search).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render::analysis(&analysis));
    }
    Ok(())
}
