//! CLI binary for trend-scout.
//!
//! Diagnostic output goes to stderr; stdout carries only command output.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scout_extract::{CandidateFinder, HttpFetcher};
use tracing_subscriber::EnvFilter;
use trend_scout::pipeline::{brave_provider, build_query};
use trend_scout::{Credentials, DefaultTrendScout, ScoutConfig, ScoutError, TopicOutcome, TopicSpec};

/// Discover trending entities for topics on a review site.
#[derive(Parser)]
#[command(name = "trend-scout", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search, score and record trends for the configured topics.
    Run {
        /// Run only these topics instead of the configured list.
        #[arg(short, long = "topic")]
        topics: Vec<String>,
    },

    /// Print the candidate names for a query as JSON, without scoring.
    Candidates {
        /// Search query.
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trend_scout=info,scout_extract=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ScoutConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Command::Run { topics } => run(config, topics).await,
        Command::Candidates { query } => candidates(config, &query).await,
    }
}

async fn run(config: ScoutConfig, topic_names: Vec<String>) -> anyhow::Result<()> {
    let credentials = Credentials::from_env(&config)?;
    let scout = DefaultTrendScout::from_config(&config, &credentials)?;

    let topics = if topic_names.is_empty() {
        config.effective_topics()
    } else {
        let template = config.effective_topics().into_iter().next().unwrap_or_default();
        topic_names
            .into_iter()
            .map(|topic| TopicSpec { topic, ..template.clone() })
            .collect()
    };

    tracing::info!(topics = topics.len(), "trend-scout starting");
    let reports = scout.run_all(&topics).await;

    let mut failed = 0usize;
    for report in &reports {
        match &report.result {
            Ok(TopicOutcome::Recorded { top_name, score, .. }) => {
                println!("{}\trecorded\t{score:.1}\t{top_name}", report.topic.topic);
            }
            Ok(TopicOutcome::AlreadyRecorded { top_name }) => {
                println!("{}\tskipped\t-\t{top_name}", report.topic.topic);
            }
            Ok(TopicOutcome::NoCandidates) => {
                println!("{}\tempty\t-\t-", report.topic.topic);
            }
            Err(e) => {
                failed += 1;
                println!("{}\tfailed\t-\t{e}", report.topic.topic);
            }
        }
    }

    if failed == reports.len() && !reports.is_empty() {
        anyhow::bail!("all {failed} topics failed");
    }
    Ok(())
}

async fn candidates(config: ScoutConfig, query: &str) -> anyhow::Result<()> {
    let api_key = std::env::var(&config.search.api_key_env).map_err(|_| {
        ScoutError::Credentials(format!("{} is not set", config.search.api_key_env))
    })?;
    let provider = brave_provider(&config, &api_key)?;
    let fetcher = HttpFetcher::new(&config.extract)?;
    let finder = CandidateFinder::from_config(config.extract.clone())?;

    let query = build_query(query, &config.search.site_hint);
    let result = scout_extract::collect_candidates(&query, &provider, &fetcher, &finder).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
