//! job-scout: search every configured job source, print a ranked shortlist.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_scout::assist::AssistRuntime;
use job_scout::ingest::config::{load_sources_default, load_sources_from};
use job_scout::{AggregateReport, Aggregator, Preferences, Scorer};

#[derive(Parser, Debug)]
#[command(name = "job-scout", version, about = "Aggregate, dedupe and rank job postings")]
struct Cli {
    /// Preferences JSON file; flags below are merged on top
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Job title to search for (repeatable)
    #[arg(long = "title")]
    titles: Vec<String>,

    /// Location to pair with every title (repeatable)
    #[arg(long = "location")]
    locations: Vec<String>,

    /// Literal search query, used verbatim (repeatable; overrides titles)
    #[arg(long = "query")]
    queries: Vec<String>,

    #[arg(long, default_value_t = false)]
    remote_only: bool,

    /// Drop postings whose best known salary is below this
    #[arg(long)]
    min_salary: Option<u32>,

    /// 0 means no cap
    #[arg(long)]
    max_results: Option<usize>,

    /// Sources config (TOML or JSON)
    #[arg(long, env = "SOURCES_CONFIG_PATH")]
    sources: Option<PathBuf>,

    /// Scoring table (TOML)
    #[arg(long, env = "SCORING_CONFIG_PATH")]
    scoring: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,

    /// Draft cover letters for the top N postings
    #[arg(long, value_name = "N")]
    cover_letter: Option<usize>,

    /// Candidate summary used for cover letters
    #[arg(long, env = "JOB_SCOUT_PROFILE", default_value = "")]
    profile: String,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("job_scout=info,warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_preferences(path: Option<&Path>) -> Result<Preferences> {
    match path {
        Some(p) => {
            let s = std::fs::read_to_string(p)
                .with_context(|| format!("reading preferences {}", p.display()))?;
            serde_json::from_str(&s).with_context(|| format!("parsing preferences {}", p.display()))
        }
        None => Ok(Preferences::default()),
    }
}

fn merge_flags(mut prefs: Preferences, cli: &Cli) -> Preferences {
    if !cli.queries.is_empty() {
        prefs.queries = Some(cli.queries.clone());
    }
    if !cli.titles.is_empty() {
        prefs.job_titles = cli.titles.clone();
    }
    if !cli.locations.is_empty() {
        prefs.locations = cli.locations.clone();
    }
    if cli.remote_only {
        prefs.remote_only = true;
    }
    if let Some(m) = cli.min_salary {
        prefs.min_salary = m;
    }
    if let Some(n) = cli.max_results {
        prefs.max_results = n;
    }
    prefs
}

fn print_table(report: &AggregateReport) {
    for (i, p) in report.postings.iter().enumerate() {
        let salary = match (p.salary_min, p.salary_max) {
            (Some(lo), Some(hi)) if lo != hi => format!("${lo}-${hi}"),
            (Some(v), _) | (None, Some(v)) => format!("${v}"),
            (None, None) => "-".to_string(),
        };
        let posted = p
            .posted_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}. [{:>3}] {} | {} | {} | {} | {} | {}",
            i + 1,
            p.relevance_score(),
            p.title,
            p.company,
            if p.location.is_empty() { "-" } else { p.location.as_str() },
            salary,
            posted,
            p.url
        );
    }
    println!(
        "\n{} shown, {} found; by source: {:?}",
        report.postings.len(),
        report.total_found,
        report.by_source
    );
    if !report.degraded_sources.is_empty() {
        println!("degraded: {}", report.degraded_sources.join(", "));
    }
    if report.cancelled {
        println!("(interrupted; partial results)");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present (ADZUNA_*, OPENAI_API_KEY, config paths).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let sources = match cli.sources.as_deref() {
        Some(p) => load_sources_from(p)?,
        None => load_sources_default()?,
    };
    let scorer = match cli.scoring.as_deref() {
        Some(p) => Scorer::from_path(p)?.with_env_overrides(),
        None => Scorer::from_toml()?,
    };
    let prefs = merge_flags(load_preferences(cli.prefs.as_deref())?, &cli);
    if prefs.search_queries().is_empty() {
        anyhow::bail!("nothing to search: pass --title, --query or --prefs");
    }

    let aggregator = Aggregator::from_config(&sources, scorer);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let report = aggregator
        .aggregate_with_cancel(&prefs, chrono::Utc::now(), &cancel)
        .await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }

    if let Some(n) = cli.cover_letter.filter(|n| *n > 0) {
        let assist = AssistRuntime::from_default()?;
        for p in report.postings.iter().take(n) {
            match assist.cover_letter(p, &cli.profile).await {
                Some(letter) => println!("\n=== {} @ {} ===\n{}", p.title, p.company, letter),
                None => println!("\n=== {} @ {} ===\n(no draft)", p.title, p.company),
            }
        }
    }

    Ok(())
}
