//! Per-source entrypoint.
//!
//! Default mode prints progress and writes a Markdown report. With `--json`,
//! stdout carries exactly one line (a JSON array of items) and all
//! diagnostics go to stderr. `--fixture` replays recorded pages instead of
//! fetching.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use finnews_aggregator::config::ServiceConfig;
use finnews_aggregator::ingest::page::{FixturePageDriver, HttpPageDriver, PageDriver};
use finnews_aggregator::ingest::providers::{profile, ProfileExtractor};
use finnews_aggregator::ingest::time::source_now;
use finnews_aggregator::ingest::types::{SourceExtractor, WireItem};
use finnews_aggregator::report::write_report;
use finnews_aggregator::sources::{descriptor, SOURCES};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LIMIT: usize = 20;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape one news source for a keyword")]
struct Cli {
    /// Source id (toutiao, cls, wallstreet, futu, futu_report, gelonghui, eastmoney, zhitong)
    source: String,

    /// Search keyword (may start with '-', e.g. -ST stocks)
    #[arg(allow_hyphen_values = true)]
    keyword: String,

    /// Maximum number of items
    limit: Option<usize>,

    /// Print one JSON line to stdout instead of writing a report
    #[arg(long)]
    json: bool,

    /// Report directory (default: configured report_dir)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Recorded HTML snapshot, one per round; repeat for later rounds
    #[arg(long = "fixture", value_name = "FILE")]
    fixtures: Vec<PathBuf>,
}

fn init_tracing(json: bool) {
    let fallback = if json { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            // help/version go to stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_tracing(cli.json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "scrape failed");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (Some(profile), Some(desc)) = (profile(&cli.source), descriptor(&cli.source)) else {
        let known: Vec<&str> = SOURCES.iter().map(|d| d.id).collect();
        anyhow::bail!("unknown source '{}'; expected one of: {}", cli.source, known.join(", "));
    };
    let keyword = cli.keyword.trim();
    anyhow::ensure!(!keyword.is_empty(), "keyword must not be blank");
    let limit = cli.limit.filter(|n| *n > 0).unwrap_or(DEFAULT_LIMIT);

    let config = ServiceConfig::load_default().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "config unavailable; using defaults");
        ServiceConfig::default()
    });
    let driver: Arc<dyn PageDriver> = if cli.fixtures.is_empty() {
        Arc::new(HttpPageDriver::new(&config.user_agent, config.navigation_timeout())?)
    } else {
        let mut pages = Vec::with_capacity(cli.fixtures.len());
        for path in &cli.fixtures {
            let html = std::fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))?;
            pages.push(html);
        }
        Arc::new(FixturePageDriver::new(pages))
    };
    let extractor = ProfileExtractor::new(profile, driver);

    let started_at = source_now();
    let t0 = Instant::now();
    if !cli.json {
        println!("🔍 {} · {keyword} · limit {limit}", desc.display_name);
    }
    info!(source = desc.id, keyword, limit, "scrape started");

    let items = extractor.extract(keyword, limit).await?;
    let elapsed = t0.elapsed();
    info!(source = desc.id, items = items.len(), elapsed_ms = elapsed.as_millis() as u64, "scrape finished");

    if cli.json {
        let wire: Vec<WireItem> = items.iter().map(|i| WireItem::from_raw(i, started_at)).collect();
        println!("{}", serde_json::to_string(&wire).context("encoding items")?);
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        println!("{:>3}. {}", i + 1, item.title);
    }
    let dir = cli.out_dir.unwrap_or(config.report_dir);
    let path = write_report(&dir, keyword, desc.display_name, started_at, Some(elapsed), &items)?;
    println!("📄 {} items in {:.1}s → {}", items.len(), elapsed.as_secs_f64(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_may_start_with_a_hyphen() {
        for argv in [
            &["scrape_source", "cls", "-ST康美", "5", "--json"][..],
            &["scrape_source", "--json", "--", "cls", "-ST康美", "5"][..],
        ] {
            let cli = Cli::try_parse_from(argv).unwrap();
            assert_eq!(cli.source, "cls");
            assert_eq!(cli.keyword, "-ST康美");
            assert_eq!(cli.limit, Some(5));
            assert!(cli.json);
        }
    }

    #[test]
    fn fixtures_repeat_in_order() {
        let cli = Cli::try_parse_from([
            "scrape_source",
            "--fixture",
            "p0.html",
            "--fixture",
            "p1.html",
            "--",
            "eastmoney",
            "小米集团",
        ])
        .unwrap();
        assert_eq!(cli.fixtures, [PathBuf::from("p0.html"), PathBuf::from("p1.html")]);
        assert_eq!(cli.limit, None);
        assert!(!cli.json);
    }
}
