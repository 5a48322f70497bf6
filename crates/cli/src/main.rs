use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockrec_core::config::Settings;
use stockrec_core::extract::{mapping, Extractor};
use stockrec_core::ingest::{CompanyPageSource, CompanyPages, ScreenerClient};
use stockrec_core::{Analyzer, AnalyzerOptions, FinancialSnapshot, StockRecommendation};

mod report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "stockrec_cli", about = "Fundamentals-based Buy/Sell/Hold recommendations")]
struct Args {
    /// Company names to look up and analyze online.
    companies: Vec<String>,

    /// Analyze a saved company page instead of fetching.
    #[arg(long, conflicts_with = "json")]
    html: Option<PathBuf>,

    /// Saved investors page used for the shareholding pattern.
    #[arg(long, requires = "html")]
    investors_html: Option<PathBuf>,

    /// Company name for offline input. Defaults to the file stem.
    #[arg(long)]
    name: Option<String>,

    /// Analyze a JSON mapping with the extractor's section keys.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print the extracted data instead of a recommendation.
    #[arg(long)]
    raw: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Pause between online companies, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Number of reasons shown in text output.
    #[arg(long, default_value_t = 3)]
    top: usize,

    /// Most recent quarterly rows kept from a page.
    #[arg(long)]
    max_periods: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let analyzer = Analyzer::new(AnalyzerOptions::from_settings(&settings));
    let extractor = args
        .max_periods
        .map(Extractor::with_max_periods)
        .unwrap_or_default();

    if let Some(path) = &args.json {
        return run_json(&args, &analyzer, path);
    }
    if let Some(path) = &args.html {
        return run_html(&args, &analyzer, &extractor, path);
    }
    anyhow::ensure!(
        !args.companies.is_empty(),
        "nothing to analyze: pass company names, --html or --json"
    );

    let client = ScreenerClient::from_settings(&settings)?;
    if let Err(err) = run_online(&args, &analyzer, &extractor, &client).await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

fn run_json(args: &Args, analyzer: &Analyzer, path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    if args.raw {
        let snapshot = mapping::snapshot_from_value(&value)?;
        return print_json(&snapshot);
    }
    let rec = analyzer.analyze_value(&value);
    emit(args, &rec, None)
}

fn run_html(
    args: &Args,
    analyzer: &Analyzer,
    extractor: &Extractor,
    path: &Path,
) -> anyhow::Result<()> {
    let company_html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let investors_html = args
        .investors_html
        .as_deref()
        .map(|p| {
            std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        })
        .transpose()?;

    let name = args.name.clone().unwrap_or_else(|| file_stem(path));
    let pages = CompanyPages {
        url: path.display().to_string(),
        company_html,
        investors_html,
    };
    let snapshot = extractor.extract_pages(&pages, &name);
    report_snapshot(args, analyzer, &snapshot)
}

async fn run_online(
    args: &Args,
    analyzer: &Analyzer,
    extractor: &Extractor,
    source: &dyn CompanyPageSource,
) -> anyhow::Result<()> {
    let mut failures = 0usize;
    for (idx, company) in args.companies.iter().enumerate() {
        if idx != 0 && args.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }

        match source.fetch_company_pages(company).await {
            Ok(Some(pages)) => {
                let snapshot = extractor.extract_pages(&pages, company);
                if snapshot.is_not_found() {
                    tracing::warn!(company = %company, "page has no overview data");
                    println!("{company}: not found");
                    continue;
                }
                report_snapshot(args, analyzer, &snapshot)?;
            }
            Ok(None) => {
                tracing::warn!(company = %company, "company not found");
                println!("{company}: not found");
            }
            Err(err) => {
                failures += 1;
                tracing::error!(company = %company, error = %err, "fetch failed; skipping company");
            }
        }
    }

    anyhow::ensure!(
        failures == 0,
        "{failures} of {} companies could not be fetched",
        args.companies.len()
    );
    Ok(())
}

fn report_snapshot(
    args: &Args,
    analyzer: &Analyzer,
    snapshot: &FinancialSnapshot,
) -> anyhow::Result<()> {
    if args.raw {
        return print_json(snapshot);
    }
    let rec = analyzer.analyze(snapshot);
    emit(args, &rec, Some(snapshot))
}

fn emit(
    args: &Args,
    rec: &StockRecommendation,
    snapshot: Option<&FinancialSnapshot>,
) -> anyhow::Result<()> {
    match args.format {
        OutputFormat::Json => print_json(rec),
        OutputFormat::Text => {
            print!("{}", report::render_text(rec, snapshot, args.top));
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_online_companies_with_defaults() {
        let args = Args::try_parse_from(["stockrec_cli", "Infosys", "TCS"]).unwrap();
        assert_eq!(args.companies, vec!["Infosys", "TCS"]);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.top, 3);
        assert_eq!(args.delay_ms, 1000);
        assert!(!args.raw);
    }

    #[test]
    fn investors_page_requires_main_page() {
        assert!(Args::try_parse_from(["stockrec_cli", "--investors-html", "inv.html"]).is_err());
        let args = Args::try_parse_from([
            "stockrec_cli",
            "--html",
            "infy.html",
            "--investors-html",
            "inv.html",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn html_and_json_inputs_conflict() {
        assert!(
            Args::try_parse_from(["stockrec_cli", "--html", "a.html", "--json", "a.json"]).is_err()
        );
    }

    #[test]
    fn offline_name_defaults_to_file_stem() {
        assert_eq!(file_stem(Path::new("/tmp/pages/Infosys.html")), "Infosys");
    }
}
