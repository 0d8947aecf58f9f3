//! # readiness CLI
//!
//! Command-line front end for programme scraping and gap analysis.
//!
//! - `scrape`: fetch programme pages and documents, analyse, print the report
//! - `analyze`: re-run the gap analysis on a saved programme JSON
//! - `plan`: print the prioritized improvement plan for a saved programme
//! - `demo`: analyse the built-in sample programme
//! - `history`: list stored analyses for a programme

mod telemetry;

use anyhow::{Context, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

use readiness::demo::sample_programme;
use readiness::document::DocumentInput;
use readiness::fetcher::{FetcherConfig, HttpFetcher, PageFetcher};
use readiness::gap::{GapAnalysisResult, GapAnalyzer, GateId, GateStatus, ScoringConfig};
use readiness::model::{EmbeddingService, GeminiEmbeddingModel};
use readiness::pillar::SemanticCoverage;
use readiness::programme::ProgrammeData;
use readiness::report::{format_gap_report, format_improvement_report};
use readiness::scraper::{ProgrammeScraper, ScrapeConfig, ScrapeRequest};
use readiness::storage::{AnalysisStore, Archiving, DEFAULT_STORE_PATH, PageArchive};

#[derive(Parser)]
#[command(author, version, about = "Programme content extraction and accreditation gap analysis", long_about = None)]
struct Cli {
    /// Also write logs to readiness.log in this directory
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape programme pages and analyse them
    Scrape(ScrapeArgs),

    /// Re-run the gap analysis on a saved programme
    Analyze(AnalyzeArgs),

    /// Print the prioritized improvement plan for a saved programme
    Plan(PlanArgs),

    /// Analyse the built-in sample programme
    Demo(DemoArgs),

    /// List stored analyses for a programme
    History(HistoryArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// Gate evidence as ELG-n=status, e.g. ELG-6=pass
    #[arg(long = "gate", value_name = "GATE=STATUS")]
    gates: Vec<String>,

    /// Score pillars by embedding similarity (needs GOOGLE_API_KEY or GEMINI_API_KEY)
    #[arg(long)]
    embeddings: bool,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Programme page URLs, the first is the primary URL
    #[arg(required = true)]
    urls: Vec<String>,

    /// Institution name (derived from the URL if omitted)
    #[arg(short, long)]
    institution: Option<String>,

    /// Programme name (derived from the page title if omitted)
    #[arg(short, long)]
    programme: Option<String>,

    /// Programme documents to harvest outcomes from (PDF, DOCX, TXT)
    #[arg(short, long = "document")]
    documents: Vec<PathBuf>,

    /// Do not try language variants of the URLs
    #[arg(long)]
    no_variants: bool,

    /// Number of concurrent fetches
    #[arg(short, long, default_value = "1")]
    concurrency: usize,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Archive fetched pages in this directory
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Replay pages from the archive instead of fetching
    #[arg(long, requires = "archive")]
    offline: bool,

    /// Save the programme and analysis to the store
    #[arg(long)]
    save: bool,

    /// Analysis store directory
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    #[command(flatten)]
    analysis: AnalysisArgs,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Programme JSON, as written by `scrape --format json`
    #[arg(required = true)]
    programme: PathBuf,

    /// Save the analysis to the store
    #[arg(long)]
    save: bool,

    /// Analysis store directory
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    #[command(flatten)]
    analysis: AnalysisArgs,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Programme JSON, as written by `scrape --format json`
    #[arg(required = true)]
    programme: PathBuf,

    #[command(flatten)]
    analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
struct DemoArgs {
    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    /// Programme id; lists all stored programmes when omitted
    programme_id: Option<String>,

    /// Analysis store directory
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber(cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Scrape(args)) => scrape_command(args).await?,
        Some(Commands::Analyze(args)) => analyze_command(args).await?,
        Some(Commands::Plan(args)) => plan_command(args).await?,
        Some(Commands::Demo(args)) => demo_command(args).await?,
        Some(Commands::History(args)) => history_command(args).await?,
        None => Cli::command().print_help()?,
    }

    Ok(())
}

#[instrument]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<()> {
    let embeddings = embedding_service(args.analysis.embeddings);
    let analyzer = build_analyzer(&args.analysis, embeddings.as_ref()).await?;

    let mut request = ScrapeRequest::new(args.urls.clone()).follow_variants(!args.no_variants);
    if let Some(institution) = &args.institution {
        request = request.institution(institution.clone());
    }
    if let Some(programme) = &args.programme {
        request = request.programme_name(programme.clone());
    }
    for path in &args.documents {
        let document = DocumentInput::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        request = request.document(document);
    }

    let config = ScrapeConfig::builder().concurrency(args.concurrency).build();
    let programme = match (&args.archive, args.offline) {
        (Some(dir), true) => {
            run_scrape(PageArchive::new(dir), config, request, embeddings).await
        }
        (Some(dir), false) => {
            let fetcher = Archiving::new(http_fetcher(args.timeout)?, PageArchive::new(dir));
            run_scrape(fetcher, config, request, embeddings).await
        }
        (None, _) => run_scrape(http_fetcher(args.timeout)?, config, request, embeddings).await,
    };

    for note in &programme.scrape_notes {
        warn!("{}", note);
    }

    let result = analyzer.analyze_gaps(&programme)?;
    if args.save {
        save_analysis(&args.store, &programme, &result).await;
    }
    emit_report(&result, &args.out).await
}

fn http_fetcher(timeout_secs: u64) -> anyhow::Result<HttpFetcher> {
    let config = FetcherConfig::builder().timeout_secs(timeout_secs).build();
    Ok(HttpFetcher::with_config(config)?)
}

/// Scrape with any fetcher; Ctrl-C stops further fetches
async fn run_scrape<F: PageFetcher>(
    fetcher: F,
    config: ScrapeConfig,
    request: ScrapeRequest,
    embeddings: Option<EmbeddingService<GeminiEmbeddingModel>>,
) -> ProgrammeData {
    let mut scraper = ProgrammeScraper::new(fetcher).with_config(config);
    if let Some(service) = embeddings {
        scraper = scraper.with_embeddings(service);
    }

    let cancel = scraper.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with the pages fetched so far");
            cancel.cancel();
        }
    });

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Scraping {}", request.urls.join(", ")));

    let programme = scraper.scrape_programme(request).await;
    interrupt.abort();

    spinner.finish_with_message(format!(
        "Scraped {} pages, {} ILOs, {} courses",
        programme.urls_scraped.len(),
        programme.programme_ilos.len(),
        programme.courses.len()
    ));
    programme
}

#[instrument]
async fn analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let programme = load_programme(&args.programme).await?;
    let embeddings = embedding_service(args.analysis.embeddings);
    let analyzer = build_analyzer(&args.analysis, embeddings.as_ref()).await?;

    let result = analyzer.analyze_gaps(&programme)?;
    if args.save {
        save_analysis(&args.store, &programme, &result).await;
    }
    emit_report(&result, &args.out).await
}

#[instrument]
async fn plan_command(args: PlanArgs) -> anyhow::Result<()> {
    let programme = load_programme(&args.programme).await?;
    let embeddings = embedding_service(args.analysis.embeddings);
    let analyzer = build_analyzer(&args.analysis, embeddings.as_ref()).await?;

    let result = analyzer.analyze_gaps(&programme)?;
    println!("{}", format_improvement_report(&result));
    Ok(())
}

#[instrument]
async fn demo_command(args: DemoArgs) -> anyhow::Result<()> {
    info!("Running demo with the UiA MSc Finance sample programme");
    let result = GapAnalyzer::default().analyze_gaps(&sample_programme())?;
    emit_report(&result, &args.out).await
}

#[instrument]
async fn history_command(args: HistoryArgs) -> anyhow::Result<()> {
    let store = AnalysisStore::new(&args.store);

    let Some(id) = args.programme_id else {
        let ids = store.list_programmes().await?;
        println!("Stored programmes: {}", ids.len());
        for id in ids {
            println!("  {id}");
        }
        return Ok(());
    };

    let history = store.history(&id).await?;
    println!("Analyses for {}: {}", id, history.len());
    for result in history {
        println!(
            "  {}  {:>3}/100  {}  {} critical gaps  (v{})",
            result.analyzed_at.format("%Y-%m-%d %H:%M:%S"),
            result.readiness_score,
            if result.eligibility_pass { "pass" } else { "fail" },
            result.critical_gaps.len(),
            result.analyzer_version
        );
    }
    Ok(())
}

/// Gemini embeddings when requested and a key is configured
fn embedding_service(enabled: bool) -> Option<EmbeddingService<GeminiEmbeddingModel>> {
    if !enabled {
        return None;
    }
    match EmbeddingService::new_gemini_from_env() {
        Ok(service) => Some(service),
        Err(e) => {
            warn!("Embeddings disabled: {}", e);
            None
        }
    }
}

async fn build_analyzer(
    args: &AnalysisArgs,
    embeddings: Option<&EmbeddingService<GeminiEmbeddingModel>>,
) -> anyhow::Result<GapAnalyzer> {
    let mut analyzer =
        GapAnalyzer::new(ScoringConfig::default()).with_gate_evidence(parse_gates(&args.gates)?);

    if let Some(service) = embeddings {
        match SemanticCoverage::from_service(service).await {
            Ok(coverage) => analyzer = analyzer.with_coverage(coverage),
            Err(e) => warn!("Falling back to keyword coverage: {}", e),
        }
    }
    Ok(analyzer)
}

fn parse_gates(gates: &[String]) -> anyhow::Result<BTreeMap<GateId, GateStatus>> {
    gates
        .iter()
        .map(|gate| {
            let (id, status) = gate
                .split_once('=')
                .ok_or_else(|| anyhow!("expected GATE=STATUS, got {gate}"))?;
            let id: GateId = id.parse().map_err(|e: String| anyhow!(e))?;
            let status: GateStatus = status.parse().map_err(|e: String| anyhow!(e))?;
            Ok((id, status))
        })
        .collect()
}

/// Read a programme from either a bare ProgrammeData document or the
/// `{programme, gap_analysis}` document written by `--format json`
async fn load_programme(path: &Path) -> anyhow::Result<ProgrammeData> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    let value = match value.get("programme") {
        Some(programme) if value.get("institution").is_none() => programme.clone(),
        _ => value,
    };
    Ok(serde_json::from_value(value)?)
}

async fn save_analysis(store: &Path, programme: &ProgrammeData, result: &GapAnalysisResult) {
    match AnalysisStore::new(store).save(programme, result).await {
        Ok(id) => info!("Saved analysis as {}", id),
        Err(e) => warn!("Failed to save analysis: {}", e),
    }
}

async fn emit_report(result: &GapAnalysisResult, out: &OutputArgs) -> anyhow::Result<()> {
    let rendered = match out.format.as_str() {
        "json" => serde_json::to_string_pretty(&serde_json::json!({
            "programme": result.programme.without_embeddings(),
            "gap_analysis": result.without_embeddings(),
        }))?,
        _ => format_gap_report(result),
    };

    match &out.output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            println!("Saved report to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
