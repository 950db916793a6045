use analytics::{Analysis, KpiSet, PlotPoint, SeriesPoint};
use anyhow::{bail, Context};
use api_client::{BearerToken, FixtureSource, PositionSource, ProxyClient, ScheduleSource};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::Settings;
use pipeline::{
    Pipeline, PositionSnapshot, ProductFailure, RefreshOutcome, StaticTokenProvider, TokenProvider,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable the identity provider hands the bearer token over in.
const TOKEN_ENV: &str = "FILLSCOPE_TOKEN";

/// The main entry point for the Fillscope positions dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; real deployments inject the environment directly.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = configuration::load_settings(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Report(args) => handle_report(args, &settings).await,
        Commands::Days(args) => handle_days(args, &settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Trading-position analytics: daily groupings, chart series and KPIs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./fillscope.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch positions and print KPIs and the entry/exit series.
    Report(ReportArgs),
    /// List the days that have fills.
    Days(SourceArgs),
}

#[derive(Parser)]
struct SourceArgs {
    /// Read positions from a JSON file instead of the proxy.
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[derive(Parser)]
struct ReportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Narrow the report to positions filled on this day (format: YYYY-MM-DD).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Wiring
// ==============================================================================

/// Builds the pipeline with either the fixture source or the live proxy.
fn build_pipeline(args: &SourceArgs, settings: &Settings) -> anyhow::Result<Pipeline> {
    let identity: Arc<dyn TokenProvider>;
    let schedules: Arc<dyn ScheduleSource>;
    let positions: Arc<dyn PositionSource>;

    match &args.fixture {
        Some(path) => {
            let source = Arc::new(FixtureSource::from_path(path)?);
            identity = Arc::new(StaticTokenProvider::new(BearerToken::new("fixture")));
            schedules = source.clone();
            positions = source;
        }
        None => {
            let client = Arc::new(ProxyClient::new(&settings.proxy, &settings.retry)?);
            identity = Arc::new(StaticTokenProvider::from_env(TOKEN_ENV));
            schedules = client.clone();
            positions = client;
        }
    }
    Ok(Pipeline::new(identity, schedules, positions))
}

/// Runs one refresh and returns the published snapshot.
async fn load_snapshot(pipeline: &Pipeline) -> anyhow::Result<Arc<PositionSnapshot>> {
    match pipeline.refresh().await {
        RefreshOutcome::Applied { snapshot, failures, .. } => {
            if !failures.is_empty() {
                tracing::warn!(
                    products = %failed_products(&failures),
                    "Report is partial; some products could not be fetched."
                );
            }
            Ok(snapshot)
        }
        RefreshOutcome::Unauthenticated => {
            bail!("Not authenticated: set {TOKEN_ENV} or use --fixture")
        }
        RefreshOutcome::Stale { generation } => {
            bail!("Refresh {generation} was superseded before it completed")
        }
    }
}

/// The failed products as one log field; each error was already logged where
/// it happened.
fn failed_products(failures: &[ProductFailure]) -> String {
    failures
        .iter()
        .map(|f| f.product.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ==============================================================================
// Commands
// ==============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    generation: u64,
    positions: usize,
    trading_days: Vec<NaiveDate>,
    kpis: Option<&'a KpiSet>,
    series: &'a [PlotPoint],
    size_series: &'a [SeriesPoint],
    fee_adjusted_series: &'a [SeriesPoint],
    selected_day: Option<NaiveDate>,
}

async fn handle_report(args: ReportArgs, settings: &Settings) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&args.source, settings)?;
    let snapshot = load_snapshot(&pipeline).await?;
    let analysis = snapshot.analyze_local();

    let selection = args.date.map(|date| analysis.select_day(date));
    let (positions, kpis, series, sizes, fee_adjusted) = match &selection {
        Some(day) => (
            day.positions.len(),
            day.kpis.as_ref(),
            day.series.as_slice(),
            day.size_series.as_slice(),
            day.fee_adjusted_series.as_slice(),
        ),
        None => (
            snapshot.positions.len(),
            analysis.kpis.as_ref(),
            analysis.series.as_slice(),
            analysis.size_series.as_slice(),
            analysis.fee_adjusted_series.as_slice(),
        ),
    };

    if args.json {
        let report = JsonReport {
            generation: snapshot.generation.value(),
            positions,
            trading_days: analysis.calendar.trading_days(),
            kpis,
            series,
            size_series: sizes,
            fee_adjusted_series: fee_adjusted,
            selected_day: args.date,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match args.date {
        Some(date) => println!("Positions for {date}: {positions}"),
        None => println!("Positions: {positions}"),
    }
    println!("{}", kpi_table(kpis));
    if !series.is_empty() {
        println!("{}", series_table(series));
        println!("{}", orders_table(sizes, fee_adjusted));
    }
    Ok(())
}

async fn handle_days(args: SourceArgs, settings: &Settings) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&args, settings)?;
    let snapshot = load_snapshot(&pipeline).await?;
    let analysis: Analysis<'_> = snapshot.analyze_local();

    let days = analysis.calendar.by_day();
    if days.is_empty() {
        println!("No Data");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Day", "Fills", "Entries", "Exits"]);
    for (day, positions) in days {
        let entries = positions
            .iter()
            .filter(|p| p.side == core_types::Side::Buy)
            .count();
        table.add_row(vec![
            day.to_string(),
            positions.len().to_string(),
            entries.to_string(),
            (positions.len() - entries).to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn format_metric(value: Option<f64>) -> String {
    match value {
        None => "null".to_string(),
        Some(v) if v.is_nan() => "NaN".to_string(),
        Some(v) => format!("{v:.4}"),
    }
}

fn kpi_table(kpis: Option<&KpiSet>) -> String {
    let Some(kpis) = kpis else {
        return "No Data".to_string();
    };

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    for (name, value) in kpis.named() {
        table.add_row(vec![name.to_string(), format_metric(value)]);
    }
    table.to_string()
}

fn series_table(series: &[PlotPoint]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Time", "Kind", "Value"]);
    for point in series {
        table.add_row(vec![
            point.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:?}", point.kind),
            point.value.to_string(),
        ]);
    }
    table.to_string()
}

fn orders_table(sizes: &[SeriesPoint], fee_adjusted: &[SeriesPoint]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Created", "Filled Size", "Fee-adjusted"]);
    for (size, adjusted) in sizes.iter().zip(fee_adjusted) {
        table.add_row(vec![
            size.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            size.value.to_string(),
            adjusted.value.to_string(),
        ]);
    }
    table.to_string()
}
