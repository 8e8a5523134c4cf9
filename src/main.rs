use analytics::{PerformanceEngine, RangeSummary};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use configuration::{init_tracing, load_config, ConfigArgs, Settings};
use core_types::{AccountId, DailyAggregate, StrategyId};
use database::{connect, run_migrations, DbRepository};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::time::Duration;

/// The main entry point for the Brokerwatch application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = load_config(&cli.config.config)
        .with_context(|| format!("loading configuration from {}", cli.config.config.display()))?;
    let _guard = init_tracing(&settings.logging).context("initialising logging")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => web_server::run_server(settings).await,
        Commands::Migrate => handle_migrate(&settings).await,
        Commands::Performance(args) => handle_performance(args, &settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Tracks brokerage account valuations and their organic performance.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API server.
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Print the daily performance series of an account or a strategy.
    Performance(PerformanceArgs),
}

#[derive(Parser)]
#[command(group(ArgGroup::new("target").required(true).args(["account", "strategy"])))]
struct PerformanceArgs {
    /// The account to report on.
    #[arg(long)]
    account: Option<AccountId>,

    /// The strategy to report on, across every account that executed it.
    #[arg(long)]
    strategy: Option<StrategyId>,

    /// First date of the range (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date of the range (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_migrate(settings: &Settings) -> anyhow::Result<()> {
    let db_pool = connect(&settings.database)
        .await
        .context("connecting to the database")?;
    run_migrations(&db_pool).await.context("applying migrations")?;
    println!("Database schema is up to date.");
    Ok(())
}

/// Loads the valuations, runs the engine and prints the series as a table.
async fn handle_performance(args: PerformanceArgs, settings: &Settings) -> anyhow::Result<()> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        anyhow::ensure!(from <= to, "--from {from} is after --to {to}");
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Loading valuations...");

    let db_pool = connect(&settings.database)
        .await
        .context("connecting to the database")?;
    let db_repo = DbRepository::new(db_pool);
    let (label, values) = match (args.account, args.strategy) {
        (Some(account_id), _) => (
            format!("Account {account_id}"),
            db_repo
                .get_account_values_for_period(account_id, args.from, args.to)
                .await?,
        ),
        (None, Some(strategy_id)) => (
            format!("Strategy {strategy_id}"),
            db_repo
                .get_account_values_for_strategy(strategy_id, None, args.from, args.to)
                .await?,
        ),
        (None, None) => anyhow::bail!("either --account or --strategy is required"),
    };

    spinner.set_message("Computing performance...");
    let series = PerformanceEngine::new()
        .compute_performance(&values, &db_repo)
        .await?;
    spinner.finish_and_clear();

    tracing::info!(report = %label, days = series.len(), "Performance computed.");

    let Some(summary) = RangeSummary::from_series(&series) else {
        println!("{label}: no valuations in range.");
        return Ok(());
    };

    println!("{}", series_table(&series));
    println!(
        "{label}: {} to {} over {} days, {} -> {} (net flows {}), performance {}",
        summary.start_date,
        summary.end_date,
        summary.days,
        summary.start_value,
        summary.end_value,
        summary.net_flows,
        format_percent(summary.range_performance),
    );
    Ok(())
}

fn series_table(series: &[DailyAggregate]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Date",
        "Value",
        "Flows",
        "Day",
        "Cumulative",
    ]);

    for day in series {
        table.add_row(vec![
            Cell::new(day.value_date),
            Cell::new(day.value.round_dp(2)).set_alignment(CellAlignment::Right),
            Cell::new(day.transaction_value.round_dp(2)).set_alignment(CellAlignment::Right),
            Cell::new(format_percent(day.day_performance - Decimal::ONE))
                .set_alignment(CellAlignment::Right),
            Cell::new(format_percent(day.range_performance - Decimal::ONE))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Renders a fractional return as a signed percentage with two decimals.
fn format_percent(fraction: Decimal) -> String {
    let percent = (fraction * Decimal::ONE_HUNDRED).round_dp(2);
    if percent.is_sign_positive() && !percent.is_zero() {
        format!("+{percent:.2}%")
    } else {
        format!("{percent:.2}%")
    }
}
