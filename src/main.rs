use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod analysis;
mod config;
mod error;
mod forecast;
mod ingest;
mod inventory;
mod models;
mod oracle;
mod portfolio;
mod report;
mod series;
mod status;

use config::{PlanningArgs, PlanningConfig};
use forecast::ForecastOrchestrator;
use oracle::SeasonalProfileOracle;

#[derive(Parser)]
#[command(name = "stock-forecast")]
#[command(about = "Demand forecasting and reorder recommendations from daily sales history", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the dataset: rows, SKUs, period, units sold
    Overview {
        #[arg(long)]
        data: PathBuf,
    },
    /// Forecast demand and recommend an order for one SKU
    Analyze {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        sku: String,
        #[command(flatten)]
        planning: PlanningArgs,
        #[arg(long)]
        json: bool,
    },
    /// Forecast-free stock status for every SKU
    Summary {
        #[arg(long)]
        data: PathBuf,
        #[command(flatten)]
        planning: PlanningArgs,
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown portfolio report
    Report {
        #[arg(long)]
        data: PathBuf,
        #[command(flatten)]
        planning: PlanningArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let run_id = Uuid::new_v4();
    run(cli.command, run_id)
        .instrument(tracing::info_span!("run", %run_id))
        .await
}

async fn run(command: Commands, run_id: Uuid) -> anyhow::Result<()> {
    match command {
        Commands::Overview { data } => {
            let dataset = ingest::load_csv(&data)?;
            let overview = dataset.overview();
            println!("Rows: {}", overview.total_rows);
            println!("SKUs: {}", overview.unique_skus);
            match (overview.first_date, overview.last_date) {
                (Some(first), Some(last)) => println!("Period: {first} → {last}"),
                _ => println!("Period: n/a"),
            }
            println!("Units sold: {:.0}", overview.total_units_sold);
        }
        Commands::Analyze {
            data,
            sku,
            planning,
            json,
        } => {
            let config = PlanningConfig::from(planning).validate()?;
            let dataset = ingest::load_csv(&data)?;
            let orchestrator = ForecastOrchestrator::new(
                Arc::new(SeasonalProfileOracle::default()),
                config.oracle_timeout(),
            );
            let analysis = match analysis::analyze_sku(&dataset, &sku, &config, &orchestrator).await
            {
                Ok(analysis) => analysis,
                Err(err) => {
                    eprintln!(
                        "{}: {}",
                        err.sku().unwrap_or(&sku),
                        report::remediation_hint(err.kind())
                    );
                    return Err(err).with_context(|| format!("analysis of {sku} failed"));
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
                return Ok(());
            }

            let rec = &analysis.recommendation;
            println!("{} ({} days of history)", rec.sku, analysis.history.len());
            println!("- current stock {:.0}", rec.current_stock);
            println!(
                "- forecasted demand {:.0} over {} days (lead time + safety stock)",
                rec.forecasted_demand, rec.horizon_days
            );
            println!("- recommended order {:.0}", rec.recommended_order);
            println!(
                "- days of stock {} ({})",
                report::format_days(rec.days_of_stock),
                report::status_label(rec.status)
            );
            println!("- weekly velocity {:.1} units", analysis.weekly_velocity);
        }
        Commands::Summary {
            data,
            planning,
            json,
        } => {
            let config = PlanningConfig::from(planning).validate()?;
            let dataset = ingest::load_csv(&data)?;
            let summary = portfolio::summarize(&dataset, &config)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            if summary.entries.is_empty() {
                println!("Not enough history for any SKU.");
            }
            for entry in &summary.entries {
                println!(
                    "- {} stock {:.0}, {:.1}/day, {} days ({})",
                    entry.sku,
                    entry.current_stock,
                    entry.avg_daily_sales,
                    report::format_days(entry.days_of_stock),
                    report::status_label(entry.status)
                );
            }
            for skipped in &summary.skipped {
                println!("- {} skipped: {}", skipped.sku, skipped.detail);
            }
        }
        Commands::Report {
            data,
            planning,
            out,
        } => {
            let config = PlanningConfig::from(planning).validate()?;
            let dataset = ingest::load_csv(&data)?;
            let summary = portfolio::summarize(&dataset, &config)?;
            let report = report::build_report(run_id, &config, &dataset.overview(), &summary);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
