use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::PlanningConfig;
use crate::error::{EngineError, EngineResult};
use crate::ingest::Dataset;
use crate::inventory::days_of_stock;
use crate::models::{PortfolioEntry, PortfolioSummary, SalesRecord, SkippedSku, StockStatus};
use crate::series::{aggregate_daily, avg_daily_sales, current_stock};
use crate::status::classify;

/// Minimum daily points for a SKU to appear in the portfolio table.
pub const MIN_SUMMARY_POINTS: usize = 5;

/// Forecast-free stock scan across every SKU in the dataset.
///
/// SKUs are evaluated in parallel; entries and skips are both sorted by SKU.
/// A failing SKU is recorded in `skipped` and never aborts the scan.
pub fn summarize(dataset: &Dataset, config: &PlanningConfig) -> EngineResult<PortfolioSummary> {
    let config = config.validate()?;

    let outcomes: Vec<(String, EngineResult<PortfolioEntry>)> = dataset
        .by_sku()
        .into_par_iter()
        .map(|(sku, records)| {
            let outcome = summarize_sku(&records, sku, config.safety_stock_days);
            (sku.to_string(), outcome)
        })
        .collect();

    let mut summary = PortfolioSummary::default();
    for (sku, outcome) in outcomes {
        match outcome {
            Ok(entry) => summary.entries.push(entry),
            Err(err) => {
                warn!(sku = %sku, error = %err, "sku left out of portfolio summary");
                summary.skipped.push(SkippedSku {
                    sku,
                    reason: err.kind(),
                    detail: err.to_string(),
                });
            }
        }
    }

    summary.entries.sort_by(|a, b| a.sku.cmp(&b.sku));
    summary.skipped.sort_by(|a, b| a.sku.cmp(&b.sku));
    info!(
        included = summary.entries.len(),
        skipped = summary.skipped.len(),
        "portfolio summarized"
    );
    Ok(summary)
}

fn summarize_sku(
    records: &[&SalesRecord],
    sku: &str,
    safety_stock_days: u32,
) -> EngineResult<PortfolioEntry> {
    let series = aggregate_daily(records.iter().copied(), sku);
    if series.len() < MIN_SUMMARY_POINTS {
        return Err(EngineError::insufficient(sku, MIN_SUMMARY_POINTS, series.len()));
    }

    let stock = current_stock(records.iter().copied(), sku).ok_or_else(|| EngineError::missing(sku))?;
    let avg = avg_daily_sales(&series)
        .ok_or_else(|| EngineError::insufficient(sku, MIN_SUMMARY_POINTS, 0))?;
    let days = days_of_stock(stock, avg);

    Ok(PortfolioEntry {
        sku: sku.to_string(),
        history_days: series.len(),
        current_stock: stock,
        avg_daily_sales: avg,
        days_of_stock: days,
        status: classify(days, safety_stock_days),
    })
}

/// Count of entries per status, in `Critical`, `Warning`, `Good` order.
pub fn status_mix(entries: &[PortfolioEntry]) -> Vec<(StockStatus, usize)> {
    [StockStatus::Critical, StockStatus::Warning, StockStatus::Good]
        .into_iter()
        .map(|status| {
            let count = entries.iter().filter(|e| e.status == status).count();
            (status, count)
        })
        .collect()
}
