use std::fmt::Write;

use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::error::ErrorKind;
use crate::models::{DatasetOverview, PortfolioSummary, StockStatus};
use crate::portfolio::status_mix;

pub fn format_days(days: f64) -> String {
    if days.is_infinite() {
        "∞".to_string()
    } else {
        format!("{days:.1}")
    }
}

pub fn status_label(status: StockStatus) -> &'static str {
    match status {
        StockStatus::Critical => "critical",
        StockStatus::Warning => "warning",
        StockStatus::Good => "good",
    }
}

pub fn remediation_hint(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InsufficientData => "need at least 10 days of sales history (about 2 weeks) to forecast",
        ErrorKind::ForecastFailed => "the forecasting model could not produce a forecast; check the history for gaps or outliers",
        ErrorKind::InvalidConfiguration => "adjust the planning parameters to their allowed ranges",
        ErrorKind::MissingEntity => "the sku does not appear in the dataset",
        ErrorKind::ForecastTooShort => "the forecast horizon is shorter than lead time plus safety stock",
    }
}

pub fn build_report(
    run_id: Uuid,
    config: &PlanningConfig,
    overview: &DatasetOverview,
    summary: &PortfolioSummary,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Inventory Portfolio Report");
    let _ = writeln!(output, "Run {run_id}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Parameters");
    let _ = writeln!(output, "- Forecast horizon: {} days", config.forecast_days);
    let _ = writeln!(output, "- Lead time: {} days", config.lead_time_days);
    let _ = writeln!(output, "- Safety stock: {} days", config.safety_stock_days);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Dataset");
    let _ = writeln!(output, "- Rows: {}", overview.total_rows);
    let _ = writeln!(output, "- SKUs: {}", overview.unique_skus);
    match (overview.first_date, overview.last_date) {
        (Some(first), Some(last)) => {
            let _ = writeln!(output, "- Period: {first} to {last}");
        }
        _ => {
            let _ = writeln!(output, "- Period: n/a");
        }
    }
    let _ = writeln!(output, "- Units sold: {:.0}", overview.total_units_sold);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    for (status, count) in status_mix(&summary.entries) {
        let _ = writeln!(output, "- {}: {}", status_label(status), count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stock by SKU");

    if summary.entries.is_empty() {
        let _ = writeln!(output, "Not enough history for any SKU.");
    } else {
        let _ = writeln!(
            output,
            "| SKU | Current stock | Avg daily sales | Days of stock | Status |"
        );
        let _ = writeln!(output, "|---|---:|---:|---:|---|");
        for entry in &summary.entries {
            let _ = writeln!(
                output,
                "| {} | {:.0} | {:.1} | {} | {} |",
                entry.sku,
                entry.current_stock,
                entry.avg_daily_sales,
                format_days(entry.days_of_stock),
                status_label(entry.status)
            );
        }
    }

    if !summary.skipped.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Skipped SKUs");
        for skipped in &summary.skipped {
            let _ = writeln!(output, "- {}: {}", skipped.sku, skipped.detail);
        }
    }

    output
}
