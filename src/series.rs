use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailyHistoryPoint, DailySales, DailySeries, SalesRecord};

/// Trailing window used for average daily sales.
pub const TRAILING_WINDOW_DAYS: usize = 30;

/// Sum `units_sold` per calendar day for `sku`, ascending by date.
///
/// A SKU with no records yields an empty series.
pub fn aggregate_daily<'a>(
    records: impl IntoIterator<Item = &'a SalesRecord>,
    sku: &str,
) -> DailySeries {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for record in records.into_iter().filter(|r| r.sku == sku) {
        *totals.entry(record.date).or_insert(0.0) += record.units_sold;
    }

    let points = totals
        .into_iter()
        .map(|(date, units_sold)| DailySales { date, units_sold })
        .collect();

    DailySeries::from_sorted(sku, points)
}

/// On-hand stock at the end of the most recent day.
///
/// When several records share that day, the last one in input order wins.
pub fn current_stock<'a>(
    records: impl IntoIterator<Item = &'a SalesRecord>,
    sku: &str,
) -> Option<f64> {
    let mut latest: Option<&SalesRecord> = None;

    for record in records.into_iter().filter(|r| r.sku == sku) {
        match latest {
            Some(current) if record.date < current.date => {}
            _ => latest = Some(record),
        }
    }

    latest.map(|record| record.on_hand_end)
}

/// Mean of the trailing 30 entries (or all entries when fewer exist).
///
/// `None` for an empty series so that "no history" never reads as zero demand.
pub fn avg_daily_sales(series: &DailySeries) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let points = series.points();

    let window = &points[points.len().saturating_sub(TRAILING_WINDOW_DAYS)..];
    let total: f64 = window.iter().map(|p| p.units_sold).sum();
    Some(total / window.len() as f64)
}

/// Per-day sales with the end-of-day stock gauge, for charting.
pub fn daily_history<'a>(
    records: impl IntoIterator<Item = &'a SalesRecord>,
    sku: &str,
) -> Vec<DailyHistoryPoint> {
    let mut days: BTreeMap<NaiveDate, DailyHistoryPoint> = BTreeMap::new();

    for record in records.into_iter().filter(|r| r.sku == sku) {
        let entry = days.entry(record.date).or_insert(DailyHistoryPoint {
            date: record.date,
            units_sold: 0.0,
            on_hand_end: record.on_hand_end,
        });
        entry.units_sold += record.units_sold;
        entry.on_hand_end = record.on_hand_end;
    }

    days.into_values().collect()
}
