use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::error::ErrorKind;
use crate::oracle::OracleConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub sku: String,
    pub units_sold: f64,
    pub on_hand_end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySales {
    pub date: NaiveDate,
    pub units_sold: f64,
}

/// Total units sold per calendar day for one SKU.
///
/// Dates are strictly increasing; built only by `series::aggregate_daily`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub sku: String,
    points: Vec<DailySales>,
}

impl DailySeries {
    pub(crate) fn from_sorted(sku: impl Into<String>, points: Vec<DailySales>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            sku: sku.into(),
            points,
        }
    }

    pub fn points(&self) -> &[DailySales] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Calendar days between the first and last observation.
    pub fn span_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Critical,
    Warning,
    Good,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRecommendation {
    pub sku: String,
    pub current_stock: f64,
    pub horizon_days: u32,
    pub forecasted_demand: f64,
    pub recommended_order: f64,
    #[serde(serialize_with = "serialize_days")]
    pub days_of_stock: f64,
    pub status: StockStatus,
}

/// One calendar day of history as shown next to a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyHistoryPoint {
    pub date: NaiveDate,
    pub units_sold: f64,
    pub on_hand_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuAnalysis {
    pub recommendation: InventoryRecommendation,
    pub avg_daily_sales: f64,
    pub weekly_velocity: f64,
    pub oracle_config: OracleConfig,
    pub forecast: Vec<ForecastPoint>,
    pub history: Vec<DailyHistoryPoint>,
}

/// Forecast-free portfolio row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioEntry {
    pub sku: String,
    pub history_days: usize,
    pub current_stock: f64,
    pub avg_daily_sales: f64,
    #[serde(serialize_with = "serialize_days")]
    pub days_of_stock: f64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSku {
    pub sku: String,
    pub reason: ErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PortfolioSummary {
    pub entries: Vec<PortfolioEntry>,
    pub skipped: Vec<SkippedSku>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub total_rows: usize,
    pub unique_skus: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_units_sold: f64,
}

// JSON has no infinity; keep the sentinel distinguishable from null.
fn serialize_days<S: Serializer>(days: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if days.is_infinite() && days.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_f64(*days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn span_counts_calendar_days() {
        let series = DailySeries::from_sorted(
            "FARINA-GRILLO",
            vec![
                DailySales {
                    date: day(1),
                    units_sold: 3.0,
                },
                DailySales {
                    date: day(11),
                    units_sold: 4.0,
                },
            ],
        );
        assert_eq!(series.span_days(), 10);
        assert_eq!(series.last_date(), Some(day(11)));
        assert_eq!(DailySeries::from_sorted("EMPTY", Vec::new()).span_days(), 0);
    }

    #[test]
    fn infinite_days_of_stock_serializes_as_string() {
        let entry = PortfolioEntry {
            sku: "BARRETTE-CIOCCOLATO".to_string(),
            history_days: 6,
            current_stock: 100.0,
            avg_daily_sales: 0.0,
            days_of_stock: f64::INFINITY,
            status: StockStatus::Good,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["days_of_stock"], "inf");
        assert_eq!(json["status"], "GOOD");
    }
}
