use crate::models::StockStatus;

/// Classify stock runway against the safety stock policy.
///
/// - `Critical`: below `safety_stock_days`
/// - `Warning`: at or above `safety_stock_days`, below twice that
/// - `Good`: at or above twice `safety_stock_days` (including +inf)
///
/// NaN compares false against every threshold and lands in `Critical`.
pub fn classify(days_of_stock: f64, safety_stock_days: u32) -> StockStatus {
    let safety = f64::from(safety_stock_days);

    if days_of_stock >= 2.0 * safety {
        StockStatus::Good
    } else if days_of_stock >= safety {
        StockStatus::Warning
    } else {
        StockStatus::Critical
    }
}
