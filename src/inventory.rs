use crate::config::PlanningConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{DailySeries, ForecastPoint, InventoryRecommendation};
use crate::series::avg_daily_sales;
use crate::status::classify;

/// Units to order so that stock covers `demand`; never negative.
pub fn recommended_order(demand: f64, current_stock: f64) -> f64 {
    (demand - current_stock).max(0.0)
}

/// Stock runway in days; +inf when there are no recent sales.
pub fn days_of_stock(current_stock: f64, avg_daily_sales: f64) -> f64 {
    if avg_daily_sales > 0.0 {
        current_stock / avg_daily_sales
    } else {
        f64::INFINITY
    }
}

/// Turn a forecast and the current stock gauge into an order recommendation.
///
/// `forecast` must be date-ordered and hold at least `config.horizon_days()`
/// points; a shorter forecast is a caller bug and is reported, not summed.
pub fn recommend(
    series: &DailySeries,
    forecast: &[ForecastPoint],
    current_stock: f64,
    config: &PlanningConfig,
) -> EngineResult<InventoryRecommendation> {
    let horizon_days = config.horizon_days();
    let required = horizon_days as usize;

    if forecast.len() < required {
        return Err(EngineError::ForecastTooShort {
            sku: series.sku.clone(),
            required,
            available: forecast.len(),
        });
    }

    let avg = avg_daily_sales(series)
        .ok_or_else(|| EngineError::insufficient(&series.sku, 1, 0))?;

    let forecasted_demand: f64 = forecast
        .iter()
        .take(required)
        .map(|p| p.point_estimate)
        .sum();
    let days = days_of_stock(current_stock, avg);

    Ok(InventoryRecommendation {
        sku: series.sku.clone(),
        current_stock,
        horizon_days,
        forecasted_demand,
        recommended_order: recommended_order(forecasted_demand, current_stock),
        days_of_stock: days,
        status: classify(days, config.safety_stock_days),
    })
}
