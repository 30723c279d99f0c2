use tracing::info;

use crate::config::PlanningConfig;
use crate::error::{EngineError, EngineResult};
use crate::forecast::{model_config, ForecastOrchestrator};
use crate::ingest::Dataset;
use crate::inventory;
use crate::models::SkuAnalysis;
use crate::series::{aggregate_daily, avg_daily_sales, current_stock, daily_history};

/// Full forecast-backed analysis of a single SKU.
pub async fn analyze_sku(
    dataset: &Dataset,
    sku: &str,
    config: &PlanningConfig,
    orchestrator: &ForecastOrchestrator,
) -> EngineResult<SkuAnalysis> {
    let config = config.validate()?;
    if !dataset.contains(sku) {
        return Err(EngineError::missing(sku));
    }
    let records = dataset.records();
    let stock = current_stock(records, sku).ok_or_else(|| EngineError::missing(sku))?;

    let series = aggregate_daily(records, sku);
    let horizon = config.oracle_horizon_days();
    let forecast = orchestrator.forecast(&series, horizon).await?;
    let recommendation = inventory::recommend(&series, &forecast, stock, &config)?;

    let avg = avg_daily_sales(&series).unwrap_or_default();
    info!(
        sku,
        status = ?recommendation.status,
        recommended_order = recommendation.recommended_order,
        "sku analyzed"
    );

    Ok(SkuAnalysis {
        avg_daily_sales: avg,
        weekly_velocity: avg * 7.0,
        oracle_config: model_config(&series, horizon),
        forecast,
        history: daily_history(records, sku),
        recommendation,
    })
}
