use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as Days, NaiveDate};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{DailySeries, ForecastPoint};
use crate::oracle::{ForecastOracle, OracleConfig, OracleError, OracleRequest};

/// Minimum daily points before the oracle is invoked at all.
pub const MIN_FORECAST_POINTS: usize = 10;
pub const INTERVAL_WIDTH: f64 = 0.95;
/// Yearly seasonality needs more than a full year of history.
pub const YEARLY_SEASONALITY_MIN_SPAN_DAYS: i64 = 365;

/// Model configuration for a series; fixed policy, not negotiated with the oracle.
pub fn model_config(series: &DailySeries, horizon_days: u32) -> OracleConfig {
    OracleConfig {
        weekly_seasonality: true,
        yearly_seasonality: series.span_days() > YEARLY_SEASONALITY_MIN_SPAN_DAYS,
        daily_seasonality: false,
        interval_width: INTERVAL_WIDTH,
        horizon_days,
    }
}

#[derive(Clone)]
pub struct ForecastOrchestrator {
    oracle: Arc<dyn ForecastOracle>,
    timeout: Duration,
}

impl ForecastOrchestrator {
    pub fn new(oracle: Arc<dyn ForecastOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Forecast exactly `horizon_days` points starting the day after the series ends.
    ///
    /// Oracle faults are reported as `ForecastFailed`; there is no retry and no
    /// fallback forecast.
    pub async fn forecast(
        &self,
        series: &DailySeries,
        horizon_days: u32,
    ) -> EngineResult<Vec<ForecastPoint>> {
        let available = series.len();
        let last_date = match series.last_date() {
            Some(date) if available >= MIN_FORECAST_POINTS => date,
            _ => {
                return Err(EngineError::insufficient(
                    &series.sku,
                    MIN_FORECAST_POINTS,
                    available,
                ))
            }
        };

        let config = model_config(series, horizon_days);
        let request = OracleRequest {
            series: series.points().iter().map(|p| (p.date, p.units_sold)).collect(),
            config,
        };
        debug!(
            sku = %series.sku,
            points = available,
            horizon_days,
            yearly = config.yearly_seasonality,
            "invoking forecasting oracle"
        );

        let outcome = match tokio::time::timeout(self.timeout, self.oracle.forecast(&request)).await
        {
            Ok(result) => result.and_then(|points| normalize(points, last_date, horizon_days)),
            Err(_) => Err(OracleError::Timeout(self.timeout)),
        };

        outcome.map_err(|cause| {
            warn!(sku = %series.sku, error = %cause, "forecast failed");
            EngineError::ForecastFailed {
                sku: series.sku.clone(),
                cause,
            }
        })
    }
}

/// Drop fitted history, then check the remaining points form the requested horizon.
fn normalize(
    points: Vec<ForecastPoint>,
    last_date: NaiveDate,
    horizon_days: u32,
) -> Result<Vec<ForecastPoint>, OracleError> {
    let mut future: Vec<ForecastPoint> = points.into_iter().filter(|p| p.date > last_date).collect();
    future.sort_by_key(|p| p.date);

    if future.len() != horizon_days as usize {
        return Err(OracleError::InvalidOutput(format!(
            "expected {horizon_days} future points, got {}",
            future.len()
        )));
    }

    for (offset, point) in (1i64..).zip(&future) {
        let expected = last_date + Days::days(offset);
        if point.date != expected {
            return Err(OracleError::InvalidOutput(format!(
                "expected a point for {expected}, got {}",
                point.date
            )));
        }
        let finite = point.lower_bound.is_finite()
            && point.point_estimate.is_finite()
            && point.upper_bound.is_finite();
        if !finite
            || point.lower_bound > point.point_estimate
            || point.point_estimate > point.upper_bound
        {
            return Err(OracleError::InvalidOutput(format!(
                "interval out of order on {}",
                point.date
            )));
        }
    }

    Ok(future)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::SalesRecord;
    use crate::series::aggregate_daily;
    use async_trait::async_trait;

    /// Flat forecast, optionally preceded by fitted history and with a configurable shortfall.
    pub(crate) struct FlatOracle {
        pub level: f64,
        pub include_fitted: bool,
        pub shortfall: u32,
    }

    #[async_trait]
    impl ForecastOracle for FlatOracle {
        async fn forecast(&self, request: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError> {
            let mut points = Vec::new();
            if self.include_fitted {
                for (date, value) in &request.series {
                    points.push(ForecastPoint {
                        date: *date,
                        point_estimate: *value,
                        lower_bound: *value,
                        upper_bound: *value,
                    });
                }
            }
            let last = request.series.last().map(|(d, _)| *d).unwrap();
            // Reverse order on purpose; the orchestrator sorts.
            for step in (1..=request.config.horizon_days.saturating_sub(self.shortfall)).rev() {
                points.push(ForecastPoint {
                    date: last + Days::days(i64::from(step)),
                    point_estimate: self.level,
                    lower_bound: self.level - 1.0,
                    upper_bound: self.level + 1.0,
                });
            }
            Ok(points)
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl ForecastOracle for FailingOracle {
        async fn forecast(&self, _: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError> {
            Err(OracleError::NonConvergence("optimizer stalled".to_string()))
        }
    }

    struct SlowOracle;

    #[async_trait]
    impl ForecastOracle for SlowOracle {
        async fn forecast(&self, _: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    struct InvertedOracle;

    #[async_trait]
    impl ForecastOracle for InvertedOracle {
        async fn forecast(&self, request: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError> {
            let last = request.series.last().map(|(d, _)| *d).unwrap();
            Ok((1..=i64::from(request.config.horizon_days))
                .map(|step| ForecastPoint {
                    date: last + Days::days(step),
                    point_estimate: 5.0,
                    lower_bound: 6.0,
                    upper_bound: 7.0,
                })
                .collect())
        }
    }

    /// Emits one point per listed day offset after the last observation.
    struct ScriptedOracle {
        offsets: Vec<i64>,
        unbounded_at: Option<i64>,
    }

    #[async_trait]
    impl ForecastOracle for ScriptedOracle {
        async fn forecast(&self, request: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError> {
            let last = request.series.last().map(|(d, _)| *d).unwrap();
            Ok(self
                .offsets
                .iter()
                .map(|&step| ForecastPoint {
                    date: last + Days::days(step),
                    point_estimate: 5.0,
                    lower_bound: 4.0,
                    upper_bound: if self.unbounded_at == Some(step) {
                        f64::INFINITY
                    } else {
                        6.0
                    },
                })
                .collect())
        }
    }

    async fn invalid_output(oracle: ScriptedOracle, horizon_days: u32) -> String {
        match orchestrator(oracle).forecast(&series_of(12), horizon_days).await {
            Err(EngineError::ForecastFailed {
                cause: OracleError::InvalidOutput(message),
                ..
            }) => message,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn series_of(days: usize) -> DailySeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records: Vec<SalesRecord> = (0..days)
            .map(|i| SalesRecord {
                date: start + Days::days(i as i64),
                sku: "X".to_string(),
                units_sold: 10.0,
                on_hand_end: 50.0,
            })
            .collect();
        aggregate_daily(&records, "X")
    }

    fn orchestrator(oracle: impl ForecastOracle + 'static) -> ForecastOrchestrator {
        ForecastOrchestrator::new(Arc::new(oracle), Duration::from_secs(1))
    }

    fn flat() -> FlatOracle {
        FlatOracle {
            level: 13.0,
            include_fitted: true,
            shortfall: 0,
        }
    }

    #[test]
    fn yearly_seasonality_requires_more_than_a_year() {
        assert!(!model_config(&series_of(366), 30).yearly_seasonality);
        assert!(model_config(&series_of(367), 30).yearly_seasonality);

        let config = model_config(&series_of(20), 30);
        assert!(config.weekly_seasonality);
        assert!(!config.daily_seasonality);
        assert_eq!(config.interval_width, 0.95);
    }

    #[tokio::test]
    async fn returns_exactly_horizon_points_after_last_date() {
        let series = series_of(10);
        let points = orchestrator(flat()).forecast(&series, 21).await.unwrap();

        assert_eq!(points.len(), 21);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn refuses_short_series_before_calling_oracle() {
        let err = orchestrator(FailingOracle)
            .forecast(&series_of(9), 30)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientData {
                sku: "X".to_string(),
                required: 10,
                available: 9
            }
        );
    }

    #[tokio::test]
    async fn oracle_fault_surfaces_with_cause() {
        let err = orchestrator(FailingOracle)
            .forecast(&series_of(12), 30)
            .await
            .unwrap_err();
        match err {
            EngineError::ForecastFailed { sku, cause } => {
                assert_eq!(sku, "X");
                assert!(matches!(cause, OracleError::NonConvergence(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_oracle_times_out() {
        let err = orchestrator(SlowOracle)
            .forecast(&series_of(12), 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ForecastFailed {
                cause: OracleError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn short_oracle_answer_is_a_fault() {
        let oracle = FlatOracle {
            shortfall: 3,
            ..flat()
        };
        let err = orchestrator(oracle).forecast(&series_of(12), 30).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::ForecastFailed {
                cause: OracleError::InvalidOutput(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn inverted_interval_is_a_fault() {
        let err = orchestrator(InvertedOracle)
            .forecast(&series_of(12), 14)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ForecastFailed {
                cause: OracleError::InvalidOutput(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_day_with_full_count_is_a_fault() {
        let offsets = [1, 2].into_iter().chain(4..=15).collect();
        let oracle = ScriptedOracle {
            offsets,
            unbounded_at: None,
        };
        assert_eq!(
            invalid_output(oracle, 14).await,
            "expected a point for 2024-01-15, got 2024-01-16"
        );
    }

    #[tokio::test]
    async fn repeated_day_is_a_fault() {
        let offsets = [1, 2, 2].into_iter().chain(4..=14).collect();
        let oracle = ScriptedOracle {
            offsets,
            unbounded_at: None,
        };
        assert_eq!(
            invalid_output(oracle, 14).await,
            "expected a point for 2024-01-15, got 2024-01-14"
        );
    }

    #[tokio::test]
    async fn non_finite_bound_is_a_fault() {
        let oracle = ScriptedOracle {
            offsets: (1..=14).collect(),
            unbounded_at: Some(5),
        };
        assert_eq!(
            invalid_output(oracle, 14).await,
            "interval out of order on 2024-01-17"
        );
    }

    #[tokio::test]
    async fn well_formed_scripted_answer_passes() {
        let oracle = ScriptedOracle {
            offsets: (1..=14).rev().collect(),
            unbounded_at: None,
        };
        let points = orchestrator(oracle).forecast(&series_of(12), 14).await.unwrap();
        assert_eq!(points.len(), 14);
        assert_eq!(points[13].date, NaiveDate::from_ymd_opt(2024, 1, 26).unwrap());
    }
}
