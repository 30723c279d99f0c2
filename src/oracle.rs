use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::{Data, Distribution};
use thiserror::Error;

use crate::models::ForecastPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OracleConfig {
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
    pub daily_seasonality: bool,
    pub interval_width: f64,
    pub horizon_days: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    /// Ascending by date, one value per day.
    pub series: Vec<(NaiveDate, f64)>,
    pub config: OracleConfig,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("model did not converge: {0}")]
    NonConvergence(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("no answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid output: {0}")]
    InvalidOutput(String),
}

#[async_trait]
pub trait ForecastOracle: Send + Sync {
    async fn forecast(&self, request: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError>;
}

/// Deterministic level + damped trend + calendar-profile model.
///
/// - level: mean of the trailing `window` observations
/// - trend: least-squares slope over the same window, damped by `damping` per step
/// - weekly / yearly: mean deviation by weekday / month over the full history
/// - interval: normal quantile for `interval_width` times the in-sample residual std dev
#[derive(Debug, Clone)]
pub struct SeasonalProfileOracle {
    window: usize,
    damping: f64,
}

impl Default for SeasonalProfileOracle {
    fn default() -> Self {
        Self {
            window: 28,
            damping: 0.8,
        }
    }
}

impl SeasonalProfileOracle {
    fn fit(&self, request: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError> {
        let series = &request.series;
        let config = &request.config;
        validate_request(series, config)?;

        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let overall_mean = mean(&values);

        let weekday_profile = if config.weekly_seasonality {
            profile(series, overall_mean, 7, |d| d.weekday().num_days_from_monday() as usize)
        } else {
            vec![0.0; 7]
        };
        let month_profile = if config.yearly_seasonality {
            profile(series, overall_mean, 12, |d| d.month0() as usize)
        } else {
            vec![0.0; 12]
        };
        let seasonal = |date: NaiveDate| {
            weekday_profile[date.weekday().num_days_from_monday() as usize]
                + month_profile[date.month0() as usize]
        };

        let recent = &values[values.len().saturating_sub(self.window)..];
        let level = mean(recent);
        let slope = slope(recent);
        // The window mean sits at the window's centre; carry it forward to the last observation.
        let anchor = level + slope * (recent.len() as f64 - 1.0) / 2.0;

        let residuals: Vec<f64> = series
            .iter()
            .map(|(date, value)| value - (overall_mean + seasonal(*date)))
            .collect();
        let sigma = if residuals.len() < 2 {
            0.0
        } else {
            Data::new(residuals).std_dev().unwrap_or(0.0)
        };

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| OracleError::NonConvergence(format!("normal distribution: {e}")))?;
        let z = normal.inverse_cdf(0.5 + config.interval_width / 2.0);
        let spread = z * sigma;

        let mut points = Vec::with_capacity(series.len() + config.horizon_days as usize);

        for (date, _) in series {
            points.push(band(*date, overall_mean + seasonal(*date), spread));
        }

        let Some((last_date, _)) = series.last() else {
            return Err(OracleError::MalformedInput("empty series".to_string()));
        };
        let mut damped_steps = 0.0;
        let mut weight = 1.0;
        for step in 1..=i64::from(config.horizon_days) {
            weight *= self.damping;
            damped_steps += weight;
            let date = *last_date + Duration::days(step);
            let estimate = anchor + slope * damped_steps + seasonal(date);
            points.push(band(date, estimate, spread));
        }

        if points
            .iter()
            .any(|p| !(p.point_estimate.is_finite() && p.upper_bound.is_finite()))
        {
            return Err(OracleError::NonConvergence(
                "non-finite estimate produced".to_string(),
            ));
        }

        Ok(points)
    }
}

#[async_trait]
impl ForecastOracle for SeasonalProfileOracle {
    async fn forecast(&self, request: &OracleRequest) -> Result<Vec<ForecastPoint>, OracleError> {
        // Fitting is CPU-bound; off the async workers it stays cancellable by the caller's timeout.
        let oracle = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || oracle.fit(&request))
            .await
            .map_err(|e| OracleError::NonConvergence(format!("fit task failed: {e}")))?
    }
}

fn validate_request(series: &[(NaiveDate, f64)], config: &OracleConfig) -> Result<(), OracleError> {
    if series.is_empty() {
        return Err(OracleError::MalformedInput("empty series".to_string()));
    }
    if series.windows(2).any(|w| w[0].0 >= w[1].0) {
        return Err(OracleError::MalformedInput(
            "dates must be strictly increasing".to_string(),
        ));
    }
    if series.iter().any(|(_, v)| !v.is_finite()) {
        return Err(OracleError::MalformedInput(
            "series contains non-finite values".to_string(),
        ));
    }
    if !(config.interval_width > 0.0 && config.interval_width < 1.0) {
        return Err(OracleError::MalformedInput(format!(
            "interval_width {} outside (0, 1)",
            config.interval_width
        )));
    }
    Ok(())
}

// Sales are non-negative; clamping keeps lower <= point <= upper.
fn band(date: NaiveDate, estimate: f64, spread: f64) -> ForecastPoint {
    let point_estimate = estimate.max(0.0);
    ForecastPoint {
        date,
        point_estimate,
        lower_bound: (point_estimate - spread).max(0.0),
        upper_bound: point_estimate + spread,
    }
}

fn profile(
    series: &[(NaiveDate, f64)],
    overall_mean: f64,
    buckets: usize,
    bucket_of: impl Fn(NaiveDate) -> usize,
) -> Vec<f64> {
    let mut sums = vec![0.0; buckets];
    let mut counts = vec![0usize; buckets];

    for (date, value) in series {
        let bucket = bucket_of(*date);
        sums[bucket] += value - overall_mean;
        counts[bucket] += 1;
    }

    sums.iter()
        .zip(&counts)
        .map(|(sum, count)| if *count == 0 { 0.0 } else { sum / *count as f64 })
        .collect()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Least-squares slope against the observation index.
fn slope(ys: &[f64]) -> f64 {
    if ys.len() < 2 {
        return 0.0;
    }
    let x_mean = (ys.len() as f64 - 1.0) / 2.0;
    let y_mean = mean(ys);
    let (mut cov, mut var) = (0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        cov += dx * (y - y_mean);
        var += dx * dx;
    }
    if var <= f64::EPSILON {
        0.0
    } else {
        cov / var
    }
}
