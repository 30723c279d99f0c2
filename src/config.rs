use std::ops::RangeInclusive;
use std::time::Duration;

use clap::Args;

use crate::error::{EngineError, EngineResult};

pub const FORECAST_DAYS_RANGE: RangeInclusive<u32> = 30..=365;
pub const SAFETY_STOCK_DAYS_RANGE: RangeInclusive<u32> = 7..=30;
pub const LEAD_TIME_DAYS_RANGE: RangeInclusive<u32> = 1..=30;
pub const ORACLE_TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=600;

/// Operator-tunable planning parameters, as passed on the command line.
#[derive(Debug, Clone, Args)]
pub struct PlanningArgs {
    /// Days of demand to forecast
    #[arg(long, default_value_t = 90)]
    pub forecast_days: u32,
    /// Buffer inventory, in days of demand
    #[arg(long, default_value_t = 14)]
    pub safety_stock_days: u32,
    /// Days between placing and receiving an order
    #[arg(long, default_value_t = 7)]
    pub lead_time_days: u32,
    /// Upper bound on a single forecasting call
    #[arg(long, default_value_t = 30)]
    pub oracle_timeout_secs: u64,
}

impl From<PlanningArgs> for PlanningConfig {
    fn from(args: PlanningArgs) -> Self {
        Self {
            forecast_days: args.forecast_days,
            safety_stock_days: args.safety_stock_days,
            lead_time_days: args.lead_time_days,
            oracle_timeout_secs: args.oracle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningConfig {
    pub forecast_days: u32,
    pub safety_stock_days: u32,
    pub lead_time_days: u32,
    pub oracle_timeout_secs: u64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            forecast_days: 90,
            safety_stock_days: 14,
            lead_time_days: 7,
            oracle_timeout_secs: 30,
        }
    }
}

impl PlanningConfig {
    pub fn validate(self) -> EngineResult<Self> {
        check("forecast_days", self.forecast_days.into(), widen(&FORECAST_DAYS_RANGE))?;
        check(
            "safety_stock_days",
            self.safety_stock_days.into(),
            widen(&SAFETY_STOCK_DAYS_RANGE),
        )?;
        check(
            "lead_time_days",
            self.lead_time_days.into(),
            widen(&LEAD_TIME_DAYS_RANGE),
        )?;
        check(
            "oracle_timeout_secs",
            self.oracle_timeout_secs,
            ORACLE_TIMEOUT_SECS_RANGE,
        )?;
        Ok(self)
    }

    /// Lead time plus safety stock: the window the reorder quantity must cover.
    pub fn horizon_days(&self) -> u32 {
        self.lead_time_days + self.safety_stock_days
    }

    /// Days requested from the oracle; never shorter than `horizon_days`.
    pub fn oracle_horizon_days(&self) -> u32 {
        self.forecast_days.max(self.horizon_days())
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

fn widen(range: &RangeInclusive<u32>) -> RangeInclusive<u64> {
    u64::from(*range.start())..=u64::from(*range.end())
}

fn check(parameter: &'static str, value: u64, range: RangeInclusive<u64>) -> EngineResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidConfiguration {
            parameter,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PlanningConfig::default().validate().unwrap();
        assert_eq!(config.horizon_days(), 21);
        assert_eq!(config.oracle_horizon_days(), 90);
        assert_eq!(config.oracle_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_each_parameter_out_of_range() {
        let cases = [
            PlanningConfig {
                forecast_days: 29,
                ..PlanningConfig::default()
            },
            PlanningConfig {
                safety_stock_days: 31,
                ..PlanningConfig::default()
            },
            PlanningConfig {
                lead_time_days: 0,
                ..PlanningConfig::default()
            },
            PlanningConfig {
                oracle_timeout_secs: 0,
                ..PlanningConfig::default()
            },
        ];
        let expected = [
            "forecast_days",
            "safety_stock_days",
            "lead_time_days",
            "oracle_timeout_secs",
        ];

        for (config, name) in cases.into_iter().zip(expected) {
            match config.validate() {
                Err(EngineError::InvalidConfiguration { parameter, .. }) => {
                    assert_eq!(parameter, name)
                }
                other => panic!("expected InvalidConfiguration for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn oracle_horizon_covers_long_reorder_window() {
        let config = PlanningConfig {
            forecast_days: 30,
            safety_stock_days: 30,
            lead_time_days: 30,
            oracle_timeout_secs: 30,
        };
        assert_eq!(config.validate().unwrap().oracle_horizon_days(), 60);
    }
}
