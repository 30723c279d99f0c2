use serde::Serialize;
use thiserror::Error;

use crate::oracle::OracleError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failure of a single analysis request or of one SKU inside a portfolio scan.
///
/// Every variant carries enough context (SKU, thresholds, cause) for a
/// presentation layer to pick a specific remediation hint via [`EngineError::kind`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("sku {sku}: {available} days of history, at least {required} required")]
    InsufficientData {
        sku: String,
        required: usize,
        available: usize,
    },

    #[error("sku {sku}: forecast failed: {cause}")]
    ForecastFailed {
        sku: String,
        #[source]
        cause: OracleError,
    },

    #[error("invalid configuration: {parameter} = {value} (allowed {min}..={max})")]
    InvalidConfiguration {
        parameter: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("sku {sku} not present in dataset")]
    MissingEntity { sku: String },

    /// The recommender was handed fewer forecast points than its horizon.
    #[error("sku {sku}: forecast covers {available} days, recommendation needs {required}")]
    ForecastTooShort {
        sku: String,
        required: usize,
        available: usize,
    },
}

/// Language-neutral failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    ForecastFailed,
    InvalidConfiguration,
    MissingEntity,
    ForecastTooShort,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InsufficientData { .. } => ErrorKind::InsufficientData,
            EngineError::ForecastFailed { .. } => ErrorKind::ForecastFailed,
            EngineError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            EngineError::MissingEntity { .. } => ErrorKind::MissingEntity,
            EngineError::ForecastTooShort { .. } => ErrorKind::ForecastTooShort,
        }
    }

    pub fn sku(&self) -> Option<&str> {
        match self {
            EngineError::InsufficientData { sku, .. }
            | EngineError::ForecastFailed { sku, .. }
            | EngineError::MissingEntity { sku }
            | EngineError::ForecastTooShort { sku, .. } => Some(sku),
            EngineError::InvalidConfiguration { .. } => None,
        }
    }

    pub fn insufficient(sku: impl Into<String>, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            sku: sku.into(),
            required,
            available,
        }
    }

    pub fn missing(sku: impl Into<String>) -> Self {
        Self::MissingEntity { sku: sku.into() }
    }
}
