use serde::Serialize;
use thiserror::Error;

use crate::models::MetricKey;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Why a single aggregate is absent from a report.
///
/// Kept separate from [`AppError`] so a report can carry the gap as data
/// instead of failing as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartialFailure {
    #[error("query for {metric} failed: {message}")]
    QueryFailed {
        metric: MetricKey,
        #[serde(skip)]
        message: String,
    },

    #[error("query for {metric} timed out after {after_ms}ms")]
    TimedOut { metric: MetricKey, after_ms: u64 },

    #[error("no result was produced for {metric}")]
    Missing { metric: MetricKey },
}

impl PartialFailure {
    pub fn metric(&self) -> MetricKey {
        match self {
            PartialFailure::QueryFailed { metric, .. }
            | PartialFailure::TimedOut { metric, .. }
            | PartialFailure::Missing { metric } => *metric,
        }
    }

    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            PartialFailure::QueryFailed { .. } => "query_failed",
            PartialFailure::TimedOut { .. } => "timed_out",
            PartialFailure::Missing { .. } => "missing",
        }
    }
}
