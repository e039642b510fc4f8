use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{Direction, HealthWeights, RatioMetric, ReportPeriod, ThresholdRule};

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::InvalidPeriod(format!(
            "{} must be a YYYY-MM-DD date (got '{}')",
            field, value
        ))
    })
}

fn parse_pair(
    start_field: &str,
    start: Option<&str>,
    end_field: &str,
    end: Option<&str>,
) -> Result<Option<(NaiveDate, NaiveDate)>> {
    match (start, end) {
        (Some(s), Some(e)) => Ok(Some((parse_date(start_field, s)?, parse_date(end_field, e)?))),
        (None, None) => Ok(None),
        _ => Err(AppError::InvalidPeriod(format!(
            "{} and {} must be given together",
            start_field, end_field
        ))),
    }
}

fn parse_month(value: &str) -> Result<ReportPeriod> {
    let invalid = || AppError::InvalidPeriod(format!("month must be YYYY-MM (got '{}')", value));
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    ReportPeriod::for_month(year, month)
}

/// Query string of the business health endpoint.
///
/// Dates arrive as strings so that a malformed value becomes an
/// `INVALID_PERIOD` error instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportPeriodQuery {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub previous_period_start: Option<String>,
    pub previous_period_end: Option<String>,
    pub month: Option<String>,
}

impl ReportPeriodQuery {
    /// Resolves the requested window. With no parameters this is the last
    /// complete calendar month before `today`.
    pub fn resolve(&self, today: NaiveDate, max_period_days: i64) -> Result<ReportPeriod> {
        let current = parse_pair(
            "period_start",
            self.period_start.as_deref(),
            "period_end",
            self.period_end.as_deref(),
        )?;
        let previous = parse_pair(
            "previous_period_start",
            self.previous_period_start.as_deref(),
            "previous_period_end",
            self.previous_period_end.as_deref(),
        )?;

        if let Some(month) = &self.month {
            if current.is_some() || previous.is_some() {
                return Err(AppError::InvalidPeriod(
                    "month cannot be combined with explicit period bounds".to_string(),
                ));
            }
            return parse_month(month);
        }

        match (current, previous) {
            (Some((start, end)), Some((prev_start, prev_end))) => {
                ReportPeriod::new(start, end, prev_start, prev_end, max_period_days)
            }
            (Some((start, end)), None) => {
                ReportPeriod::with_preceding_window(start, end, max_period_days)
            }
            (None, Some(_)) => Err(AppError::InvalidPeriod(
                "previous period bounds require period_start and period_end".to_string(),
            )),
            (None, None) => ReportPeriod::last_complete_month(today),
        }
    }
}

/// Query string of the aging endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgingQuery {
    pub as_of: Option<String>,
}

impl AgingQuery {
    pub fn resolve(&self, today: NaiveDate) -> Result<NaiveDate> {
        match &self.as_of {
            Some(value) => parse_date("as_of", value),
            None => Ok(today),
        }
    }
}

/// Query string of the loyalty tier endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoyaltyQuery {
    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: Option<u32>,
}

impl LoyaltyQuery {
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT) as usize
    }
}

/// Body of `PUT /settings/thresholds/:metric`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateThresholdRequest {
    pub direction: Direction,
    pub green: Decimal,
    pub yellow: Decimal,
}

impl From<UpdateThresholdRequest> for ThresholdRule {
    fn from(request: UpdateThresholdRequest) -> Self {
        ThresholdRule {
            direction: request.direction,
            green: request.green,
            yellow: request.yellow,
        }
    }
}

/// Body of `PUT /settings/weights`. Replaces the whole weight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWeightsRequest {
    pub weights: BTreeMap<String, Decimal>,
}

impl UpdateWeightsRequest {
    pub fn into_weights(self) -> Result<HealthWeights> {
        let mut weights = BTreeMap::new();
        for (name, weight) in self.weights {
            let metric: RatioMetric = name
                .parse()
                .map_err(|_| AppError::Validation(format!("unknown metric '{}'", name)))?;
            weights.insert(metric, weight);
        }
        HealthWeights::new(weights)
    }
}
