use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::models::{HealthScoreBands, RatioMetric, ThresholdTable};

/// Relative weight of each criterion in the composite health score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    weights: BTreeMap<RatioMetric, Decimal>,
}

impl HealthWeights {
    pub fn from_entries(entries: &BTreeMap<String, Decimal>) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for (name, weight) in entries {
            let metric: RatioMetric = name
                .parse()
                .map_err(|_| AppError::Config(format!("unknown weight metric '{}'", name)))?;
            weights.insert(metric, *weight);
        }
        Self::new(weights).map_err(|e| match e {
            AppError::Validation(msg) => AppError::Config(msg),
            other => other,
        })
    }

    pub fn new(weights: BTreeMap<RatioMetric, Decimal>) -> Result<Self> {
        if let Some((metric, weight)) = weights.iter().find(|(_, w)| **w < Decimal::ZERO) {
            return Err(AppError::Validation(format!(
                "weight for {} must not be negative (got {})",
                metric, weight
            )));
        }
        Ok(Self { weights })
    }

    pub fn get(&self, metric: RatioMetric) -> Decimal {
        self.weights.get(&metric).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RatioMetric, &Decimal)> {
        self.weights.iter()
    }
}

/// Everything the classifier and scorer read, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub thresholds: ThresholdTable,
    pub weights: HealthWeights,
    pub health_score: HealthScoreBands,
}
