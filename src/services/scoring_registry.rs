use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;
use crate::models::{HealthWeights, RatioMetric, ScoringConfig, ThresholdRule};
use crate::observability::get_metrics;

/// Live thresholds and weights, shared by every request.
///
/// Reports take a snapshot up front, so an edit made mid-report never
/// mixes two tables in one response.
#[derive(Debug, Clone)]
pub struct ScoringRegistry {
    inner: Arc<RwLock<ScoringConfig>>,
}

impl ScoringRegistry {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn snapshot(&self) -> ScoringConfig {
        self.inner.read().await.clone()
    }

    /// Validates and installs a threshold rule, returning the previous one.
    pub async fn update_threshold(
        &self,
        metric: RatioMetric,
        rule: ThresholdRule,
    ) -> Result<Option<ThresholdRule>> {
        let mut config = self.inner.write().await;
        let previous = config.thresholds.get(metric).copied();
        config.thresholds.set(metric, rule)?;
        drop(config);

        info!(
            metric = %metric,
            direction = ?rule.direction,
            green = %rule.green,
            yellow = %rule.yellow,
            "Threshold updated"
        );
        get_metrics().record_scoring_update("threshold");
        Ok(previous)
    }

    pub async fn replace_weights(&self, weights: HealthWeights) {
        let weighted = weights.iter().filter(|(_, w)| !w.is_zero()).count();
        self.inner.write().await.weights = weights;

        info!(weighted_metrics = weighted, "Health score weights replaced");
        get_metrics().record_scoring_update("weights");
    }
}
