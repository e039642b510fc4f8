use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::PartialFailure;
use crate::models::{MetricKey, MetricOutcome, RawAggregates, ReportPeriod};
use crate::observability::{get_metrics, LatencyTimer};
use crate::repositories::MetricSource;

/// Fans the named aggregate queries out concurrently and collects them into
/// a complete [`RawAggregates`] set.
///
/// Queries are independent reads; a failure, timeout or panic in one never
/// affects the others.
pub struct MetricAggregator {
    source: Arc<dyn MetricSource>,
    query_timeout: Duration,
}

impl MetricAggregator {
    pub fn new(source: Arc<dyn MetricSource>, query_timeout: Duration) -> Self {
        Self {
            source,
            query_timeout,
        }
    }

    pub async fn aggregate(&self, period: &ReportPeriod) -> RawAggregates {
        let mut tasks = JoinSet::new();

        for metric in MetricKey::ALL {
            let source = Arc::clone(&self.source);
            let period = *period;
            let timeout = self.query_timeout;

            tasks.spawn(async move {
                let timer = LatencyTimer::new();
                let outcome = fetch_with_timeout(source.as_ref(), metric, &period, timeout).await;
                get_metrics().record_query(metric.as_str(), timer.elapsed_ms());
                (metric, outcome)
            });
        }

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((metric, outcome)) => {
                    outcomes.insert(metric, outcome);
                }
                // The key is filled in as Missing below.
                Err(e) => error!("Aggregate query task did not complete: {}", e),
            }
        }

        let aggregates = RawAggregates::from_outcomes(outcomes);
        for failure in aggregates.failures() {
            warn!(
                metric = %failure.metric(),
                reason = failure.reason(),
                "Aggregate unavailable: {}",
                failure
            );
            get_metrics().record_query_failure(failure.metric().as_str(), failure.reason());
        }
        debug!(
            period_start = %period.period_start,
            period_end = %period.period_end,
            complete = aggregates.is_complete(),
            "Aggregation finished"
        );

        aggregates
    }
}

async fn fetch_with_timeout(
    source: &dyn MetricSource,
    metric: MetricKey,
    period: &ReportPeriod,
    timeout: Duration,
) -> MetricOutcome {
    match tokio::time::timeout(timeout, source.fetch(metric, period)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(PartialFailure::QueryFailed {
            metric,
            message: e.to_string(),
        }),
        Err(_) => Err(PartialFailure::TimedOut {
            metric,
            after_ms: timeout.as_millis() as u64,
        }),
    }
}
