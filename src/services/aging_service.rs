use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{
    AgingBucket, AgingBuckets, AgingOutcome, AgingReport, AgingSide, AgingSummary,
    ClassifiedMetric, OpenItem, RatioMetric, ThresholdTable,
};
use crate::observability::{get_metrics, mask_amount, LatencyTimer};
use crate::repositories::OpenItemSource;
use crate::services::ratio_calculator::ratio_pct;
use crate::services::scoring_registry::ScoringRegistry;

fn over_due_metric(side: AgingSide) -> RatioMetric {
    match side {
        AgingSide::Receivables => RatioMetric::ArOver90Pct,
        AgingSide::Payables => RatioMetric::ApOver90Pct,
    }
}

/// Buckets open items by days past due on `as_of`.
///
/// Items with nothing left to pay are ignored.
pub fn summarize(
    side: AgingSide,
    items: &[OpenItem],
    as_of: NaiveDate,
    buckets: &AgingBuckets,
    thresholds: &ThresholdTable,
) -> AgingSummary {
    let mut totals = vec![Decimal::ZERO; buckets.bucket_count()];
    let mut counts = vec![0u64; buckets.bucket_count()];
    let mut total_outstanding = Decimal::ZERO;
    let mut item_count = 0u64;
    let mut oldest_days_past_due: Option<i64> = None;

    for item in items.iter().filter(|i| i.balance_due > Decimal::ZERO) {
        let days = item.days_past_due(as_of);
        let index = buckets.index_for(days);
        totals[index] = totals[index].saturating_add(item.balance_due);
        counts[index] += 1;
        total_outstanding = total_outstanding.saturating_add(item.balance_due);
        item_count += 1;
        if days > 0 {
            oldest_days_past_due = Some(oldest_days_past_due.map_or(days, |d| d.max(days)));
        }
    }

    let oldest_total = totals.last().copied().unwrap_or(Decimal::ZERO);
    let metric = over_due_metric(side);
    let over_90 = ratio_pct(oldest_total, total_outstanding);

    AgingSummary {
        side,
        buckets: buckets
            .labels()
            .into_iter()
            .zip(totals.into_iter().zip(counts))
            .map(|(label, (total, count))| AgingBucket {
                label,
                total,
                count,
            })
            .collect(),
        total_outstanding,
        item_count,
        oldest_days_past_due,
        over_90_pct: ClassifiedMetric::new(over_90, thresholds.classify(metric, over_90)),
    }
}

/// Service producing the receivables/payables aging report.
pub struct AgingService {
    source: Arc<dyn OpenItemSource>,
    buckets: AgingBuckets,
    scoring: ScoringRegistry,
}

impl AgingService {
    pub fn new(
        source: Arc<dyn OpenItemSource>,
        buckets: AgingBuckets,
        scoring: ScoringRegistry,
    ) -> Self {
        Self {
            source,
            buckets,
            scoring,
        }
    }

    /// Both sides are fetched concurrently; a failed side is reported as
    /// unavailable while the other still renders.
    pub async fn generate(&self, as_of: NaiveDate) -> AgingReport {
        let timer = LatencyTimer::new();
        let thresholds = self.scoring.snapshot().await.thresholds;

        let (receivables, payables) = tokio::join!(
            self.source.open_items(AgingSide::Receivables, as_of),
            self.source.open_items(AgingSide::Payables, as_of),
        );

        let receivables = self.outcome(AgingSide::Receivables, receivables, as_of, &thresholds);
        let payables = self.outcome(AgingSide::Payables, payables, as_of, &thresholds);

        let complete = matches!(
            (&receivables, &payables),
            (AgingOutcome::Available { .. }, AgingOutcome::Available { .. })
        );
        get_metrics().record_report_generated("aging", timer.elapsed_ms(), complete);

        AgingReport {
            as_of,
            generated_at: Utc::now(),
            receivables,
            payables,
        }
    }

    fn outcome(
        &self,
        side: AgingSide,
        fetched: Result<Vec<OpenItem>>,
        as_of: NaiveDate,
        thresholds: &ThresholdTable,
    ) -> AgingOutcome {
        match fetched {
            Ok(items) => {
                let data = summarize(side, &items, as_of, &self.buckets, thresholds);
                info!(
                    side = side.as_str(),
                    items = data.item_count,
                    outstanding = %mask_amount(&data.total_outstanding),
                    "Aging summary built"
                );
                AgingOutcome::Available { data }
            }
            Err(e) => {
                warn!(side = side.as_str(), error = %e, "Open items unavailable");
                get_metrics().record_query_failure(side.as_str(), "query_failed");
                AgingOutcome::Unavailable {
                    reason: "QUERY_FAILED",
                }
            }
        }
    }
}
