use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::models::{
    LoyaltyAccount, LoyaltyReport, RankedAccount, TierSummary, TierTable, TierTotals,
};
use crate::observability::{get_metrics, LatencyTimer};
use crate::repositories::LoyaltySource;

/// Lays per-tier aggregates over the full tier ladder and labels the
/// ranked accounts.
///
/// Tiers without members are reported with zero counts. Negative balances
/// count toward membership of the lowest tier but add no points.
pub fn summarize_tiers(
    totals: &[TierTotals],
    top: &[LoyaltyAccount],
    tiers: &TierTable,
    point_value: Decimal,
    generated_at: DateTime<Utc>,
) -> LoyaltyReport {
    let mut summaries: Vec<TierSummary> = tiers
        .tiers()
        .iter()
        .map(|t| TierSummary {
            tier: t.name.clone(),
            min_points: t.min_points,
            member_count: 0,
            total_points: 0,
        })
        .collect();

    let mut total_accounts: u64 = 0;
    let mut total_points: i64 = 0;
    for row in totals {
        let members = u64::try_from(row.member_count).unwrap_or(0);
        let points = row.total_points.max(0);
        let summary = &mut summaries[tiers.index_for_rank(row.tier_rank)];
        summary.member_count = summary.member_count.saturating_add(members);
        summary.total_points = summary.total_points.saturating_add(points);
        total_accounts = total_accounts.saturating_add(members);
        total_points = total_points.saturating_add(points);
    }

    let top_accounts = top
        .iter()
        .map(|a| RankedAccount {
            customer_id: a.customer_id,
            points_balance: a.points_balance,
            tier: tiers.tiers()[tiers.index_for(a.points_balance)].name.clone(),
        })
        .collect();

    LoyaltyReport {
        generated_at,
        tiers: summaries,
        total_accounts,
        total_points,
        points_liability: Decimal::from(total_points).saturating_mul(point_value),
        top_accounts,
    }
}

/// Service producing the loyalty tier report.
pub struct LoyaltyService {
    source: Arc<dyn LoyaltySource>,
    tiers: TierTable,
    point_value: Decimal,
}

impl LoyaltyService {
    pub fn new(source: Arc<dyn LoyaltySource>, tiers: TierTable, point_value: Decimal) -> Self {
        Self {
            source,
            tiers,
            point_value,
        }
    }

    pub async fn generate(&self, limit: usize) -> Result<LoyaltyReport> {
        let timer = LatencyTimer::new();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let (totals, top) = tokio::try_join!(
            self.source.tier_totals(&self.tiers),
            self.source.top_accounts(limit),
        )?;
        let report = summarize_tiers(&totals, &top, &self.tiers, self.point_value, Utc::now());

        get_metrics().record_report_generated("loyalty_tiers", timer.elapsed_ms(), true);
        info!(
            accounts = report.total_accounts,
            total_points = report.total_points,
            "Loyalty tier report generated"
        );
        Ok(report)
    }
}
