use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Points balance of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LoyaltyAccount {
    pub customer_id: Uuid,
    pub points_balance: i64,
    pub lifetime_points: i64,
}

/// Aggregate of one occupied tier. `tier_rank` is 1-based in tier order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct TierTotals {
    pub tier_rank: i32,
    pub member_count: i64,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTier {
    pub name: String,
    pub min_points: i64,
}

/// Ordered tier ladder. The first tier starts at zero points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierTable {
    tiers: Vec<LoyaltyTier>,
}

impl TierTable {
    pub fn new(tiers: Vec<LoyaltyTier>) -> Result<Self> {
        let first = tiers
            .first()
            .ok_or_else(|| AppError::Config("loyalty tier table is empty".to_string()))?;
        if first.min_points != 0 {
            return Err(AppError::Config(format!(
                "lowest loyalty tier '{}' must start at 0 points",
                first.name
            )));
        }
        if tiers.windows(2).any(|w| w[0].min_points >= w[1].min_points) {
            return Err(AppError::Config(
                "loyalty tiers must have strictly increasing min_points".to_string(),
            ));
        }
        let mut names = HashSet::new();
        if let Some(dup) = tiers.iter().find(|t| !names.insert(t.name.as_str())) {
            return Err(AppError::Config(format!(
                "duplicate loyalty tier name '{}'",
                dup.name
            )));
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[LoyaltyTier] {
        &self.tiers
    }

    /// Index for a 1-based tier rank, clamped into the table.
    pub fn index_for_rank(&self, rank: i32) -> usize {
        let index = usize::try_from(rank.saturating_sub(1)).unwrap_or(0);
        index.min(self.tiers.len() - 1)
    }

    /// Index of the highest tier reached by `points`. Negative balances
    /// land in the lowest tier.
    pub fn index_for(&self, points: i64) -> usize {
        self.tiers
            .iter()
            .rposition(|t| points >= t.min_points)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSummary {
    pub tier: String,
    pub min_points: i64,
    pub member_count: u64,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAccount {
    pub customer_id: Uuid,
    pub points_balance: i64,
    pub tier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyReport {
    pub generated_at: DateTime<Utc>,
    pub tiers: Vec<TierSummary>,
    pub total_accounts: u64,
    pub total_points: i64,
    pub points_liability: Decimal,
    pub top_accounts: Vec<RankedAccount>,
}
