use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{LoyaltyAccount, TierTable, TierTotals};

#[async_trait]
pub trait LoyaltySource: Send + Sync {
    /// Member count and positive points per tier, one row per occupied tier.
    async fn tier_totals(&self, tiers: &TierTable) -> Result<Vec<TierTotals>>;

    /// The `limit` largest balances, ties broken by customer id.
    async fn top_accounts(&self, limit: i64) -> Result<Vec<LoyaltyAccount>>;
}

pub struct LoyaltyRepository {
    pool: PgPool,
}

impl LoyaltyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoyaltySource for LoyaltyRepository {
    async fn tier_totals(&self, tiers: &TierTable) -> Result<Vec<TierTotals>> {
        let min_points: Vec<i64> = tiers.tiers().iter().map(|t| t.min_points).collect();

        // width_bucket counts the tier minimums at or below the balance;
        // negative balances fall below the first one and join the lowest tier.
        let rows = sqlx::query_as::<_, TierTotals>(
            r#"
            SELECT GREATEST(width_bucket(points_balance, $1::BIGINT[]), 1) AS tier_rank,
                   COUNT(*)::BIGINT AS member_count,
                   COALESCE(SUM(GREATEST(points_balance, 0)), 0)::BIGINT AS total_points
            FROM loyalty_accounts
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(&min_points)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    async fn top_accounts(&self, limit: i64) -> Result<Vec<LoyaltyAccount>> {
        let rows = sqlx::query_as::<_, LoyaltyAccount>(
            r#"
            SELECT customer_id, points_balance, lifetime_points
            FROM loyalty_accounts
            ORDER BY points_balance DESC, customer_id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}
