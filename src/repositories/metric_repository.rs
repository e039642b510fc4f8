use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::config::AccountingSettings;
use crate::error::{AppError, Result};
use crate::models::{MetricKey, ReportPeriod};

/// Source of the named raw aggregates.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Computes a single aggregate for the given period.
    async fn fetch(&self, metric: MetricKey, period: &ReportPeriod) -> Result<Decimal>;
}

// Orders that count as sold. Refunded orders are excluded from revenue but
// still count towards the order total so the refund rate has a denominator.
const SOLD_STATUSES: &str = "('PAID', 'SHIPPED', 'DELIVERED')";

/// PostgreSQL-backed aggregate queries over the storefront tables.
pub struct MetricRepository {
    pool: PgPool,
    accounting: AccountingSettings,
}

impl MetricRepository {
    pub fn new(pool: PgPool, accounting: AccountingSettings) -> Self {
        Self { pool, accounting }
    }

    /// Runs a query returning one numeric scalar over `[start, end)`.
    async fn scalar(&self, sql: &str, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        let value: Option<Decimal> = sqlx::query_scalar(sql)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(value.unwrap_or(Decimal::ZERO))
    }

    async fn revenue(&self, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(total_amount - tax_amount), 0)
            FROM orders
            WHERE status IN {SOLD_STATUSES}
              AND paid_at >= $1 AND paid_at < $2
            "#
        );
        self.scalar(&sql, start, end).await
    }

    async fn orders_count(&self, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        self.scalar(
            r#"
            SELECT COUNT(*)::numeric
            FROM orders
            WHERE status IN ('PAID', 'SHIPPED', 'DELIVERED', 'REFUNDED')
              AND paid_at >= $1 AND paid_at < $2
            "#,
            start,
            end,
        )
        .await
    }

    async fn operating_expenses(&self, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        let value: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(jl.debit - jl.credit), 0)
            FROM journal_lines jl
            JOIN journal_entries je ON je.id = jl.entry_id
            JOIN chart_of_accounts coa ON coa.code = jl.account_code
            WHERE je.status = 'POSTED'
              AND je.entry_date >= $1 AND je.entry_date < $2
              AND coa.account_type = $3
              AND coa.code NOT LIKE $4 || '%'
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(&self.accounting.expense_account_type)
        .bind(&self.accounting.cogs_account_prefix)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(value.unwrap_or(Decimal::ZERO))
    }

    async fn balance_as_of(&self, sql: &str, as_of: NaiveDate) -> Result<Decimal> {
        let value: Option<Decimal> = sqlx::query_scalar(sql)
            .bind(as_of)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(value.unwrap_or(Decimal::ZERO))
    }
}

#[async_trait]
impl MetricSource for MetricRepository {
    async fn fetch(&self, metric: MetricKey, period: &ReportPeriod) -> Result<Decimal> {
        let (start, end) = period.current_range();
        let (previous_start, previous_end) = period.previous_range();

        match metric {
            MetricKey::RevenueCurrent => self.revenue(start, end).await,
            MetricKey::RevenuePrevious => self.revenue(previous_start, previous_end).await,
            MetricKey::OrdersCountCurrent => self.orders_count(start, end).await,
            MetricKey::OrdersCountPrevious => self.orders_count(previous_start, previous_end).await,
            MetricKey::RefundedCount => {
                self.scalar(
                    r#"
                    SELECT COUNT(*)::numeric
                    FROM orders
                    WHERE status = 'REFUNDED'
                      AND refunded_at >= $1 AND refunded_at < $2
                    "#,
                    start,
                    end,
                )
                .await
            }
            MetricKey::RefundedAmount => {
                self.scalar(
                    r#"
                    SELECT COALESCE(SUM(total_amount), 0)
                    FROM orders
                    WHERE status = 'REFUNDED'
                      AND refunded_at >= $1 AND refunded_at < $2
                    "#,
                    start,
                    end,
                )
                .await
            }
            MetricKey::CogsCurrent => {
                // Sales carry negative quantities; returns put cost back.
                self.scalar(
                    r#"
                    SELECT COALESCE(SUM(-quantity * unit_cost), 0)
                    FROM inventory_transactions
                    WHERE transaction_type IN ('SALE', 'RETURN')
                      AND created_at >= $1 AND created_at < $2
                    "#,
                    start,
                    end,
                )
                .await
            }
            MetricKey::OperatingExpensesCurrent => self.operating_expenses(start, end).await,
            MetricKey::PurchasesCurrent => {
                self.scalar(
                    r#"
                    SELECT COALESCE(SUM(total_amount), 0)
                    FROM bills
                    WHERE status <> 'VOID'
                      AND bill_date >= $1 AND bill_date < $2
                    "#,
                    start,
                    end,
                )
                .await
            }
            MetricKey::AccountsReceivable => {
                self.balance_as_of(
                    r#"
                    SELECT COALESCE(SUM(balance_due), 0)
                    FROM invoices
                    WHERE status IN ('SENT', 'PARTIAL')
                      AND issue_date <= $1
                    "#,
                    period.period_end,
                )
                .await
            }
            MetricKey::AccountsPayable => {
                self.balance_as_of(
                    r#"
                    SELECT COALESCE(SUM(balance_due), 0)
                    FROM bills
                    WHERE status IN ('OPEN', 'PARTIAL')
                      AND bill_date <= $1
                    "#,
                    period.period_end,
                )
                .await
            }
            MetricKey::CashBalance => {
                let value: Option<Decimal> = sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(current_balance), 0)
                    FROM bank_accounts
                    WHERE is_active
                    "#,
                )
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

                Ok(value.unwrap_or(Decimal::ZERO))
            }
            MetricKey::InventoryValue => {
                self.balance_as_of(
                    r#"
                    SELECT COALESCE(SUM(quantity * unit_cost), 0)
                    FROM inventory_transactions
                    WHERE created_at < ($1::date + 1)
                    "#,
                    period.period_end,
                )
                .await
            }
            MetricKey::ProcessingFeesCurrent => {
                self.scalar(
                    r#"
                    SELECT COALESCE(SUM(processing_fee), 0)
                    FROM payments
                    WHERE status IN ('SUCCEEDED', 'REFUNDED')
                      AND created_at >= $1 AND created_at < $2
                    "#,
                    start,
                    end,
                )
                .await
            }
            MetricKey::TaxCollectedCurrent => {
                let sql = format!(
                    r#"
                    SELECT COALESCE(SUM(tax_amount), 0)
                    FROM orders
                    WHERE status IN {SOLD_STATUSES}
                      AND paid_at >= $1 AND paid_at < $2
                    "#
                );
                self.scalar(&sql, start, end).await
            }
            MetricKey::TaxRemittedCurrent => {
                self.scalar(
                    r#"
                    SELECT COALESCE(SUM(amount), 0)
                    FROM tax_remittances
                    WHERE remitted_on >= $1 AND remitted_on < $2
                    "#,
                    start,
                    end,
                )
                .await
            }
        }
    }
}
