use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{AgingSide, OpenItem};

/// Source of unpaid invoices and bills.
#[async_trait]
pub trait OpenItemSource: Send + Sync {
    /// Items with a positive balance that existed on `as_of`.
    async fn open_items(&self, side: AgingSide, as_of: NaiveDate) -> Result<Vec<OpenItem>>;
}

pub struct AgingRepository {
    pool: PgPool,
}

impl AgingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OpenItemSource for AgingRepository {
    async fn open_items(&self, side: AgingSide, as_of: NaiveDate) -> Result<Vec<OpenItem>> {
        let sql = match side {
            AgingSide::Receivables => {
                r#"
                SELECT id, invoice_number AS reference, customer_name AS counterparty,
                       due_date, balance_due
                FROM invoices
                WHERE status IN ('SENT', 'PARTIAL')
                  AND balance_due > 0
                  AND issue_date <= $1
                ORDER BY due_date ASC
                "#
            }
            AgingSide::Payables => {
                r#"
                SELECT id, bill_number AS reference, supplier_name AS counterparty,
                       due_date, balance_due
                FROM bills
                WHERE status IN ('OPEN', 'PARTIAL')
                  AND balance_due > 0
                  AND bill_date <= $1
                ORDER BY due_date ASC
                "#
            }
        };

        let rows = sqlx::query_as::<_, OpenItem>(sql)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows)
    }
}
