use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::ClassifiedMetric;

/// Which ledger an open item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingSide {
    Receivables,
    Payables,
}

impl AgingSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgingSide::Receivables => "receivables",
            AgingSide::Payables => "payables",
        }
    }
}

/// Unpaid invoice or supplier bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OpenItem {
    pub id: Uuid,
    pub reference: String,
    pub counterparty: String,
    pub due_date: NaiveDate,
    pub balance_due: Decimal,
}

impl OpenItem {
    /// Days past due on `as_of`; zero or negative means not yet due.
    pub fn days_past_due(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.due_date).num_days()
    }
}

/// Upper bounds (inclusive, in days past due) of the aging buckets.
///
/// `[30, 60, 90]` yields `current`, `1-30`, `31-60`, `61-90`, `over_90`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingBuckets {
    bucket_days: Vec<i64>,
}

impl AgingBuckets {
    pub fn new(bucket_days: Vec<i64>) -> Result<Self> {
        if bucket_days.is_empty() {
            return Err(AppError::Config(
                "aging buckets need at least one boundary".to_string(),
            ));
        }
        if bucket_days[0] < 1 {
            return Err(AppError::Config(format!(
                "first aging boundary must be at least 1 day (got {})",
                bucket_days[0]
            )));
        }
        if bucket_days.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AppError::Config(format!(
                "aging boundaries must be strictly increasing: {:?}",
                bucket_days
            )));
        }
        Ok(Self { bucket_days })
    }

    /// Number of buckets including `current` and the open-ended last one.
    pub fn bucket_count(&self) -> usize {
        self.bucket_days.len() + 2
    }

    /// Index of the bucket an item `days_past_due` old falls into.
    pub fn index_for(&self, days_past_due: i64) -> usize {
        if days_past_due <= 0 {
            return 0;
        }
        self.bucket_days
            .iter()
            .position(|upper| days_past_due <= *upper)
            .map(|i| i + 1)
            .unwrap_or(self.bucket_days.len() + 1)
    }

    /// Labels in bucket order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.bucket_count());
        labels.push("current".to_string());
        let mut lower = 1;
        for upper in &self.bucket_days {
            labels.push(format!("{}-{}", lower, upper));
            lower = upper + 1;
        }
        labels.push(format!("over_{}", lower - 1));
        labels
    }
}

impl Default for AgingBuckets {
    fn default() -> Self {
        Self {
            bucket_days: vec![30, 60, 90],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingBucket {
    pub label: String,
    pub total: Decimal,
    pub count: u64,
}

/// Bucketed open balance for one side of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingSummary {
    pub side: AgingSide,
    pub buckets: Vec<AgingBucket>,
    pub total_outstanding: Decimal,
    pub item_count: u64,
    pub oldest_days_past_due: Option<i64>,
    /// Share of the balance in the open-ended oldest bucket.
    pub over_90_pct: ClassifiedMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgingOutcome {
    Available { data: AgingSummary },
    /// The cause is logged; only a fixed code reaches the response.
    Unavailable { reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub receivables: AgingOutcome,
    pub payables: AgingOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels() {
        assert_eq!(
            AgingBuckets::default().labels(),
            vec!["current", "1-30", "31-60", "61-90", "over_90"]
        );
    }

    #[test]
    fn test_index_for_boundaries() {
        let buckets = AgingBuckets::default();
        assert_eq!(buckets.index_for(-5), 0);
        assert_eq!(buckets.index_for(0), 0);
        assert_eq!(buckets.index_for(1), 1);
        assert_eq!(buckets.index_for(30), 1);
        assert_eq!(buckets.index_for(31), 2);
        assert_eq!(buckets.index_for(90), 3);
        assert_eq!(buckets.index_for(91), 4);
        assert_eq!(buckets.index_for(400), 4);
    }

    #[test]
    fn test_rejects_unsorted_boundaries() {
        assert!(AgingBuckets::new(vec![30, 30, 90]).is_err());
        assert!(AgingBuckets::new(vec![60, 30]).is_err());
        assert!(AgingBuckets::new(vec![]).is_err());
        assert!(AgingBuckets::new(vec![0, 30]).is_err());
        assert!(AgingBuckets::new(vec![15, 45]).is_ok());
    }

    #[test]
    fn test_days_past_due() {
        let item = OpenItem {
            id: Uuid::new_v4(),
            reference: "INV-1".to_string(),
            counterparty: "Acme Labs".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            balance_due: Decimal::from(100),
        };
        let as_of = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        assert_eq!(item.days_past_due(as_of), 29);
    }
}
