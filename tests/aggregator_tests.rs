mod common;

use async_trait::async_trait;
use business_health::error::{AppError, PartialFailure, Result};
use business_health::models::{MetricKey, ReportPeriod};
use business_health::repositories::MetricSource;
use business_health::services::MetricAggregator;
use mockall::mock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Source {}

    #[async_trait]
    impl MetricSource for Source {
        async fn fetch(&self, metric: MetricKey, period: &ReportPeriod) -> Result<Decimal>;
    }
}

fn september() -> ReportPeriod {
    ReportPeriod::for_month(2026, 9).unwrap()
}

#[tokio::test]
async fn test_every_key_is_queried_once() {
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .times(MetricKey::ALL.len())
        .returning(|metric, _| Ok(common::healthy_month(metric)));

    let aggregator = MetricAggregator::new(Arc::new(source), Duration::from_secs(1));
    let aggregates = aggregator.aggregate(&september()).await;

    assert!(aggregates.is_complete());
    for key in MetricKey::ALL {
        assert_eq!(aggregates.get(key), Some(common::healthy_month(key)));
    }
}

#[tokio::test]
async fn test_one_failing_key_keeps_the_others() {
    let mut source = MockSource::new();
    source.expect_fetch().returning(|metric, _| match metric {
        MetricKey::AccountsPayable => Err(AppError::Validation("relation \"bills\" does not exist".to_string())),
        other => Ok(common::healthy_month(other)),
    });

    let aggregator = MetricAggregator::new(Arc::new(source), Duration::from_secs(1));
    let aggregates = aggregator.aggregate(&september()).await;

    assert_eq!(aggregates.len(), MetricKey::ALL.len());
    assert!(!aggregates.is_complete());
    assert_eq!(aggregates.get(MetricKey::AccountsPayable), None);
    assert_eq!(aggregates.value_or_zero(MetricKey::AccountsPayable), Decimal::ZERO);
    assert_eq!(aggregates.get(MetricKey::CashBalance), Some(common::healthy_month(MetricKey::CashBalance)));

    let failures = aggregates.failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        PartialFailure::QueryFailed {
            metric: MetricKey::AccountsPayable,
            ..
        }
    ));
}

#[tokio::test]
async fn test_period_is_passed_through() {
    let period = september();
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .withf(move |_, p| *p == period)
        .returning(|_, _| Ok(Decimal::ONE));

    let aggregator = MetricAggregator::new(Arc::new(source), Duration::from_secs(1));
    let aggregates = aggregator.aggregate(&period).await;

    assert!(aggregates.is_complete());
}

#[test]
fn test_all_keys_failing_still_yields_full_set() {
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .returning(|_, _| Err(AppError::Internal(anyhow::anyhow!("pool closed"))));

    let aggregator = MetricAggregator::new(Arc::new(source), Duration::from_secs(1));
    let aggregates = tokio_test::block_on(aggregator.aggregate(&september()));

    assert_eq!(aggregates.len(), MetricKey::ALL.len());
    assert_eq!(aggregates.failures().len(), MetricKey::ALL.len());
}
