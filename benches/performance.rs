use async_trait::async_trait;
use chrono::{Duration as DateDuration, NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use business_health::config::Settings;
use business_health::error::Result;
use business_health::models::{
    AgingBuckets, AgingSide, MetricKey, OpenItem, RawAggregates, ReportPeriod, ScoringConfig,
};
use business_health::repositories::MetricSource;
use business_health::services::aging_service::summarize;
use business_health::services::{build_report, MetricAggregator, RatioCalculator};

struct ConstantSource;

#[async_trait]
impl MetricSource for ConstantSource {
    async fn fetch(&self, metric: MetricKey, _period: &ReportPeriod) -> Result<Decimal> {
        Ok(Decimal::from(metric as i64 * 1_000 + 250))
    }
}

fn scoring() -> ScoringConfig {
    Settings::new()
        .expect("config/default.toml should load")
        .scoring_config()
        .expect("valid scoring tables")
}

fn september() -> ReportPeriod {
    ReportPeriod::for_month(2026, 9).expect("valid month")
}

fn sample_aggregates() -> RawAggregates {
    RawAggregates::from_values(
        MetricKey::ALL.map(|k| (k, Decimal::from(k as i64 * 1_000 + 250))),
    )
}

fn benchmark_report_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    let aggregates = sample_aggregates();
    let period = september();
    let scoring = scoring();

    group.bench_function("derive_ratios", |b| {
        let calculator = RatioCalculator::new(30);
        b.iter(|| black_box(calculator.derive(black_box(&aggregates), &period)));
    });

    group.bench_function("build_report", |b| {
        b.iter(|| {
            black_box(build_report(
                period,
                black_box(&aggregates),
                &scoring,
                30,
                Utc::now(),
            ))
        });
    });

    group.bench_function("serialize_report", |b| {
        let report = build_report(period, &aggregates, &scoring, 30, Utc::now());
        b.iter(|| black_box(serde_json::to_vec(black_box(&report))))
    });

    group.finish();
}

fn benchmark_aggregation(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let aggregator = MetricAggregator::new(Arc::new(ConstantSource), Duration::from_secs(1));
    let period = september();

    c.bench_function("aggregate_all_keys", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(aggregator.aggregate(&period).await) });
    });
}

fn benchmark_aging(c: &mut Criterion) {
    let mut group = c.benchmark_group("aging");
    let as_of = NaiveDate::from_ymd_opt(2026, 10, 31).expect("valid date");
    let buckets = AgingBuckets::default();
    let thresholds = scoring().thresholds;

    for size in [100, 1_000, 10_000].iter() {
        let items: Vec<OpenItem> = (0..*size)
            .map(|i| OpenItem {
                id: Uuid::new_v4(),
                reference: format!("INV-{}", i),
                counterparty: "Fabrikam".to_string(),
                due_date: as_of - DateDuration::days((i % 180) as i64 - 30),
                balance_due: Decimal::from(i % 5_000 + 1),
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("summarize", size), &items, |b, items| {
            b.iter(|| {
                black_box(summarize(
                    AgingSide::Receivables,
                    black_box(items),
                    as_of,
                    &buckets,
                    &thresholds,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_report_derivation,
    benchmark_aggregation,
    benchmark_aging,
);
criterion_main!(benches);
