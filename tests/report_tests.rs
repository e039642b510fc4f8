mod common;

use business_health::error::PartialFailure;
use business_health::models::{
    ClassifiedMetric, ColorCode, HealthWeights, MetricKey, RatioMetric, RawAggregates,
    ReportPeriod, ThresholdRule,
};
use business_health::services::ratio_calculator::{
    days_outstanding, gross_margin_pct, mom_growth_pct, ratio, ratio_pct, runway_months,
};
use business_health::services::{build_report, composite_score, RatioCalculator, Scorecard};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn september() -> ReportPeriod {
    ReportPeriod::for_month(2026, 9).unwrap()
}

fn healthy_aggregates() -> RawAggregates {
    RawAggregates::from_values(MetricKey::ALL.map(|k| (k, common::healthy_month(k))))
}

fn with_failure(metric: MetricKey) -> RawAggregates {
    let mut outcomes: BTreeMap<_, _> = MetricKey::ALL
        .iter()
        .map(|k| (*k, Ok(common::healthy_month(*k))))
        .collect();
    outcomes.insert(
        metric,
        Err(PartialFailure::QueryFailed {
            metric,
            message: "connection reset".to_string(),
        }),
    );
    RawAggregates::from_outcomes(outcomes)
}

#[test]
fn test_zero_denominators_yield_none() {
    assert_eq!(ratio(dec!(10), Decimal::ZERO), None);
    assert_eq!(ratio_pct(dec!(10), Decimal::ZERO), None);
    assert_eq!(mom_growth_pct(dec!(10), Decimal::ZERO), None);
    assert_eq!(gross_margin_pct(Decimal::ZERO, dec!(10)), None);
    assert_eq!(days_outstanding(dec!(10), Decimal::ZERO, 30), None);
    assert_eq!(runway_months(dec!(10), Decimal::ZERO), None);
}

#[test]
fn test_derived_ratios_for_healthy_month() {
    let ratios = RatioCalculator::new(30).derive(&healthy_aggregates(), &september());

    assert_eq!(ratios.mom_growth_pct, Some(dec!(20)));
    assert_eq!(ratios.gross_margin_pct, Some(dec!(45)));
    assert_eq!(ratios.dso_days, Some(dec!(15)));
    assert_eq!(ratios.dpo_days, Some(dec!(15)));
    assert_eq!(ratios.dio_days, Some(dec!(60)));
    assert_eq!(ratios.cash_conversion_cycle_days, Some(dec!(60)));
    assert_eq!(ratios.average_order_value, Some(dec!(150)));
    assert_eq!(ratios.refund_rate_pct, Some(dec!(1)));
    assert_eq!(ratios.processing_cost_pct, Some(dec!(2.5)));
    assert_eq!(ratios.monthly_burn, Some(dec!(-24000)));
    assert_eq!(ratios.runway_months, None);
    assert_eq!(ratios.cash_flow_positive(), Some(true));
    assert_eq!(ratios.net_tax_liability, Some(dec!(3600)));
    assert_eq!(ratios.working_capital, Some(dec!(368400)));
}

#[test]
fn test_classification_is_monotonic() {
    let higher = ThresholdRule::higher_is_better(dec!(40), dec!(20));
    let lower = ThresholdRule::lower_is_better(dec!(15), dec!(30));

    let mut previous_higher = ColorCode::Red;
    let mut previous_lower = ColorCode::Green;
    for step in -20..=120 {
        let value = Decimal::from(step) / dec!(2);
        let h = higher.classify(value);
        let l = lower.classify(value);
        assert!(h >= previous_higher, "higher-is-better regressed at {}", value);
        assert!(l <= previous_lower, "lower-is-better improved at {}", value);
        previous_higher = h;
        previous_lower = l;
    }
}

#[test]
fn test_health_score_stays_within_bounds() {
    let colors = [None, Some(ColorCode::Red), Some(ColorCode::Yellow), Some(ColorCode::Green)];
    let mut weights = BTreeMap::new();
    weights.insert(RatioMetric::GrossMarginPct, dec!(20));
    weights.insert(RatioMetric::RunwayMonths, dec!(30));
    weights.insert(RatioMetric::DsoDays, dec!(0.5));
    let weights = HealthWeights::new(weights).unwrap();

    for a in colors {
        for b in colors {
            for c in colors {
                let mut card = Scorecard::default();
                card.insert(RatioMetric::GrossMarginPct, ClassifiedMetric::new(None, a));
                card.insert(RatioMetric::RunwayMonths, ClassifiedMetric::new(None, b));
                card.insert(RatioMetric::DsoDays, ClassifiedMetric::new(None, c));

                let score = composite_score(&card, &weights);
                assert!(score >= Decimal::ZERO && score <= dec!(100), "{}", score);
                assert_eq!(score, score.round_dp(1));
            }
        }
    }
}

#[test]
fn test_healthy_month_report() {
    let settings = common::test_settings();
    let scoring = settings.scoring_config().unwrap();

    let report = build_report(september(), &healthy_aggregates(), &scoring, 30, Utc::now());

    assert_eq!(report.health_score, dec!(100));
    assert_eq!(report.health_color_code, ColorCode::Green);
    assert!(report.data_gaps.is_empty());
    assert_eq!(report.orders.data().orders_count, 800);
    assert_eq!(report.ar_ap.data().dso_days.color_code, Some(ColorCode::Green));
    assert_eq!(report.ar_ap.data().dpo_days.color_code, Some(ColorCode::Yellow));
    assert!(report.cash.data().cash_flow_positive);
    assert_eq!(report.cash.data().runway_months.color_code, Some(ColorCode::Green));
}

#[test]
fn test_failed_revenue_marks_sections_partial() {
    let settings = common::test_settings();
    let scoring = settings.scoring_config().unwrap();

    let report = build_report(
        september(),
        &with_failure(MetricKey::RevenueCurrent),
        &scoring,
        30,
        Utc::now(),
    );

    assert!(!report.revenue.is_complete());
    assert!(!report.processing_costs.is_complete());
    assert!(report.inventory.is_complete());
    assert_eq!(report.revenue.data().revenue_current, Decimal::ZERO);
    assert_eq!(report.revenue.data().gross_margin_pct, ClassifiedMetric::not_applicable());
    assert!(!report.cash.data().cash_flow_positive);
    assert_eq!(report.data_gaps.len(), 1);
}

#[test]
fn test_extreme_balances_render_null_totals() {
    let settings = common::test_settings();
    let scoring = settings.scoring_config().unwrap();
    let mut values: BTreeMap<MetricKey, Decimal> =
        MetricKey::ALL.iter().map(|k| (*k, common::healthy_month(*k))).collect();
    values.insert(MetricKey::AccountsReceivable, Decimal::MAX);
    values.insert(MetricKey::CashBalance, Decimal::ONE);

    let report = build_report(
        september(),
        &RawAggregates::from_values(values),
        &scoring,
        30,
        Utc::now(),
    );

    let working_capital = report.working_capital.data();
    assert_eq!(working_capital.current_assets, None);
    assert_eq!(working_capital.working_capital, None);
    assert_eq!(working_capital.current_ratio.value, None);
    assert_eq!(report.ar_ap.data().dso_days.value, None);
    assert!(report.health_score >= Decimal::ZERO && report.health_score <= dec!(100));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["workingCapital"]["data"]["workingCapital"].is_null());
}

#[test]
fn test_report_json_shape() {
    let settings = common::test_settings();
    let scoring = settings.scoring_config().unwrap();
    let report = build_report(
        september(),
        &with_failure(MetricKey::InventoryValue),
        &scoring,
        30,
        Utc::now(),
    );

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["period"]["periodStart"], "2026-09-01");
    assert_eq!(json["healthColorCode"], "GREEN");
    assert_eq!(json["revenue"]["status"], "COMPLETE");
    assert_eq!(json["revenue"]["data"]["momGrowthPct"]["colorCode"], "GREEN");
    assert_eq!(json["inventory"]["status"], "PARTIAL");
    assert_eq!(json["inventory"]["unavailable"][0], "inventory_value");
    assert!(json["inventory"]["data"]["dioDays"]["value"].is_null());
    assert_eq!(json["arAp"]["status"], "COMPLETE");
    assert_eq!(json["dataGaps"][0]["reason"], "QUERY_FAILED");
    assert_eq!(json["dataGaps"][0]["metric"], "inventory_value");
}
