use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::ReportingSettings;
use crate::models::{
    ArApSection, BusinessHealthReport, CashSection, InventorySection, MetricKey, OrdersSection,
    ProcessingCostsSection, RatioMetric, RawAggregates, ReportPeriod, RevenueSection,
    ScoringConfig, SectionOutcome, TaxSection, WorkingCapitalSection,
};
use crate::observability::{get_metrics, mask_amount, LatencyTimer};
use crate::repositories::MetricSource;
use crate::services::health_score::composite_score;
use crate::services::metric_aggregator::MetricAggregator;
use crate::services::ratio_calculator::RatioCalculator;
use crate::services::scorecard::Scorecard;
use crate::services::scoring_registry::ScoringRegistry;

const REVENUE_INPUTS: &[MetricKey] = &[
    MetricKey::RevenueCurrent,
    MetricKey::RevenuePrevious,
    MetricKey::CogsCurrent,
];

const ORDERS_INPUTS: &[MetricKey] = &[
    MetricKey::OrdersCountCurrent,
    MetricKey::OrdersCountPrevious,
    MetricKey::RefundedCount,
    MetricKey::RefundedAmount,
    MetricKey::RevenueCurrent,
];

const CASH_INPUTS: &[MetricKey] = &[
    MetricKey::CashBalance,
    MetricKey::OperatingExpensesCurrent,
    MetricKey::RevenueCurrent,
    MetricKey::CogsCurrent,
];

const AR_AP_INPUTS: &[MetricKey] = &[
    MetricKey::AccountsReceivable,
    MetricKey::AccountsPayable,
    MetricKey::PurchasesCurrent,
    MetricKey::RevenueCurrent,
];

const INVENTORY_INPUTS: &[MetricKey] = &[MetricKey::InventoryValue, MetricKey::CogsCurrent];

const PROCESSING_INPUTS: &[MetricKey] =
    &[MetricKey::ProcessingFeesCurrent, MetricKey::RevenueCurrent];

const TAX_INPUTS: &[MetricKey] = &[
    MetricKey::TaxCollectedCurrent,
    MetricKey::TaxRemittedCurrent,
    MetricKey::RevenueCurrent,
];

const WORKING_CAPITAL_INPUTS: &[MetricKey] = &[
    MetricKey::CashBalance,
    MetricKey::AccountsReceivable,
    MetricKey::InventoryValue,
    MetricKey::AccountsPayable,
    MetricKey::TaxCollectedCurrent,
    MetricKey::TaxRemittedCurrent,
    MetricKey::PurchasesCurrent,
    MetricKey::RevenueCurrent,
    MetricKey::CogsCurrent,
];

fn count(aggregates: &RawAggregates, key: MetricKey) -> i64 {
    aggregates.value_or_zero(key).to_i64().unwrap_or_default()
}

/// Assembles the report from already-fetched aggregates.
///
/// Pure: the same inputs always give the same report, which keeps the
/// whole derivation testable without a database.
pub fn build_report(
    period: ReportPeriod,
    aggregates: &RawAggregates,
    scoring: &ScoringConfig,
    days_per_month: i64,
    generated_at: DateTime<Utc>,
) -> BusinessHealthReport {
    let ratios = RatioCalculator::new(days_per_month).derive(aggregates, &period);
    let scorecard = Scorecard::classify(&ratios, &scoring.thresholds);
    let health_score = composite_score(&scorecard, &scoring.weights);
    let zero = |key: MetricKey| aggregates.value_or_zero(key);

    let revenue = RevenueSection {
        revenue_current: zero(MetricKey::RevenueCurrent),
        revenue_previous: zero(MetricKey::RevenuePrevious),
        cogs: zero(MetricKey::CogsCurrent),
        gross_profit: ratios.gross_profit,
        mom_growth_pct: scorecard.get(RatioMetric::MomGrowthPct),
        gross_margin_pct: scorecard.get(RatioMetric::GrossMarginPct),
    };

    let orders = OrdersSection {
        orders_count: count(aggregates, MetricKey::OrdersCountCurrent),
        orders_count_previous: count(aggregates, MetricKey::OrdersCountPrevious),
        orders_growth_pct: ratios.orders_growth_pct,
        refunded_count: count(aggregates, MetricKey::RefundedCount),
        refunded_amount: zero(MetricKey::RefundedAmount),
        average_order_value: scorecard.get(RatioMetric::AverageOrderValue),
        refund_rate_pct: scorecard.get(RatioMetric::RefundRatePct),
    };

    let cash = CashSection {
        cash_balance: zero(MetricKey::CashBalance),
        operating_expenses: zero(MetricKey::OperatingExpensesCurrent),
        monthly_burn: ratios.monthly_burn,
        cash_flow_positive: ratios.cash_flow_positive().unwrap_or(false),
        runway_months: scorecard.get(RatioMetric::RunwayMonths),
    };

    let ar_ap = ArApSection {
        accounts_receivable: zero(MetricKey::AccountsReceivable),
        accounts_payable: zero(MetricKey::AccountsPayable),
        purchases: zero(MetricKey::PurchasesCurrent),
        dso_days: scorecard.get(RatioMetric::DsoDays),
        dpo_days: scorecard.get(RatioMetric::DpoDays),
    };

    let inventory = InventorySection {
        inventory_value: zero(MetricKey::InventoryValue),
        dio_days: scorecard.get(RatioMetric::DioDays),
    };

    let processing_costs = ProcessingCostsSection {
        processing_fees: zero(MetricKey::ProcessingFeesCurrent),
        processing_cost_pct: scorecard.get(RatioMetric::ProcessingCostPct),
    };

    let tax = TaxSection {
        tax_collected: zero(MetricKey::TaxCollectedCurrent),
        tax_remitted: zero(MetricKey::TaxRemittedCurrent),
        net_tax_liability: ratios.net_tax_liability,
        effective_tax_rate_pct: ratios.effective_tax_rate_pct,
    };

    let working_capital = WorkingCapitalSection {
        current_assets: ratios.current_assets,
        current_liabilities: ratios.current_liabilities,
        working_capital: ratios.working_capital,
        current_ratio: scorecard.get(RatioMetric::CurrentRatio),
        cash_conversion_cycle_days: ratios.cash_conversion_cycle_days,
    };

    BusinessHealthReport {
        period,
        generated_at,
        health_score,
        health_color_code: scoring.health_score.classify(health_score),
        revenue: SectionOutcome::from_inputs(revenue, REVENUE_INPUTS, aggregates),
        orders: SectionOutcome::from_inputs(orders, ORDERS_INPUTS, aggregates),
        cash: SectionOutcome::from_inputs(cash, CASH_INPUTS, aggregates),
        ar_ap: SectionOutcome::from_inputs(ar_ap, AR_AP_INPUTS, aggregates),
        inventory: SectionOutcome::from_inputs(inventory, INVENTORY_INPUTS, aggregates),
        processing_costs: SectionOutcome::from_inputs(
            processing_costs,
            PROCESSING_INPUTS,
            aggregates,
        ),
        tax: SectionOutcome::from_inputs(tax, TAX_INPUTS, aggregates),
        working_capital: SectionOutcome::from_inputs(
            working_capital,
            WORKING_CAPITAL_INPUTS,
            aggregates,
        ),
        data_gaps: aggregates.failures().into_iter().cloned().collect(),
    }
}

/// Service producing the business health report.
pub struct BusinessHealthService {
    aggregator: MetricAggregator,
    scoring: ScoringRegistry,
    days_per_month: i64,
}

impl BusinessHealthService {
    pub fn new(
        source: Arc<dyn MetricSource>,
        scoring: ScoringRegistry,
        reporting: &ReportingSettings,
    ) -> Self {
        Self {
            aggregator: MetricAggregator::new(
                source,
                Duration::from_millis(reporting.query_timeout_ms),
            ),
            scoring,
            days_per_month: reporting.days_per_month,
        }
    }

    /// Builds the report for `period`. Individual query failures show up as
    /// partial sections and data gaps, never as an error.
    pub async fn generate(&self, period: &ReportPeriod) -> BusinessHealthReport {
        let timer = LatencyTimer::new();
        let scoring = self.scoring.snapshot().await;
        let aggregates = self.aggregator.aggregate(period).await;

        let report = build_report(
            *period,
            &aggregates,
            &scoring,
            self.days_per_month,
            Utc::now(),
        );

        let complete = report.data_gaps.is_empty();
        let metrics = get_metrics();
        metrics.record_report_generated("business_health", timer.elapsed_ms(), complete);
        metrics.set_health_score(report.health_score.to_f64().unwrap_or_default());

        info!(
            period_start = %period.period_start,
            period_end = %period.period_end,
            revenue = %mask_amount(&aggregates.value_or_zero(MetricKey::RevenueCurrent)),
            health_score = %report.health_score,
            color = ?report.health_color_code,
            data_gaps = report.data_gaps.len(),
            "Business health report generated"
        );

        report
    }
}
