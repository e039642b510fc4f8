use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::PartialFailure;
use crate::models::{ColorCode, MetricKey, RawAggregates, ReportPeriod};

/// A derived value together with its traffic-light colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedMetric {
    pub value: Option<Decimal>,
    pub color_code: Option<ColorCode>,
}

impl ClassifiedMetric {
    pub fn new(value: Option<Decimal>, color_code: Option<ColorCode>) -> Self {
        Self { value, color_code }
    }

    pub fn not_applicable() -> Self {
        Self {
            value: None,
            color_code: None,
        }
    }
}

/// Report section tagged by whether all of its inputs were available.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionOutcome<T> {
    Complete { data: T },
    Partial { data: T, unavailable: Vec<MetricKey> },
}

impl<T> SectionOutcome<T> {
    /// Tags `data` as partial if any of `inputs` failed to load.
    pub fn from_inputs(data: T, inputs: &[MetricKey], aggregates: &RawAggregates) -> Self {
        let unavailable: Vec<MetricKey> = inputs
            .iter()
            .copied()
            .filter(|k| !aggregates.is_available(*k))
            .collect();

        if unavailable.is_empty() {
            SectionOutcome::Complete { data }
        } else {
            SectionOutcome::Partial { data, unavailable }
        }
    }

    pub fn data(&self) -> &T {
        match self {
            SectionOutcome::Complete { data } | SectionOutcome::Partial { data, .. } => data,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SectionOutcome::Complete { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSection {
    pub revenue_current: Decimal,
    pub revenue_previous: Decimal,
    pub cogs: Decimal,
    pub gross_profit: Option<Decimal>,
    pub mom_growth_pct: ClassifiedMetric,
    pub gross_margin_pct: ClassifiedMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersSection {
    pub orders_count: i64,
    pub orders_count_previous: i64,
    pub orders_growth_pct: Option<Decimal>,
    pub refunded_count: i64,
    pub refunded_amount: Decimal,
    pub average_order_value: ClassifiedMetric,
    pub refund_rate_pct: ClassifiedMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashSection {
    pub cash_balance: Decimal,
    pub operating_expenses: Decimal,
    pub monthly_burn: Option<Decimal>,
    pub cash_flow_positive: bool,
    pub runway_months: ClassifiedMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArApSection {
    pub accounts_receivable: Decimal,
    pub accounts_payable: Decimal,
    pub purchases: Decimal,
    pub dso_days: ClassifiedMetric,
    pub dpo_days: ClassifiedMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySection {
    pub inventory_value: Decimal,
    pub dio_days: ClassifiedMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingCostsSection {
    pub processing_fees: Decimal,
    pub processing_cost_pct: ClassifiedMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSection {
    pub tax_collected: Decimal,
    pub tax_remitted: Decimal,
    pub net_tax_liability: Option<Decimal>,
    pub effective_tax_rate_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingCapitalSection {
    pub current_assets: Option<Decimal>,
    pub current_liabilities: Option<Decimal>,
    pub working_capital: Option<Decimal>,
    pub current_ratio: ClassifiedMetric,
    pub cash_conversion_cycle_days: Option<Decimal>,
}

/// Response body of the business health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHealthReport {
    pub period: ReportPeriod,
    pub generated_at: DateTime<Utc>,
    pub health_score: Decimal,
    pub health_color_code: ColorCode,
    pub revenue: SectionOutcome<RevenueSection>,
    pub orders: SectionOutcome<OrdersSection>,
    pub cash: SectionOutcome<CashSection>,
    pub ar_ap: SectionOutcome<ArApSection>,
    pub inventory: SectionOutcome<InventorySection>,
    pub processing_costs: SectionOutcome<ProcessingCostsSection>,
    pub tax: SectionOutcome<TaxSection>,
    pub working_capital: SectionOutcome<WorkingCapitalSection>,
    pub data_gaps: Vec<PartialFailure>,
}
