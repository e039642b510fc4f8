//! Derived business ratios.
//!
//! Every ratio is `None` when its denominator is zero or one of its inputs is
//! unavailable. Decimal arithmetic never yields infinity or NaN, and checked
//! operations turn overflow into `None` as well. Multiplications happen
//! before the division to keep results exact where possible.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{MetricKey, RatioMetric, RawAggregates, ReportPeriod};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `numerator / denominator`.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.checked_div(denominator)
}

/// `numerator / denominator * 100`.
pub fn ratio_pct(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    ratio(numerator.checked_mul(HUNDRED)?, denominator)
}

/// Month-over-month change: `(current - previous) / previous * 100`.
pub fn mom_growth_pct(current: Decimal, previous: Decimal) -> Option<Decimal> {
    ratio_pct(current.checked_sub(previous)?, previous)
}

/// `(revenue - cogs) / revenue * 100`.
pub fn gross_margin_pct(revenue: Decimal, cogs: Decimal) -> Option<Decimal> {
    ratio_pct(revenue.checked_sub(cogs)?, revenue)
}

/// `balance / flow * days`: DSO with (AR, revenue), DPO with (AP, purchases),
/// DIO with (inventory, COGS).
pub fn days_outstanding(balance: Decimal, flow: Decimal, days_in_period: i64) -> Option<Decimal> {
    ratio(balance.checked_mul(Decimal::from(days_in_period))?, flow)
}

/// Net monthly cash burn: spending minus revenue, scaled to a month.
/// Negative when the period was cash-flow positive.
pub fn monthly_burn(
    revenue: Decimal,
    cogs: Decimal,
    operating_expenses: Decimal,
    days_in_period: i64,
    days_per_month: i64,
) -> Option<Decimal> {
    let net_spend = cogs.checked_add(operating_expenses)?.checked_sub(revenue)?;
    ratio(
        net_spend.checked_mul(Decimal::from(days_per_month))?,
        Decimal::from(days_in_period),
    )
}

/// `cash / monthly_burn`; `None` unless the business is burning cash.
pub fn runway_months(cash: Decimal, monthly_burn: Decimal) -> Option<Decimal> {
    if monthly_burn <= Decimal::ZERO {
        return None;
    }
    ratio(cash, monthly_burn)
}

/// All derived values of the business health report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedRatios {
    pub gross_profit: Option<Decimal>,
    pub current_assets: Option<Decimal>,
    pub current_liabilities: Option<Decimal>,
    pub working_capital: Option<Decimal>,
    pub net_tax_liability: Option<Decimal>,
    pub mom_growth_pct: Option<Decimal>,
    pub orders_growth_pct: Option<Decimal>,
    pub gross_margin_pct: Option<Decimal>,
    pub dso_days: Option<Decimal>,
    pub dpo_days: Option<Decimal>,
    pub dio_days: Option<Decimal>,
    pub cash_conversion_cycle_days: Option<Decimal>,
    pub monthly_burn: Option<Decimal>,
    pub runway_months: Option<Decimal>,
    pub average_order_value: Option<Decimal>,
    pub refund_rate_pct: Option<Decimal>,
    pub processing_cost_pct: Option<Decimal>,
    pub effective_tax_rate_pct: Option<Decimal>,
    pub current_ratio: Option<Decimal>,
    /// Nothing is burning and cash is not exhausted: runway counts as the
    /// best outcome even though no figure exists.
    pub runway_unbounded: bool,
}

impl DerivedRatios {
    /// `Some(true)` when revenue covered spending, `None` if burn is unknown.
    pub fn cash_flow_positive(&self) -> Option<bool> {
        self.monthly_burn.map(|burn| burn <= Decimal::ZERO)
    }

    /// Value of a classified metric, if this report computes it.
    pub fn value(&self, metric: RatioMetric) -> Option<Decimal> {
        match metric {
            RatioMetric::MomGrowthPct => self.mom_growth_pct,
            RatioMetric::GrossMarginPct => self.gross_margin_pct,
            RatioMetric::DsoDays => self.dso_days,
            RatioMetric::DpoDays => self.dpo_days,
            RatioMetric::DioDays => self.dio_days,
            RatioMetric::RunwayMonths => self.runway_months,
            RatioMetric::CurrentRatio => self.current_ratio,
            RatioMetric::AverageOrderValue => self.average_order_value,
            RatioMetric::RefundRatePct => self.refund_rate_pct,
            RatioMetric::ProcessingCostPct => self.processing_cost_pct,
            RatioMetric::ArOver90Pct | RatioMetric::ApOver90Pct => None,
        }
    }
}

/// Maps raw aggregates to [`DerivedRatios`].
#[derive(Debug, Clone, Copy)]
pub struct RatioCalculator {
    days_per_month: i64,
}

impl RatioCalculator {
    pub fn new(days_per_month: i64) -> Self {
        Self { days_per_month }
    }

    pub fn derive(&self, aggregates: &RawAggregates, period: &ReportPeriod) -> DerivedRatios {
        let get = |key: MetricKey| aggregates.get(key);
        let zero = |key: MetricKey| aggregates.value_or_zero(key);
        let days = period.days_in_period();

        let revenue = get(MetricKey::RevenueCurrent);
        let revenue_previous = get(MetricKey::RevenuePrevious);
        let orders = get(MetricKey::OrdersCountCurrent);
        let orders_previous = get(MetricKey::OrdersCountPrevious);
        let cogs = get(MetricKey::CogsCurrent);
        let opex = get(MetricKey::OperatingExpensesCurrent);
        let purchases = get(MetricKey::PurchasesCurrent);
        let receivable = get(MetricKey::AccountsReceivable);
        let payable = get(MetricKey::AccountsPayable);
        let cash = get(MetricKey::CashBalance);
        let inventory = get(MetricKey::InventoryValue);
        let tax_collected = get(MetricKey::TaxCollectedCurrent);
        let tax_remitted = get(MetricKey::TaxRemittedCurrent);

        let net_tax_liability = zero(MetricKey::TaxCollectedCurrent)
            .checked_sub(zero(MetricKey::TaxRemittedCurrent));
        let current_assets = zero(MetricKey::CashBalance)
            .checked_add(zero(MetricKey::AccountsReceivable))
            .and_then(|sum| sum.checked_add(zero(MetricKey::InventoryValue)));
        let current_liabilities = net_tax_liability
            .and_then(|tax| zero(MetricKey::AccountsPayable).checked_add(tax.max(Decimal::ZERO)));
        let working_capital = current_assets
            .zip(current_liabilities)
            .and_then(|(assets, liabilities)| assets.checked_sub(liabilities));

        let balance_sheet_known = cash.is_some()
            && receivable.is_some()
            && inventory.is_some()
            && payable.is_some()
            && tax_collected.is_some()
            && tax_remitted.is_some();
        let current_ratio = if balance_sheet_known {
            current_assets
                .zip(current_liabilities)
                .and_then(|(assets, liabilities)| ratio(assets, liabilities))
        } else {
            None
        };

        let dso_days = receivable
            .zip(revenue)
            .and_then(|(ar, rev)| days_outstanding(ar, rev, days));
        let dpo_days = payable
            .zip(purchases)
            .and_then(|(ap, bought)| days_outstanding(ap, bought, days));
        let dio_days = inventory
            .zip(cogs)
            .and_then(|(stock, cost)| days_outstanding(stock, cost, days));
        let cash_conversion_cycle_days = match (dso_days, dio_days, dpo_days) {
            (Some(dso), Some(dio), Some(dpo)) => dso.checked_add(dio).and_then(|d| d.checked_sub(dpo)),
            _ => None,
        };

        let burn = revenue
            .zip(cogs)
            .zip(opex)
            .and_then(|((rev, cost), spend)| monthly_burn(rev, cost, spend, days, self.days_per_month));
        let runway = cash.zip(burn).and_then(|(c, b)| runway_months(c, b));
        let runway_unbounded = match burn {
            Some(b) if b < Decimal::ZERO => true,
            Some(b) if b.is_zero() => cash.map_or(false, |c| c > Decimal::ZERO),
            _ => false,
        };

        DerivedRatios {
            gross_profit: zero(MetricKey::RevenueCurrent).checked_sub(zero(MetricKey::CogsCurrent)),
            working_capital,
            current_assets,
            current_liabilities,
            net_tax_liability,
            mom_growth_pct: revenue
                .zip(revenue_previous)
                .and_then(|(c, p)| mom_growth_pct(c, p)),
            orders_growth_pct: orders
                .zip(orders_previous)
                .and_then(|(c, p)| mom_growth_pct(c, p)),
            gross_margin_pct: revenue.zip(cogs).and_then(|(r, c)| gross_margin_pct(r, c)),
            dso_days,
            dpo_days,
            dio_days,
            cash_conversion_cycle_days,
            monthly_burn: burn,
            runway_months: runway,
            average_order_value: revenue.zip(orders).and_then(|(r, n)| ratio(r, n)),
            refund_rate_pct: get(MetricKey::RefundedCount)
                .zip(orders)
                .and_then(|(refunded, n)| ratio_pct(refunded, n)),
            processing_cost_pct: get(MetricKey::ProcessingFeesCurrent)
                .zip(revenue)
                .and_then(|(fees, r)| ratio_pct(fees, r)),
            effective_tax_rate_pct: tax_collected
                .zip(revenue)
                .and_then(|(tax, r)| ratio_pct(tax, r)),
            current_ratio,
            runway_unbounded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mom_growth_example() {
        assert_eq!(mom_growth_pct(dec!(120000), dec!(100000)), Some(dec!(20)));
        assert_eq!(mom_growth_pct(dec!(80000), dec!(100000)), Some(dec!(-20)));
    }

    #[test]
    fn test_mom_growth_zero_previous_is_none() {
        assert_eq!(mom_growth_pct(dec!(5000), Decimal::ZERO), None);
        assert_eq!(mom_growth_pct(Decimal::ZERO, Decimal::ZERO), None);
    }

    #[test]
    fn test_dso_example() {
        assert_eq!(days_outstanding(dec!(15000), dec!(30000), 30), Some(dec!(15)));
        assert_eq!(days_outstanding(dec!(15000), Decimal::ZERO, 30), None);
    }

    #[test]
    fn test_gross_margin() {
        assert_eq!(gross_margin_pct(dec!(100000), dec!(55000)), Some(dec!(45)));
        assert_eq!(gross_margin_pct(Decimal::ZERO, dec!(10)), None);
    }

    #[test]
    fn test_runway_requires_positive_burn() {
        assert_eq!(runway_months(dec!(120000), dec!(10000)), Some(dec!(12)));
        assert_eq!(runway_months(dec!(120000), Decimal::ZERO), None);
        assert_eq!(runway_months(dec!(120000), dec!(-500)), None);
    }

    #[test]
    fn test_monthly_burn_scales_to_month() {
        // 15-day period, spending exceeds revenue by 5,000 -> 10,000 a month.
        assert_eq!(
            monthly_burn(dec!(20000), dec!(15000), dec!(10000), 15, 30),
            Some(dec!(10000))
        );
    }

    fn aggregates_with(entries: &[(MetricKey, Decimal)]) -> RawAggregates {
        let mut values: std::collections::BTreeMap<MetricKey, Decimal> =
            MetricKey::ALL.iter().map(|k| (*k, Decimal::ZERO)).collect();
        values.extend(entries.iter().copied());
        RawAggregates::from_values(values)
    }

    #[test]
    fn test_runway_unbounded_needs_surplus_or_cash() {
        let calculator = RatioCalculator::new(30);
        let period = ReportPeriod::for_month(2026, 9).unwrap();

        let idle_and_empty = calculator.derive(&aggregates_with(&[]), &period);
        assert!(!idle_and_empty.runway_unbounded);
        assert_eq!(idle_and_empty.cash_flow_positive(), Some(true));

        let idle_with_cash =
            calculator.derive(&aggregates_with(&[(MetricKey::CashBalance, dec!(500))]), &period);
        assert!(idle_with_cash.runway_unbounded);

        let surplus =
            calculator.derive(&aggregates_with(&[(MetricKey::RevenueCurrent, dec!(900))]), &period);
        assert!(surplus.runway_unbounded);

        let burning = calculator.derive(
            &aggregates_with(&[
                (MetricKey::OperatingExpensesCurrent, dec!(900)),
                (MetricKey::CashBalance, dec!(500)),
            ]),
            &period,
        );
        assert!(!burning.runway_unbounded);
        assert!(burning.runway_months.is_some());
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(ratio_pct(Decimal::MAX, dec!(0.0001)), None);
    }

    #[test]
    fn test_derive_with_overflowing_balances() {
        let mut values: std::collections::BTreeMap<MetricKey, Decimal> =
            MetricKey::ALL.iter().map(|k| (*k, Decimal::ONE)).collect();
        values.insert(MetricKey::AccountsReceivable, Decimal::MAX);
        values.insert(MetricKey::TaxRemittedCurrent, Decimal::MIN);
        let aggregates = RawAggregates::from_values(values);
        let period = ReportPeriod::for_month(2026, 9).unwrap();

        let ratios = RatioCalculator::new(30).derive(&aggregates, &period);

        assert_eq!(ratios.current_assets, None);
        assert_eq!(ratios.net_tax_liability, None);
        assert_eq!(ratios.current_liabilities, None);
        assert_eq!(ratios.working_capital, None);
        assert_eq!(ratios.current_ratio, None);
        assert_eq!(ratios.gross_profit, Some(Decimal::ZERO));
    }

    #[test]
    fn test_cash_conversion_cycle_overflow_is_none() {
        let mut values: std::collections::BTreeMap<MetricKey, Decimal> =
            MetricKey::ALL.iter().map(|k| (*k, Decimal::ONE)).collect();
        // DSO and DIO each land at three quarters of Decimal::MAX.
        let balance = Decimal::MAX / dec!(40);
        values.insert(MetricKey::AccountsReceivable, balance);
        values.insert(MetricKey::InventoryValue, balance);
        let aggregates = RawAggregates::from_values(values);
        let period = ReportPeriod::for_month(2026, 9).unwrap();

        let ratios = RatioCalculator::new(30).derive(&aggregates, &period);

        assert!(ratios.dso_days.is_some());
        assert!(ratios.dio_days.is_some());
        assert_eq!(ratios.cash_conversion_cycle_days, None);
    }
}
