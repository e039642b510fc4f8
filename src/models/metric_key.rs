use serde::{Deserialize, Serialize};
use std::fmt;

/// Named raw aggregate fetched by the metric aggregator.
///
/// `_current` keys cover the report period, `_previous` keys the comparison
/// period. Balance keys are snapshots:
/// - `inventory_value` replays stock movements up to the period end.
/// - `accounts_receivable` / `accounts_payable` take documents issued by the
///   period end at their balance and status as of the query, since payments
///   carry no history.
/// - `cash_balance` is the live balance of active bank accounts, whatever
///   the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    RevenueCurrent,
    RevenuePrevious,
    OrdersCountCurrent,
    OrdersCountPrevious,
    RefundedCount,
    RefundedAmount,
    CogsCurrent,
    OperatingExpensesCurrent,
    PurchasesCurrent,
    AccountsReceivable,
    AccountsPayable,
    CashBalance,
    InventoryValue,
    ProcessingFeesCurrent,
    TaxCollectedCurrent,
    TaxRemittedCurrent,
}

impl MetricKey {
    pub const ALL: [MetricKey; 16] = [
        MetricKey::RevenueCurrent,
        MetricKey::RevenuePrevious,
        MetricKey::OrdersCountCurrent,
        MetricKey::OrdersCountPrevious,
        MetricKey::RefundedCount,
        MetricKey::RefundedAmount,
        MetricKey::CogsCurrent,
        MetricKey::OperatingExpensesCurrent,
        MetricKey::PurchasesCurrent,
        MetricKey::AccountsReceivable,
        MetricKey::AccountsPayable,
        MetricKey::CashBalance,
        MetricKey::InventoryValue,
        MetricKey::ProcessingFeesCurrent,
        MetricKey::TaxCollectedCurrent,
        MetricKey::TaxRemittedCurrent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::RevenueCurrent => "revenue_current",
            MetricKey::RevenuePrevious => "revenue_previous",
            MetricKey::OrdersCountCurrent => "orders_count_current",
            MetricKey::OrdersCountPrevious => "orders_count_previous",
            MetricKey::RefundedCount => "refunded_count",
            MetricKey::RefundedAmount => "refunded_amount",
            MetricKey::CogsCurrent => "cogs_current",
            MetricKey::OperatingExpensesCurrent => "operating_expenses_current",
            MetricKey::PurchasesCurrent => "purchases_current",
            MetricKey::AccountsReceivable => "accounts_receivable",
            MetricKey::AccountsPayable => "accounts_payable",
            MetricKey::CashBalance => "cash_balance",
            MetricKey::InventoryValue => "inventory_value",
            MetricKey::ProcessingFeesCurrent => "processing_fees_current",
            MetricKey::TaxCollectedCurrent => "tax_collected_current",
            MetricKey::TaxRemittedCurrent => "tax_remitted_current",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_keys_are_unique() {
        let names: HashSet<&str> = MetricKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), MetricKey::ALL.len());
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        for key in MetricKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }
}
