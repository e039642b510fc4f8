use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::PartialFailure;
use crate::models::MetricKey;

/// Outcome of one aggregate query.
pub type MetricOutcome = std::result::Result<Decimal, PartialFailure>;

/// Raw sums and counts produced by the aggregator.
///
/// Always holds an entry for every [`MetricKey`]; a key whose query did not
/// complete is stored as `Err(PartialFailure::Missing)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAggregates {
    outcomes: BTreeMap<MetricKey, MetricOutcome>,
}

impl RawAggregates {
    /// Builds the aggregate set, filling any key absent from `outcomes`.
    pub fn from_outcomes(mut outcomes: BTreeMap<MetricKey, MetricOutcome>) -> Self {
        for metric in MetricKey::ALL {
            outcomes
                .entry(metric)
                .or_insert(Err(PartialFailure::Missing { metric }));
        }
        Self { outcomes }
    }

    /// Convenience constructor for fully successful fetches.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (MetricKey, Decimal)>,
    {
        Self::from_outcomes(values.into_iter().map(|(k, v)| (k, Ok(v))).collect())
    }

    pub fn outcome(&self, key: MetricKey) -> &MetricOutcome {
        // from_outcomes guarantees every key is present.
        &self.outcomes[&key]
    }

    /// The value, or `None` when the query failed.
    pub fn get(&self, key: MetricKey) -> Option<Decimal> {
        self.outcomes.get(&key).and_then(|o| o.as_ref().ok().copied())
    }

    /// The value, or zero when the query failed.
    pub fn value_or_zero(&self, key: MetricKey) -> Decimal {
        self.get(key).unwrap_or(Decimal::ZERO)
    }

    pub fn is_available(&self, key: MetricKey) -> bool {
        self.get(key).is_some()
    }

    pub fn failures(&self) -> Vec<&PartialFailure> {
        self.outcomes
            .values()
            .filter_map(|o| o.as_ref().err())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.values().all(|o| o.is_ok())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
