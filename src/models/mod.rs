pub mod aggregates;
pub mod aging;
pub mod loyalty;
pub mod metric_key;
pub mod period;
pub mod report;
pub mod scoring;
pub mod threshold;

pub use aggregates::{MetricOutcome, RawAggregates};
pub use aging::{AgingBucket, AgingBuckets, AgingOutcome, AgingReport, AgingSide, AgingSummary, OpenItem};
pub use loyalty::{
    LoyaltyAccount, LoyaltyReport, LoyaltyTier, RankedAccount, TierSummary, TierTable, TierTotals,
};
pub use metric_key::MetricKey;
pub use period::ReportPeriod;
pub use report::{
    ArApSection, BusinessHealthReport, CashSection, ClassifiedMetric, InventorySection,
    OrdersSection, ProcessingCostsSection, RevenueSection, SectionOutcome, TaxSection,
    WorkingCapitalSection,
};
pub use scoring::{HealthWeights, ScoringConfig};
pub use threshold::{ColorCode, Direction, HealthScoreBands, RatioMetric, ThresholdRule, ThresholdTable};
