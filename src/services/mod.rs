pub mod aging_service;
pub mod business_health_service;
pub mod health_score;
pub mod loyalty_service;
pub mod metric_aggregator;
pub mod ratio_calculator;
pub mod scorecard;
pub mod scoring_registry;

pub use aging_service::AgingService;
pub use business_health_service::{build_report, BusinessHealthService};
pub use health_score::composite_score;
pub use loyalty_service::LoyaltyService;
pub use metric_aggregator::MetricAggregator;
pub use ratio_calculator::{DerivedRatios, RatioCalculator};
pub use scorecard::Scorecard;
pub use scoring_registry::ScoringRegistry;
