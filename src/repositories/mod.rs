pub mod aging_repository;
pub mod loyalty_repository;
pub mod metric_repository;

pub use aging_repository::{AgingRepository, OpenItemSource};
pub use loyalty_repository::{LoyaltyRepository, LoyaltySource};
pub use metric_repository::{MetricRepository, MetricSource};
