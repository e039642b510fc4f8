use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{
    AgingBuckets, HealthScoreBands, HealthWeights, LoyaltyTier, ScoringConfig, ThresholdRule,
    ThresholdTable, TierTable,
};
use crate::observability::{LogConfig, LogFormat};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub reporting: ReportingSettings,
    pub accounting: AccountingSettings,
    pub scoring: ScoringSettings,
    pub aging: AgingSettings,
    pub loyalty: LoyaltySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub port: u16,
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportingSettings {
    #[validate(range(min = 1, message = "query_timeout_ms must be positive"))]
    pub query_timeout_ms: u64,
    #[validate(range(min = 1, max = 3660, message = "max_period_days must be between 1 and 3660"))]
    pub max_period_days: i64,
    #[validate(range(min = 28, max = 31, message = "days_per_month must be between 28 and 31"))]
    pub days_per_month: i64,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5_000,
            max_period_days: 366,
            days_per_month: 30,
        }
    }
}

/// Chart-of-accounts conventions the ledger queries rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountingSettings {
    pub cogs_account_prefix: String,
    pub expense_account_type: String,
}

impl Default for AccountingSettings {
    fn default() -> Self {
        Self {
            cogs_account_prefix: "5".to_string(),
            expense_account_type: "EXPENSE".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    pub thresholds: BTreeMap<String, ThresholdRule>,
    pub weights: BTreeMap<String, Decimal>,
    pub health_score: HealthScoreBands,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgingSettings {
    pub bucket_days: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoyaltySettings {
    pub point_value: Decimal,
    pub tiers: Vec<LoyaltyTier>,
}

impl Settings {
    pub fn new() -> std::result::Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// Reporting limits, validated.
    pub fn reporting_settings(&self) -> Result<ReportingSettings> {
        self.reporting
            .validate()
            .map_err(|e| AppError::Config(format!("invalid reporting settings: {}", e)))?;
        Ok(self.reporting.clone())
    }

    /// Typed threshold/weight tables, validated.
    pub fn scoring_config(&self) -> Result<ScoringConfig> {
        self.scoring.health_score.validate().map_err(AppError::Config)?;
        Ok(ScoringConfig {
            thresholds: ThresholdTable::from_entries(&self.scoring.thresholds)?,
            weights: HealthWeights::from_entries(&self.scoring.weights)?,
            health_score: self.scoring.health_score,
        })
    }

    pub fn aging_buckets(&self) -> Result<AgingBuckets> {
        AgingBuckets::new(self.aging.bucket_days.clone())
    }

    pub fn tier_table(&self) -> Result<TierTable> {
        TierTable::new(self.loyalty.tiers.clone())
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.application.log_level.clone(),
            format: LogFormat::from(self.application.log_format.as_str()),
            ..LogConfig::default()
        }
    }
}
