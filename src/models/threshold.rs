use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Traffic-light classification of a metric.
///
/// Ordered from worst to best so `a < b` means `a` is the worse colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorCode {
    Red,
    Yellow,
    Green,
}

impl ColorCode {
    /// Per-criterion score used by the composite health score.
    pub fn bucket_score(&self) -> Decimal {
        match self {
            ColorCode::Green => Decimal::from(100),
            ColorCode::Yellow => Decimal::from(50),
            ColorCode::Red => Decimal::ZERO,
        }
    }
}

/// Which way a metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Ratio metrics that carry a colour code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioMetric {
    MomGrowthPct,
    GrossMarginPct,
    DsoDays,
    DpoDays,
    DioDays,
    RunwayMonths,
    CurrentRatio,
    AverageOrderValue,
    RefundRatePct,
    ProcessingCostPct,
    ArOver90Pct,
    ApOver90Pct,
}

impl RatioMetric {
    pub const ALL: [RatioMetric; 12] = [
        RatioMetric::MomGrowthPct,
        RatioMetric::GrossMarginPct,
        RatioMetric::DsoDays,
        RatioMetric::DpoDays,
        RatioMetric::DioDays,
        RatioMetric::RunwayMonths,
        RatioMetric::CurrentRatio,
        RatioMetric::AverageOrderValue,
        RatioMetric::RefundRatePct,
        RatioMetric::ProcessingCostPct,
        RatioMetric::ArOver90Pct,
        RatioMetric::ApOver90Pct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RatioMetric::MomGrowthPct => "mom_growth_pct",
            RatioMetric::GrossMarginPct => "gross_margin_pct",
            RatioMetric::DsoDays => "dso_days",
            RatioMetric::DpoDays => "dpo_days",
            RatioMetric::DioDays => "dio_days",
            RatioMetric::RunwayMonths => "runway_months",
            RatioMetric::CurrentRatio => "current_ratio",
            RatioMetric::AverageOrderValue => "average_order_value",
            RatioMetric::RefundRatePct => "refund_rate_pct",
            RatioMetric::ProcessingCostPct => "processing_cost_pct",
            RatioMetric::ArOver90Pct => "ar_over_90_pct",
            RatioMetric::ApOver90Pct => "ap_over_90_pct",
        }
    }
}

impl fmt::Display for RatioMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatioMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        RatioMetric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AppError::NotFound(format!("unknown ratio metric '{}'", s)))
    }
}

/// Three-tier threshold for one metric.
///
/// A value sitting exactly on a boundary takes the better colour:
/// `[green, inf)` / `[yellow, green)` / below for higher-is-better,
/// `(-inf, green]` / `(green, yellow]` / above for lower-is-better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub direction: Direction,
    pub green: Decimal,
    pub yellow: Decimal,
}

impl ThresholdRule {
    pub fn higher_is_better(green: Decimal, yellow: Decimal) -> Self {
        Self {
            direction: Direction::HigherIsBetter,
            green,
            yellow,
        }
    }

    pub fn lower_is_better(green: Decimal, yellow: Decimal) -> Self {
        Self {
            direction: Direction::LowerIsBetter,
            green,
            yellow,
        }
    }

    /// Rejects rules whose yellow band lies on the wrong side of green.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self.direction {
            Direction::HigherIsBetter if self.green < self.yellow => Err(format!(
                "green bound {} must be >= yellow bound {} when higher is better",
                self.green, self.yellow
            )),
            Direction::LowerIsBetter if self.green > self.yellow => Err(format!(
                "green bound {} must be <= yellow bound {} when lower is better",
                self.green, self.yellow
            )),
            _ => Ok(()),
        }
    }

    pub fn classify(&self, value: Decimal) -> ColorCode {
        match self.direction {
            Direction::HigherIsBetter => {
                if value >= self.green {
                    ColorCode::Green
                } else if value >= self.yellow {
                    ColorCode::Yellow
                } else {
                    ColorCode::Red
                }
            }
            Direction::LowerIsBetter => {
                if value <= self.green {
                    ColorCode::Green
                } else if value <= self.yellow {
                    ColorCode::Yellow
                } else {
                    ColorCode::Red
                }
            }
        }
    }
}

/// Editable threshold table keyed by ratio metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    rules: BTreeMap<RatioMetric, ThresholdRule>,
}

impl ThresholdTable {
    /// Builds a table from raw config entries, validating names and bounds.
    pub fn from_entries(entries: &BTreeMap<String, ThresholdRule>) -> Result<Self> {
        let mut rules = BTreeMap::new();
        for (name, rule) in entries {
            let metric: RatioMetric = name
                .parse()
                .map_err(|_| AppError::Config(format!("unknown threshold metric '{}'", name)))?;
            rule.validate()
                .map_err(|msg| AppError::Config(format!("threshold {}: {}", name, msg)))?;
            rules.insert(metric, *rule);
        }
        Ok(Self { rules })
    }

    pub fn get(&self, metric: RatioMetric) -> Option<&ThresholdRule> {
        self.rules.get(&metric)
    }

    pub fn set(&mut self, metric: RatioMetric, rule: ThresholdRule) -> Result<()> {
        rule.validate()
            .map_err(|msg| AppError::Validation(format!("threshold {}: {}", metric, msg)))?;
        self.rules.insert(metric, rule);
        Ok(())
    }

    /// Classifies a value. Metrics without a rule or without a value have
    /// no colour.
    pub fn classify(&self, metric: RatioMetric, value: Option<Decimal>) -> Option<ColorCode> {
        let rule = self.rules.get(&metric)?;
        value.map(|v| rule.classify(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RatioMetric, &ThresholdRule)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<(RatioMetric, ThresholdRule)> for ThresholdTable {
    fn from_iter<I: IntoIterator<Item = (RatioMetric, ThresholdRule)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// Bands used to colour the composite health score itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScoreBands {
    pub green: Decimal,
    pub yellow: Decimal,
}

impl HealthScoreBands {
    /// Both bounds must lie on the 0..=100 scale with green above yellow.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let scale = Decimal::ZERO..=Decimal::ONE_HUNDRED;
        if !scale.contains(&self.green) || !scale.contains(&self.yellow) {
            return Err(format!(
                "health score bands must lie within 0..=100 (green {}, yellow {})",
                self.green, self.yellow
            ));
        }
        ThresholdRule::higher_is_better(self.green, self.yellow).validate()
    }

    pub fn classify(&self, score: Decimal) -> ColorCode {
        ThresholdRule::higher_is_better(self.green, self.yellow).classify(score)
    }
}

impl Default for HealthScoreBands {
    fn default() -> Self {
        Self {
            green: Decimal::from(70),
            yellow: Decimal::from(40),
        }
    }
}
