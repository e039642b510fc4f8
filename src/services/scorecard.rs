use std::collections::BTreeMap;

use crate::models::{ClassifiedMetric, ColorCode, RatioMetric, ThresholdTable};
use crate::services::ratio_calculator::DerivedRatios;

/// Classified ratios of one report, keyed by metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scorecard {
    entries: BTreeMap<RatioMetric, ClassifiedMetric>,
}

impl Scorecard {
    /// Classifies every ratio the report computes against `thresholds`.
    pub fn classify(ratios: &DerivedRatios, thresholds: &ThresholdTable) -> Self {
        let mut entries = BTreeMap::new();
        for metric in RatioMetric::ALL {
            let value = ratios.value(metric);
            let mut color_code = thresholds.classify(metric, value);

            if metric == RatioMetric::RunwayMonths
                && ratios.runway_unbounded
                && thresholds.get(metric).is_some()
            {
                color_code = Some(ColorCode::Green);
            }

            entries.insert(metric, ClassifiedMetric::new(value, color_code));
        }
        Self { entries }
    }

    pub fn insert(&mut self, metric: RatioMetric, classified: ClassifiedMetric) {
        self.entries.insert(metric, classified);
    }

    pub fn get(&self, metric: RatioMetric) -> ClassifiedMetric {
        self.entries
            .get(&metric)
            .copied()
            .unwrap_or_else(ClassifiedMetric::not_applicable)
    }

    pub fn color(&self, metric: RatioMetric) -> Option<ColorCode> {
        self.entries.get(&metric).and_then(|c| c.color_code)
    }
}
