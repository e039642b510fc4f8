use rust_decimal::Decimal;

use crate::models::HealthWeights;
use crate::services::scorecard::Scorecard;

/// Weighted composite of the per-criterion bucket scores, in `[0, 100]`.
///
/// Criteria without a colour are left out and the remaining weights are
/// renormalised. With nothing to score the result is zero. Weights are
/// scaled by the largest one first, so their magnitude cannot overflow the
/// weighted sum.
pub fn composite_score(scorecard: &Scorecard, weights: &HealthWeights) -> Decimal {
    let max_weight = weights
        .iter()
        .map(|(_, w)| *w)
        .max()
        .unwrap_or(Decimal::ZERO);
    if max_weight <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut weighted_sum = Decimal::ZERO;
    let mut weight_total = Decimal::ZERO;

    for (metric, weight) in weights.iter() {
        let Some(color) = scorecard.color(*metric) else {
            continue;
        };
        let Some(scaled) = weight.checked_div(max_weight) else {
            continue;
        };
        weighted_sum += scaled * color.bucket_score();
        weight_total += scaled;
    }

    if weight_total.is_zero() {
        return Decimal::ZERO;
    }

    (weighted_sum / weight_total)
        .round_dp(1)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
