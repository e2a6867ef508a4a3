//! Per-factor and composite zone scores.

use zone_rank_scoring_models::{
    CompositionBreakdown, CompositionWeights, FactorKey, FactorScores, ScoringConfig,
    SubFactorScore, WeightSet,
};

use crate::threshold::threshold_score;

/// Scores a raw independent-factor value on the configured raw scale.
///
/// `raw / raw_scale_max * 100`, clamped to `[0, 100]`. Non-finite values
/// and a non-positive scale score 0.
#[must_use]
pub fn factor_score(raw: f64, config: &ScoringConfig) -> f64 {
    if !raw.is_finite() || !config.raw_scale_max.is_finite() || config.raw_scale_max <= 0.0 {
        return 0.0;
    }
    (raw / config.raw_scale_max * 100.0).clamp(0.0, 100.0)
}

/// Threshold-scores one composition sub-factor.
#[must_use]
pub fn sub_factor(fraction: f64) -> SubFactorScore {
    SubFactorScore {
        fraction,
        score: threshold_score(fraction),
    }
}

/// Blends the sub-factor scores present in `breakdown`.
///
/// With `advanced` weights the result is the weighted mean over the present
/// sub-factors, normalized by the weights that are present; if those sum to
/// zero the plain mean is used instead. Without `advanced` weights it is the
/// plain mean. Returns `None` when no sub-factor is present.
#[must_use]
pub fn composition_score(
    breakdown: &CompositionBreakdown,
    advanced: Option<&CompositionWeights>,
) -> Option<f64> {
    let weights = advanced.copied().unwrap_or_default();
    let present: Vec<(f64, f64)> = [
        (breakdown.ethnicity, weights.ethnicity),
        (breakdown.gender, weights.gender),
        (breakdown.age, weights.age),
        (breakdown.income, weights.income),
    ]
    .into_iter()
    .filter_map(|(sub, weight)| {
        sub.map(|s| {
            let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
            (s.score, weight)
        })
    })
    .collect();

    if present.is_empty() {
        return None;
    }

    if advanced.is_some() {
        let total_weight: f64 = present.iter().map(|(_, w)| w).sum();
        if total_weight > 0.0 {
            let weighted: f64 = present.iter().map(|(score, w)| score * w).sum();
            return Some((weighted / total_weight).clamp(0.0, 100.0));
        }
        log::debug!(
            "Advanced composition weights are zero for the present factors, using the mean"
        );
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = present.iter().map(|(score, _)| score).sum::<f64>() / present.len() as f64;
    Some(mean.clamp(0.0, 100.0))
}

/// Weighted sum of a zone's factor scores, clamped to `[0, 100]`.
#[must_use]
pub fn composite_score(weights: &WeightSet, scores: &FactorScores) -> f64 {
    let total: f64 = FactorKey::ALL
        .iter()
        .map(|key| weights.get(*key) * scores.get(*key))
        .sum();
    if total.is_finite() {
        total.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
