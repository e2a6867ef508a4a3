//! Builds the per-request [`WeightSet`] from caller input.
//!
//! Three steps, in order: overlay caller percentages on the defaults,
//! move an unusable composition weight onto the independent factors, then
//! normalize so the weights sum to 1.

use zone_rank_scoring_models::{FactorKey, WeightInput, WeightSet};

/// The weights a request will be scored with, and how they were derived.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightPlan {
    /// Final weights (sum to 1, or all zero).
    pub weights: WeightSet,
    /// Caller weight keys that did not name a factor.
    pub unknown_keys: Vec<String>,
    /// Whether a composition weight was redistributed.
    pub redistributed: bool,
}

/// Overlays caller percentages on the default weights.
///
/// Each recognized key replaces its default with `percent / 100`. Unknown
/// keys and non-finite percentages are skipped; percentages are clamped to
/// `[0, 100]`. Later entries for the same key win.
///
/// Returns the weights and the unknown keys.
#[must_use]
pub fn caller_weights(inputs: &[WeightInput]) -> (WeightSet, Vec<String>) {
    let mut weights = WeightSet::defaults();
    let mut unknown = vec![];

    for input in inputs {
        let Ok(key) = input.factor.trim().parse::<FactorKey>() else {
            log::warn!("Ignoring weight for unknown factor '{}'", input.factor);
            unknown.push(input.factor.clone());
            continue;
        };
        if !input.percent.is_finite() {
            log::warn!(
                "Ignoring non-finite weight {} for factor {key}",
                input.percent
            );
            continue;
        }
        weights.set(key, input.percent.clamp(0.0, 100.0) / 100.0);
    }

    (weights, unknown)
}

/// Moves the composition weight onto the five independent factors.
///
/// The composition weight is split proportionally to the factors' current
/// weights, or equally when they are all zero. Returns `false` (and leaves
/// `weights` untouched) when there is no composition weight to move.
pub fn redistribute_composition(weights: &mut WeightSet) -> bool {
    let moved = weights.get(FactorKey::Composition);
    if moved <= 0.0 {
        return false;
    }

    let base = weights.independent_total();
    #[allow(clippy::cast_precision_loss)]
    let equal_share = moved / FactorKey::INDEPENDENT.len() as f64;

    for key in FactorKey::INDEPENDENT {
        let current = weights.get(key);
        let share = if base > 0.0 {
            moved * current / base
        } else {
            equal_share
        };
        weights.set(key, current + share);
    }
    weights.set(FactorKey::Composition, 0.0);

    true
}

/// Scales `weights` to sum to 1. All-zero weights are left as they are.
pub fn normalize(weights: &mut WeightSet) {
    let total = weights.total();
    if total <= 0.0 || (total - 1.0).abs() < f64::EPSILON {
        return;
    }
    let keys: Vec<_> = weights.iter().map(|(k, _)| k).collect();
    for key in keys {
        weights.set(key, weights.get(key) / total);
    }
}

/// Derives the request's weights.
///
/// `composition_active` says whether any composition filter (category,
/// gender, narrowed age or income range) was supplied; without one the
/// composition weight cannot be scored and is redistributed.
#[must_use]
pub fn plan_weights(inputs: &[WeightInput], composition_active: bool) -> WeightPlan {
    let (mut weights, unknown_keys) = caller_weights(inputs);

    let redistributed = !composition_active && redistribute_composition(&mut weights);
    if redistributed {
        log::debug!("No composition filter active, redistributed composition weight");
    }

    normalize(&mut weights);

    if weights.total() <= 0.0 {
        log::warn!("All factor weights are zero, every composite score will be 0");
    }

    WeightPlan {
        weights,
        unknown_keys,
        redistributed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn defaults_without_composition_filter_keep_composition_at_zero() {
        let plan = plan_weights(&[], false);
        assert!(!plan.redistributed);
        assert_close(plan.weights.get(FactorKey::Composition), 0.0);
        assert_close(plan.weights.independent_total(), 1.0);
        assert_close(plan.weights.get(FactorKey::Pedestrian), 0.45);
    }

    #[test]
    fn composition_weight_is_redistributed_proportionally() {
        let plan = plan_weights(&[WeightInput::new("composition", 20.0)], false);
        assert!(plan.redistributed);
        assert_close(plan.weights.get(FactorKey::Composition), 0.0);
        assert_close(plan.weights.total(), 1.0);
        // 0.45 of 1.0 before the move, 0.45 + 0.2 * 0.45 = 0.54 after,
        // then normalized by 1.2.
        assert_close(plan.weights.get(FactorKey::Pedestrian), 0.45);
        assert_close(plan.weights.get(FactorKey::Rent), 0.10);
    }

    #[test]
    fn all_zero_independent_weights_split_equally() {
        let inputs = [
            WeightInput::new("pedestrian", 0.0),
            WeightInput::new("incident", 0.0),
            WeightInput::new("flood", 0.0),
            WeightInput::new("rent", 0.0),
            WeightInput::new("poi", 0.0),
            WeightInput::new("composition", 50.0),
        ];
        let plan = plan_weights(&inputs, false);
        assert!(plan.redistributed);
        for key in FactorKey::INDEPENDENT {
            assert_close(plan.weights.get(key), 0.2);
        }
        assert_close(plan.weights.get(FactorKey::Composition), 0.0);
    }

    #[test]
    fn active_composition_keeps_its_weight() {
        let inputs = [
            WeightInput::new("pedestrian", 0.0),
            WeightInput::new("incident", 0.0),
            WeightInput::new("flood", 0.0),
            WeightInput::new("rent", 0.0),
            WeightInput::new("poi", 0.0),
            WeightInput::new("composition", 100.0),
        ];
        let plan = plan_weights(&inputs, true);
        assert!(!plan.redistributed);
        assert_close(plan.weights.get(FactorKey::Composition), 1.0);
    }

    #[test]
    fn caller_weights_are_renormalized() {
        let inputs = [
            WeightInput::new("pedestrian", 50.0),
            WeightInput::new("incident", 50.0),
            WeightInput::new("flood", 50.0),
            WeightInput::new("rent", 50.0),
            WeightInput::new("poi", 0.0),
        ];
        let plan = plan_weights(&inputs, false);
        assert_close(plan.weights.total(), 1.0);
        assert_close(plan.weights.get(FactorKey::Flood), 0.25);
    }

    #[test]
    fn unknown_and_invalid_inputs_are_skipped() {
        let inputs = [
            WeightInput::new("weather", 40.0),
            WeightInput::new("rent", f64::NAN),
            WeightInput::new("flood", 250.0),
        ];
        let (weights, unknown) = caller_weights(&inputs);
        assert_eq!(unknown, vec!["weather".to_string()]);
        assert_close(weights.get(FactorKey::Rent), 0.10);
        assert_close(weights.get(FactorKey::Flood), 1.0);
    }

    #[test]
    fn all_zero_weights_stay_zero() {
        let inputs: Vec<_> = FactorKey::ALL
            .iter()
            .map(|k| WeightInput::new(k.to_string(), 0.0))
            .collect();
        let plan = plan_weights(&inputs, false);
        assert_close(plan.weights.total(), 0.0);
    }
}
