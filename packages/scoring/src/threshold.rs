//! The percentage → score curve shared by every composition sub-factor.

use zone_rank_scoring_models::QualityBand;

/// Maps a match fraction to a score in `[0, 100]`.
///
/// The fraction is clamped to `[0, 1]`; non-finite input scores 0.
#[must_use]
pub fn threshold_score(fraction: f64) -> f64 {
    if !fraction.is_finite() {
        return 0.0;
    }
    let pct = fraction.clamp(0.0, 1.0) * 100.0;

    let score = match QualityBand::for_percent(pct) {
        QualityBand::Excellent => 20.0f64.mul_add((pct - 30.0) / 20.0, 80.0).min(100.0),
        QualityBand::Strong => 9.0f64.mul_add((pct - 25.0) / 5.0, 70.0),
        QualityBand::Good => 9.0f64.mul_add((pct - 20.0) / 5.0, 60.0),
        QualityBand::Average => 9.0f64.mul_add((pct - 15.0) / 5.0, 50.0),
        QualityBand::Weak => 9.0f64.mul_add((pct - 10.0) / 5.0, 40.0),
        QualityBand::Poor => 19.0f64.mul_add((pct - 5.0) / 5.0, 20.0),
        QualityBand::VeryPoor => (pct / 5.0 * 19.0).max(0.0),
    };

    score.clamp(0.0, 100.0)
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
    fn boundary_values() {
        assert_close(threshold_score(0.0), 0.0);
        assert_close(threshold_score(0.05), 20.0);
        assert_close(threshold_score(0.10), 40.0);
        assert_close(threshold_score(0.15), 50.0);
        assert_close(threshold_score(0.20), 60.0);
        assert_close(threshold_score(0.25), 70.0);
        assert_close(threshold_score(0.30), 80.0);
        assert_close(threshold_score(0.50), 100.0);
        assert_close(threshold_score(1.0), 100.0);
    }

    #[test]
    fn interior_points() {
        assert_close(threshold_score(0.025), 9.5);
        assert_close(threshold_score(0.075), 29.5);
        assert_close(threshold_score(0.40), 90.0);
    }

    #[test]
    fn non_decreasing_over_unit_interval() {
        let mut previous = threshold_score(0.0);
        for step in 1..=1000 {
            let score = threshold_score(f64::from(step) / 1000.0);
            assert!(score >= previous, "score dropped at step {step}");
            assert!((0.0..=100.0).contains(&score));
            previous = score;
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_close(threshold_score(-0.3), 0.0);
        assert_close(threshold_score(3.0), 100.0);
        assert_close(threshold_score(f64::NAN), 0.0);
        assert_close(threshold_score(f64::INFINITY), 0.0);
    }
}
