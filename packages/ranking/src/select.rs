//! Ordering and top-N truncation.

use std::cmp::Ordering;

use zone_rank_ranking_models::RankedZone;

/// Number of zones to keep out of `count` for a `top_percent` request.
///
/// `ceil(count * top_percent / 100)`, with `top_percent` clamped to
/// `[1, 100]` (non-finite means 100).
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn retained_count(count: usize, top_percent: f64) -> usize {
    let pct = if top_percent.is_finite() {
        top_percent.clamp(1.0, 100.0)
    } else {
        100.0
    };
    let kept = (count as f64 * pct / 100.0).ceil() as usize;
    kept.min(count)
}

/// Orders by composite score descending, then zone id ascending.
#[must_use]
pub fn by_score(a: &RankedZone, b: &RankedZone) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then_with(|| a.zone_id.cmp(&b.zone_id))
}

/// Sorts `zones`, keeps the top share, and assigns 1-based ranks.
#[must_use]
pub fn select_top(mut zones: Vec<RankedZone>, top_percent: f64) -> Vec<RankedZone> {
    zones.sort_by(by_score);
    zones.truncate(retained_count(zones.len(), top_percent));
    for (index, zone) in zones.iter_mut().enumerate() {
        zone.rank = index + 1;
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_rank_scoring_models::{CompositionBreakdown, FactorScores};

    fn ranked(id: &str, score: f64) -> RankedZone {
        RankedZone {
            zone_id: id.to_string(),
            rank: 0,
            composite_score: score,
            factor_scores: FactorScores::default(),
            composition: CompositionBreakdown::default(),
            average_rent: None,
            enrichment: None,
        }
    }

    #[test]
    fn keeps_ceiling_of_share() {
        assert_eq!(retained_count(37, 10.0), 4);
        assert_eq!(retained_count(30, 10.0), 3);
        assert_eq!(retained_count(5, 100.0), 5);
        assert_eq!(retained_count(0, 50.0), 0);
    }

    #[test]
    fn clamps_top_percent() {
        assert_eq!(retained_count(250, 0.0), 3);
        assert_eq!(retained_count(10, 400.0), 10);
        assert_eq!(retained_count(10, f64::NAN), 10);
    }

    #[test]
    fn sorts_descending_and_breaks_ties_by_id() {
        let zones = vec![
            ranked("b", 50.0),
            ranked("c", 90.0),
            ranked("a", 50.0),
            ranked("d", 10.0),
        ];
        let top = select_top(zones, 75.0);
        let ids: Vec<_> = top.iter().map(|z| z.zone_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(top[2].rank, 3);
    }
}
