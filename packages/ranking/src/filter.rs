//! Rent-range filtering.

use std::collections::BTreeSet;

use zone_rank_demographics_models::RangeFilter;
use zone_rank_ranking_models::ZoneRow;

/// Returns `true` if `zone` survives the rent filter.
///
/// Zones with unknown rent and whitelisted zones always pass; everything
/// else must lie inside `range` (inclusive). No range means no filter.
#[must_use]
pub fn passes_rent_filter(
    zone: &ZoneRow,
    range: Option<&RangeFilter>,
    whitelist: &BTreeSet<&str>,
) -> bool {
    let Some(range) = range else {
        return true;
    };
    if whitelist.contains(zone.zone_id.as_str()) {
        return true;
    }
    zone.average_rent.is_none_or(|rent| range.contains(rent))
}

/// Keeps the zones that pass [`passes_rent_filter`].
#[must_use]
pub fn filter_by_rent<'a>(
    zones: &'a [ZoneRow],
    range: Option<&RangeFilter>,
    whitelist: &[String],
) -> Vec<&'a ZoneRow> {
    let whitelist: BTreeSet<&str> = whitelist.iter().map(|id| id.trim()).collect();
    let kept: Vec<_> = zones
        .iter()
        .filter(|zone| passes_rent_filter(zone, range, &whitelist))
        .collect();

    if range.is_some() {
        log::debug!(
            "Rent filter kept {} of {} zones",
            kept.len(),
            zones.len()
        );
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: &str, rent: Option<f64>) -> ZoneRow {
        ZoneRow {
            average_rent: rent,
            ..ZoneRow::new(id)
        }
    }

    #[test]
    fn range_is_inclusive() {
        let zones = [
            zone("1", Some(1000.0)),
            zone("2", Some(2000.0)),
            zone("3", Some(2000.01)),
        ];
        let kept = filter_by_rent(&zones, Some(&RangeFilter::new(1000.0, 2000.0)), &[]);
        let ids: Vec<_> = kept.iter().map(|z| z.zone_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn unknown_rent_and_whitelist_bypass() {
        let zones = [
            zone("1", None),
            zone("2", Some(9000.0)),
            zone("3", Some(9000.0)),
        ];
        let kept = filter_by_rent(
            &zones,
            Some(&RangeFilter::new(500.0, 1500.0)),
            &["2".to_string()],
        );
        let ids: Vec<_> = kept.iter().map(|z| z.zone_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn no_range_keeps_everything() {
        let zones = [zone("1", Some(1.0e6))];
        assert_eq!(filter_by_rent(&zones, None, &[]).len(), 1);
    }
}
