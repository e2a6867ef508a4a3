//! Picking pedestrian values for the requested time-of-day periods.
//!
//! The data carries one column per period plus precomputed combinations
//! (all three periods, and each pair). A request for a set of periods reads
//! the matching combined column when it exists and otherwise averages the
//! per-period columns that are present.

use std::collections::BTreeSet;

use zone_rank_demographics_models::SparseRow;
use zone_rank_ranking_models::{TimePeriod, ZoneRow};

/// Key of the precomputed all-periods column.
pub const ALL_PERIODS_KEY: &str = "all";

/// A non-empty set of requested periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSelection {
    periods: BTreeSet<TimePeriod>,
}

impl PeriodSelection {
    /// Builds a selection; an empty request means every period.
    #[must_use]
    pub fn new(periods: &[TimePeriod]) -> Self {
        let mut periods: BTreeSet<_> = periods.iter().copied().collect();
        if periods.is_empty() {
            periods.extend(TimePeriod::ALL);
        }
        Self { periods }
    }

    /// Returns `true` if every period is selected.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.periods.len() == TimePeriod::ALL.len()
    }

    /// Selected periods in chronological order.
    pub fn periods(&self) -> impl Iterator<Item = TimePeriod> + '_ {
        self.periods.iter().copied()
    }

    /// Column key of the combination: `all`, a pair such as
    /// `morning_evening`, or a single period name.
    #[must_use]
    pub fn key(&self) -> String {
        if self.is_all() {
            return ALL_PERIODS_KEY.to_string();
        }
        self.periods
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Reads the selection's value from `row`.
    ///
    /// Tries `{prefix}_{key}{suffix}` first, then the mean of the
    /// `{prefix}_{period}{suffix}` columns that hold a value. `None` if
    /// neither exists.
    #[must_use]
    pub fn value_in(&self, row: &SparseRow, prefix: &str, suffix: &str) -> Option<f64> {
        if let Some(value) = row.get(&format!("{prefix}_{}{suffix}", self.key())) {
            return Some(value);
        }

        let values: Vec<f64> = self
            .periods
            .iter()
            .filter_map(|period| row.get(&format!("{prefix}_{period}{suffix}")))
            .collect();
        if values.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(mean)
    }

    /// The zone's raw pedestrian value for this selection.
    ///
    /// The base `pedestrian` column already covers every period; narrower
    /// selections read the zone's period columns and fall back to the base
    /// value when none exist.
    #[must_use]
    pub fn pedestrian_value(&self, zone: &ZoneRow) -> f64 {
        if self.is_all() {
            return zone.pedestrian;
        }
        self.value_in(&zone.extra, "pedestrian", "")
            .unwrap_or(zone.pedestrian)
    }
}

impl Default for PeriodSelection {
    fn default() -> Self {
        Self::new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        assert_eq!(PeriodSelection::new(&[]).key(), "all");
        assert_eq!(
            PeriodSelection::new(&[TimePeriod::Evening, TimePeriod::Morning]).key(),
            "morning_evening"
        );
        assert_eq!(
            PeriodSelection::new(&[TimePeriod::Afternoon, TimePeriod::Afternoon]).key(),
            "afternoon"
        );
        assert!(PeriodSelection::new(&TimePeriod::ALL).is_all());
    }

    #[test]
    fn prefers_combined_column() {
        let row = SparseRow::new()
            .with("ped_morning_evening_2020", 42.0)
            .with("ped_morning_2020", 10.0)
            .with("ped_evening_2020", 20.0);
        let selection = PeriodSelection::new(&[TimePeriod::Morning, TimePeriod::Evening]);
        assert_eq!(selection.value_in(&row, "ped", "_2020"), Some(42.0));
    }

    #[test]
    fn averages_periods_without_combined_column() {
        let row = SparseRow::new()
            .with("ped_morning_pred_2026", 10.0)
            .with("ped_afternoon_pred_2026", 30.0);
        let selection = PeriodSelection::new(&[]);
        assert_eq!(selection.value_in(&row, "ped", "_pred_2026"), Some(20.0));
        assert_eq!(selection.value_in(&row, "ped", "_2026"), None);
    }

    #[test]
    fn pedestrian_value_falls_back_to_base() {
        let mut zone = ZoneRow::new("1");
        zone.pedestrian = 4.0;
        zone.extra.insert("pedestrian_morning", Some(2.0));

        let morning = PeriodSelection::new(&[TimePeriod::Morning]);
        assert!((morning.pedestrian_value(&zone) - 2.0).abs() < f64::EPSILON);

        let evening = PeriodSelection::new(&[TimePeriod::Evening]);
        assert!((evening.pedestrian_value(&zone) - 4.0).abs() < f64::EPSILON);

        assert!((PeriodSelection::default().pedestrian_value(&zone) - 4.0).abs() < f64::EPSILON);
    }
}
