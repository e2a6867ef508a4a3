//! Fixed age and household-income bracket tables.
//!
//! Age brackets are five-year bins stored as percentage-of-total columns
//! in the composition table; the top bin is open-ended. Income brackets
//! are household counts in the income table.

use crate::RangeFilter;

/// A fixed, non-overlapping bracket backed by a single data column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// Column identifier holding this bracket's value.
    pub column: &'static str,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound, `None` for the open-ended top bracket.
    pub max: Option<f64>,
}

impl Bracket {
    const fn closed(column: &'static str, min: f64, max: f64) -> Self {
        Self {
            column,
            min,
            max: Some(max),
        }
    }

    const fn open(column: &'static str, min: f64) -> Self {
        Self {
            column,
            min,
            max: None,
        }
    }

    /// Returns `true` if this bracket's range intersects `range`
    /// (inclusive overlap, not containment).
    #[must_use]
    pub fn overlaps(&self, range: &RangeFilter) -> bool {
        self.min <= range.max && self.max.is_none_or(|max| max >= range.min)
    }
}

/// The eighteen age brackets of the composition table.
pub const AGE_BRACKETS: &[Bracket] = &[
    Bracket::closed("age_0_4_pct", 0.0, 4.0),
    Bracket::closed("age_5_9_pct", 5.0, 9.0),
    Bracket::closed("age_10_14_pct", 10.0, 14.0),
    Bracket::closed("age_15_19_pct", 15.0, 19.0),
    Bracket::closed("age_20_24_pct", 20.0, 24.0),
    Bracket::closed("age_25_29_pct", 25.0, 29.0),
    Bracket::closed("age_30_34_pct", 30.0, 34.0),
    Bracket::closed("age_35_39_pct", 35.0, 39.0),
    Bracket::closed("age_40_44_pct", 40.0, 44.0),
    Bracket::closed("age_45_49_pct", 45.0, 49.0),
    Bracket::closed("age_50_54_pct", 50.0, 54.0),
    Bracket::closed("age_55_59_pct", 55.0, 59.0),
    Bracket::closed("age_60_64_pct", 60.0, 64.0),
    Bracket::closed("age_65_69_pct", 65.0, 69.0),
    Bracket::closed("age_70_74_pct", 70.0, 74.0),
    Bracket::closed("age_75_79_pct", 75.0, 79.0),
    Bracket::closed("age_80_84_pct", 80.0, 84.0),
    Bracket::open("age_85_plus_pct", 85.0),
];

/// The ten household-income brackets of the income table, in dollars.
pub const INCOME_BRACKETS: &[Bracket] = &[
    Bracket::closed("income_lt_10k", 0.0, 9_999.0),
    Bracket::closed("income_10k_15k", 10_000.0, 14_999.0),
    Bracket::closed("income_15k_25k", 15_000.0, 24_999.0),
    Bracket::closed("income_25k_35k", 25_000.0, 34_999.0),
    Bracket::closed("income_35k_50k", 35_000.0, 49_999.0),
    Bracket::closed("income_50k_75k", 50_000.0, 74_999.0),
    Bracket::closed("income_75k_100k", 75_000.0, 99_999.0),
    Bracket::closed("income_100k_150k", 100_000.0, 149_999.0),
    Bracket::closed("income_150k_200k", 150_000.0, 199_999.0),
    Bracket::open("income_200k_plus", 200_000.0),
];

/// The age span covered by [`AGE_BRACKETS`]. A requested age range that
/// does not narrow this span is not an active filter.
pub const AGE_SPAN: RangeFilter = RangeFilter {
    min: 0.0,
    max: 85.0,
};

/// The income span covered by [`INCOME_BRACKETS`].
pub const INCOME_SPAN: RangeFilter = RangeFilter {
    min: 0.0,
    max: 200_000.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(brackets: &[Bracket]) {
        for pair in brackets.windows(2) {
            let upper = pair[0].max.expect("only the last bracket is open");
            assert!(
                (pair[1].min - upper - 1.0).abs() < f64::EPSILON,
                "{} and {} are not adjacent",
                pair[0].column,
                pair[1].column
            );
        }
        assert!(brackets.last().is_some_and(|b| b.max.is_none()));
    }

    #[test]
    fn bracket_counts() {
        assert_eq!(AGE_BRACKETS.len(), 18);
        assert_eq!(INCOME_BRACKETS.len(), 10);
    }

    #[test]
    fn brackets_are_contiguous() {
        assert_contiguous(AGE_BRACKETS);
        assert_contiguous(INCOME_BRACKETS);
    }

    #[test]
    fn overlap_is_inclusive() {
        let range = RangeFilter::new(20.0, 29.0);
        let hits: Vec<&str> = AGE_BRACKETS
            .iter()
            .filter(|b| b.overlaps(&range))
            .map(|b| b.column)
            .collect();
        assert_eq!(hits, vec!["age_20_24_pct", "age_25_29_pct"]);

        let partial = RangeFilter::new(22.0, 26.0);
        assert_eq!(
            AGE_BRACKETS.iter().filter(|b| b.overlaps(&partial)).count(),
            2
        );
    }

    #[test]
    fn open_top_bracket_matches_high_ranges() {
        let range = RangeFilter::new(90.0, 120.0);
        let hits: Vec<&str> = AGE_BRACKETS
            .iter()
            .filter(|b| b.overlaps(&range))
            .map(|b| b.column)
            .collect();
        assert_eq!(hits, vec!["age_85_plus_pct"]);
    }
}
