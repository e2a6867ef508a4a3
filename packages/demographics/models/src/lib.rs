#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population composition types shared by the demographic engine.
//!
//! The ethnicity, age/gender composition, and household-income tables all
//! arrive as [`DemographicRow`]s: a zone identifier plus a sparse set of
//! named numeric columns. This crate also carries the fixed bracket tables
//! and the lenient numeric coercion used at the row boundary.

pub mod brackets;
pub mod row;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use row::SparseRow;

/// Column holding a zone's total population in the ethnicity and
/// composition tables.
pub const TOTAL_POPULATION: &str = "total_population";

/// A row from one of the population composition tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicRow {
    /// Zone identifier (fixed-length numeric code).
    #[serde(alias = "zone_id", deserialize_with = "row::lenient_string")]
    pub zone_id: String,
    /// Every other column of the row.
    #[serde(flatten)]
    pub values: SparseRow,
}

impl DemographicRow {
    /// Creates a row for `zone_id` with the given columns.
    #[must_use]
    pub fn new(zone_id: impl Into<String>, values: SparseRow) -> Self {
        Self {
            zone_id: zone_id.into(),
            values,
        }
    }
}

/// Gender selection for the composition filter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
    /// Male residents.
    Male,
    /// Female residents.
    Female,
}

impl Gender {
    /// Composition-table column holding this gender's percentage of the
    /// total population.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Male => "male_pct",
            Self::Female => "female_pct",
        }
    }
}

/// One column of the ethnicity hierarchy, deserialized from the catalog
/// TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    /// Raw data-column identifier (e.g. `"AEAKrn"`).
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Parent column whose value aggregates this one, `None` for roots.
    #[serde(default)]
    pub parent: Option<String>,
}

/// A human-readable category name and the columns it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    /// Category name as callers type it (e.g. `"asian"`).
    pub name: String,
    /// Columns the name resolves to.
    pub columns: Vec<String>,
}

/// The on-disk shape of a category catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Catalog format version.
    #[serde(default)]
    pub version: Option<u32>,
    /// Column hierarchy.
    #[serde(default)]
    pub columns: Vec<CatalogColumn>,
    /// Name → column-set table.
    #[serde(default)]
    pub categories: Vec<CatalogCategory>,
}

/// The population-composition part of a ranking request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionFilter {
    /// Ethnicity category tokens (names or raw column identifiers).
    #[serde(default)]
    pub categories: Vec<String>,
    /// Requested genders.
    #[serde(default)]
    pub genders: Vec<Gender>,
    /// Requested age range in years.
    #[serde(default)]
    pub age_range: Option<RangeFilter>,
    /// Requested household-income range in dollars.
    #[serde(default)]
    pub income_range: Option<RangeFilter>,
}

impl CompositionFilter {
    /// Returns `true` if at least one non-blank category token was given.
    #[must_use]
    pub fn wants_ethnicity(&self) -> bool {
        self.categories.iter().any(|c| !c.trim().is_empty())
    }

    /// Returns `true` if any gender was selected.
    #[must_use]
    pub fn wants_gender(&self) -> bool {
        !self.genders.is_empty()
    }

    /// The requested age range, if it actually narrows the bracket span.
    #[must_use]
    pub fn active_age_range(&self) -> Option<RangeFilter> {
        self.age_range
            .map(|r| RangeFilter::new(r.min, r.max))
            .filter(|r| r.narrows(&brackets::AGE_SPAN))
    }

    /// The requested income range, if it actually narrows the bracket span.
    #[must_use]
    pub fn active_income_range(&self) -> Option<RangeFilter> {
        self.income_range
            .map(|r| RangeFilter::new(r.min, r.max))
            .filter(|r| r.narrows(&brackets::INCOME_SPAN))
    }

    /// Returns `true` if any composition factor is requested.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.wants_ethnicity()
            || self.wants_gender()
            || self.active_age_range().is_some()
            || self.active_income_range().is_some()
    }
}

/// An inclusive numeric range requested by the caller (ages in years,
/// incomes or rents in dollars).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl RangeFilter {
    /// Creates a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// Returns `true` if `value` lies within the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        let range = Self::new(self.min, self.max);
        value >= range.min && value <= range.max
    }

    /// Returns `true` if this range excludes part of `span`, i.e. it is an
    /// actual filter rather than a restatement of the whole domain.
    #[must_use]
    pub fn narrows(&self, span: &Self) -> bool {
        let range = Self::new(self.min, self.max);
        range.min > span.min || range.max < span.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn range_normalizes_reversed_bounds() {
        let range = RangeFilter::new(30.0, 20.0);
        assert!((range.min - 20.0).abs() < f64::EPSILON);
        assert!(range.contains(25.0));
    }

    #[test]
    fn full_span_does_not_narrow() {
        let span = RangeFilter::new(0.0, 85.0);
        assert!(!RangeFilter::new(0.0, 100.0).narrows(&span));
        assert!(RangeFilter::new(18.0, 100.0).narrows(&span));
        assert!(RangeFilter::new(0.0, 64.0).narrows(&span));
    }

    #[test]
    fn default_filter_is_inactive() {
        let mut filter = CompositionFilter {
            categories: vec!["  ".to_string()],
            age_range: Some(RangeFilter::new(0.0, 120.0)),
            income_range: Some(RangeFilter::new(0.0, 250_000.0)),
            ..CompositionFilter::default()
        };
        assert!(!filter.is_active());

        filter.income_range = Some(RangeFilter::new(50_000.0, 250_000.0));
        assert!(filter.is_active());
        assert!(filter.active_age_range().is_none());
    }

    #[test]
    fn demographic_row_flattens_columns() {
        let row: DemographicRow = serde_json::from_value(json!({
            "zone_id": "360610001",
            "total_population": 5000,
            "AEAKrn": "500",
        }))
        .unwrap();
        assert_eq!(row.zone_id, "360610001");
        assert_eq!(row.values.get("AEAKrn"), Some(500.0));
        assert!(!row.values.contains("zone_id"));
    }

    #[test]
    fn numeric_zone_ids_are_stringified() {
        let row: DemographicRow =
            serde_json::from_value(json!({ "zoneId": 11001, "total_population": 10 })).unwrap();
        assert_eq!(row.zone_id, "11001");
    }
}
