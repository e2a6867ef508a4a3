#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and result types for ranking zones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use zone_rank_demographics_models::row::{lenient_f64, lenient_opt_f64, lenient_string};
use zone_rank_demographics_models::{CompositionFilter, Gender, RangeFilter, SparseRow};
use zone_rank_scoring_models::{
    CompositionBreakdown, CompositionWeights, FactorScores, WeightInput,
};

/// One row of the zone table.
///
/// Factor values sit on a small raw scale (higher is better). Any column
/// other than the named fields, such as the per-period pedestrian values,
/// lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRow {
    /// Zone identifier (fixed-length numeric code).
    #[serde(alias = "zone_id", deserialize_with = "lenient_string")]
    pub zone_id: String,
    /// Pedestrian activity.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pedestrian: f64,
    /// Incident level.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub incident: f64,
    /// Flood exposure.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub flood: f64,
    /// Rent.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rent: f64,
    /// Points-of-interest density.
    #[serde(default, alias = "point_of_interest", deserialize_with = "lenient_f64")]
    pub poi: f64,
    /// Average monthly rent in dollars, `None` when unknown.
    #[serde(default, alias = "average_rent", deserialize_with = "lenient_opt_f64")]
    pub average_rent: Option<f64>,
    /// Remaining numeric columns.
    #[serde(flatten)]
    pub extra: SparseRow,
}

impl ZoneRow {
    /// Creates a zone row with every factor at zero.
    #[must_use]
    pub fn new(zone_id: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            ..Self::default()
        }
    }
}

/// A time-of-day period of the pedestrian series.
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
pub enum TimePeriod {
    /// Morning.
    Morning,
    /// Afternoon.
    Afternoon,
    /// Evening.
    Evening,
}

impl TimePeriod {
    /// All periods, in chronological order.
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Evening];
}

/// The tables a ranking request reads.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FactorTable {
    /// Zone table.
    Zones,
    /// Ethnicity counts.
    Ethnicity,
    /// Age and gender composition.
    Composition,
    /// Household income brackets.
    Income,
    /// Per-year incident history and predictions.
    IncidentDetail,
    /// Per-year, per-period pedestrian history and predictions.
    PedestrianDetail,
}

const fn default_top_percent() -> f64 {
    100.0
}

/// A ranking request, already validated upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    /// Factor weights in percent; missing factors keep their defaults.
    #[serde(default)]
    pub weights: Vec<WeightInput>,
    /// Ethnicity category tokens.
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
    /// Acceptable average rent in dollars.
    #[serde(default)]
    pub rent_range: Option<RangeFilter>,
    /// Zones that bypass the rent filter.
    #[serde(default)]
    pub rent_whitelist: Vec<String>,
    /// Share of the ranked zones to return, in percent (1–100).
    #[serde(default = "default_top_percent")]
    pub top_percent: f64,
    /// Advanced blend of the composition sub-factors.
    #[serde(default)]
    pub composition_weights: Option<CompositionWeights>,
    /// Pedestrian periods to score; empty means all of them.
    #[serde(default)]
    pub periods: Vec<TimePeriod>,
}

impl Default for RankRequest {
    fn default() -> Self {
        Self {
            weights: vec![],
            categories: vec![],
            genders: vec![],
            age_range: None,
            income_range: None,
            rent_range: None,
            rent_whitelist: vec![],
            top_percent: default_top_percent(),
            composition_weights: None,
            periods: vec![],
        }
    }
}

impl RankRequest {
    /// The population-composition part of the request.
    #[must_use]
    pub fn composition_filter(&self) -> CompositionFilter {
        CompositionFilter {
            categories: self.categories.clone(),
            genders: self.genders.clone(),
            age_range: self.age_range,
            income_range: self.income_range,
        }
    }
}

/// Year-keyed series attached to a retained zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEnrichment {
    /// Historical incident counts by year.
    pub incident_history: BTreeMap<u16, f64>,
    /// Predicted incident counts by year.
    pub incident_prediction: BTreeMap<u16, f64>,
    /// Historical pedestrian activity by year, for the requested periods.
    pub pedestrian_history: BTreeMap<u16, f64>,
    /// Predicted pedestrian activity by year, for the requested periods.
    pub pedestrian_prediction: BTreeMap<u16, f64>,
}

impl ZoneEnrichment {
    /// Returns `true` if no series has any point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incident_history.is_empty()
            && self.incident_prediction.is_empty()
            && self.pedestrian_history.is_empty()
            && self.pedestrian_prediction.is_empty()
    }
}

/// A zone in the ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedZone {
    /// Zone identifier.
    pub zone_id: String,
    /// 1-based position in the ranking.
    pub rank: usize,
    /// Composite score in `[0, 100]`.
    pub composite_score: f64,
    /// Per-factor scores that produced the composite.
    pub factor_scores: FactorScores,
    /// Composition sub-factor fractions and scores.
    pub composition: CompositionBreakdown,
    /// Average rent, if known.
    pub average_rent: Option<f64>,
    /// Time series, attached after ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<ZoneEnrichment>,
}

/// Non-fatal anomalies observed while ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Category tokens that resolved to nothing.
    pub unresolved_categories: Vec<String>,
    /// Weight keys that named no factor.
    pub unknown_weight_keys: Vec<String>,
    /// Tables that could not be read.
    pub missing_tables: Vec<FactorTable>,
    /// Zones whose ethnicity counts exceeded their population, with the
    /// raw ratio.
    pub overcounted_zones: BTreeMap<String, f64>,
    /// Whether the composition weight was moved to the other factors.
    pub redistributed_composition: bool,
    /// Zones in the zone table.
    pub zone_count: usize,
    /// Zones left after the rent filter.
    pub candidate_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zone_rows_are_lenient() {
        let row: ZoneRow = serde_json::from_value(json!({
            "zone_id": 360_610_001,
            "pedestrian": "4.5",
            "incident": null,
            "flood": "n/a",
            "average_rent": "2,450",
            "pedestrian_morning": 3.5,
        }))
        .unwrap();
        assert_eq!(row.zone_id, "360610001");
        assert!((row.pedestrian - 4.5).abs() < f64::EPSILON);
        assert!(row.incident.abs() < f64::EPSILON);
        assert!(row.flood.abs() < f64::EPSILON);
        assert_eq!(row.average_rent, Some(2450.0));
        assert_eq!(row.extra.get("pedestrian_morning"), Some(3.5));
        assert!(!row.extra.contains("pedestrian"));
    }

    #[test]
    fn request_defaults() {
        let request: RankRequest = serde_json::from_value(json!({
            "weights": [["composition", 100]],
            "categories": ["korean"],
            "genders": ["female"],
            "ageRange": { "min": 20, "max": 29 },
            "periods": ["morning", "evening"],
        }))
        .unwrap();
        assert!((request.top_percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(request.periods, vec![TimePeriod::Morning, TimePeriod::Evening]);

        let filter = request.composition_filter();
        assert!(filter.is_active());
        assert_eq!(filter.genders, vec![Gender::Female]);
    }

    #[test]
    fn factor_tables_display_snake_case() {
        assert_eq!(FactorTable::IncidentDetail.to_string(), "incident_detail");
        assert_eq!(FactorTable::Zones.as_ref(), "zones");
    }
}
