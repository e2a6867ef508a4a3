#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scoring types for the zone ranking engine.
//!
//! Defines the weighted factors, the weight set that blends them, the
//! optional advanced composition weights, and the per-zone score records
//! produced by the composite engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use zone_rank_demographics_models::row::lenient_f64;

/// A weighted factor of the composite score.
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
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum FactorKey {
    /// Pedestrian activity.
    #[strum(to_string = "pedestrian", serialize = "foot_traffic")]
    Pedestrian,
    /// Population composition (ethnicity, gender, age, income).
    #[strum(to_string = "composition", serialize = "demographics")]
    Composition,
    /// Incident history.
    #[strum(to_string = "incident", serialize = "crime", serialize = "safety")]
    Incident,
    /// Flood exposure.
    Flood,
    /// Rent.
    Rent,
    /// Points-of-interest density.
    #[serde(rename = "poi", alias = "pointOfInterest", alias = "point_of_interest")]
    #[strum(
        to_string = "poi",
        serialize = "pointOfInterest",
        serialize = "point_of_interest"
    )]
    PointOfInterest,
}

impl FactorKey {
    /// Every factor, in display order.
    pub const ALL: [Self; 6] = [
        Self::Pedestrian,
        Self::Composition,
        Self::Incident,
        Self::Flood,
        Self::Rent,
        Self::PointOfInterest,
    ];

    /// The five factors backed by independent zone-table values.
    pub const INDEPENDENT: [Self; 5] = [
        Self::Pedestrian,
        Self::Incident,
        Self::Flood,
        Self::Rent,
        Self::PointOfInterest,
    ];

    /// Default weight (as a fraction) used when the caller omits a factor.
    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::Pedestrian => 0.45,
            Self::Composition => 0.0,
            Self::Incident => 0.25,
            Self::Flood => 0.15,
            Self::Rent => 0.10,
            Self::PointOfInterest => 0.05,
        }
    }
}

/// A caller-supplied weight: factor key plus a percentage in `0..=100`.
///
/// Accepted as `{"factor": "rent", "percent": 20}` or `["rent", 20]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WeightInputRepr")]
pub struct WeightInput {
    /// Factor key as the caller typed it.
    pub factor: String,
    /// Weight in percent.
    pub percent: f64,
}

impl WeightInput {
    /// Creates a weight input.
    #[must_use]
    pub fn new(factor: impl Into<String>, percent: f64) -> Self {
        Self {
            factor: factor.into(),
            percent,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WeightInputRepr {
    Object {
        #[serde(alias = "key")]
        factor: String,
        #[serde(alias = "weight", deserialize_with = "lenient_f64")]
        percent: f64,
    },
    Pair(String, #[serde(deserialize_with = "lenient_f64")] f64),
}

impl From<WeightInputRepr> for WeightInput {
    fn from(repr: WeightInputRepr) -> Self {
        match repr {
            WeightInputRepr::Object { factor, percent }
            | WeightInputRepr::Pair(factor, percent) => Self { factor, percent },
        }
    }
}

/// Factor weights as fractions. Every [`FactorKey`] always has an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightSet {
    weights: BTreeMap<FactorKey, f64>,
}

impl WeightSet {
    /// The default weights.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            weights: FactorKey::ALL
                .iter()
                .map(|k| (*k, k.default_weight()))
                .collect(),
        }
    }

    /// All-zero weights.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            weights: FactorKey::ALL.iter().map(|k| (*k, 0.0)).collect(),
        }
    }

    /// Weight of `key`.
    #[must_use]
    pub fn get(&self, key: FactorKey) -> f64 {
        self.weights.get(&key).copied().unwrap_or(0.0)
    }

    /// Sets the weight of `key`.
    pub fn set(&mut self, key: FactorKey, weight: f64) {
        self.weights.insert(key, weight);
    }

    /// Builder-style [`Self::set`].
    #[must_use]
    pub fn with(mut self, key: FactorKey, weight: f64) -> Self {
        self.set(key, weight);
        self
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Sum of the five independent-factor weights.
    #[must_use]
    pub fn independent_total(&self) -> f64 {
        FactorKey::INDEPENDENT.iter().map(|k| self.get(*k)).sum()
    }

    /// Iterates over `(key, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (FactorKey, f64)> + '_ {
        self.weights.iter().map(|(k, w)| (*k, *w))
    }
}

impl Default for WeightSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Explicit blend of the composition sub-factors, as fractions that
/// conceptually sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositionWeights {
    /// Ethnicity weight.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ethnicity: f64,
    /// Gender weight.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gender: f64,
    /// Age weight.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub age: f64,
    /// Income weight.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub income: f64,
}

/// Tunables of the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Top of the raw scale the zone table uses for its five factor
    /// values; a raw value at this level scores 100.
    pub raw_scale_max: f64,
}

impl ScoringConfig {
    /// Default top of the raw factor scale.
    pub const DEFAULT_RAW_SCALE_MAX: f64 = 5.0;
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            raw_scale_max: Self::DEFAULT_RAW_SCALE_MAX,
        }
    }
}

/// Named quality band of a match percentage on the threshold curve.
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
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
pub enum QualityBand {
    /// Below 5%.
    #[strum(to_string = "Very Poor")]
    VeryPoor,
    /// 5% to under 10%.
    Poor,
    /// 10% to under 15%.
    Weak,
    /// 15% to under 20%.
    Average,
    /// 20% to under 25%.
    Good,
    /// 25% to under 30%.
    Strong,
    /// 30% and above.
    Excellent,
}

impl QualityBand {
    /// Band of a match fraction in `[0, 1]`. Non-finite fractions are
    /// [`Self::VeryPoor`].
    #[must_use]
    pub fn for_fraction(fraction: f64) -> Self {
        Self::for_percent(fraction * 100.0)
    }

    /// Band of a match percentage in `[0, 100]`. Non-finite percentages are
    /// [`Self::VeryPoor`].
    #[must_use]
    pub fn for_percent(pct: f64) -> Self {
        let pct = if pct.is_finite() { pct } else { 0.0 };
        match pct {
            p if p >= 30.0 => Self::Excellent,
            p if p >= 25.0 => Self::Strong,
            p if p >= 20.0 => Self::Good,
            p if p >= 15.0 => Self::Average,
            p if p >= 10.0 => Self::Weak,
            p if p >= 5.0 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    /// Lowest match percentage belonging to this band.
    #[must_use]
    pub const fn lower_bound_pct(self) -> f64 {
        match self {
            Self::VeryPoor => 0.0,
            Self::Poor => 5.0,
            Self::Weak => 10.0,
            Self::Average => 15.0,
            Self::Good => 20.0,
            Self::Strong => 25.0,
            Self::Excellent => 30.0,
        }
    }
}

/// A composition sub-factor's match fraction and its threshold score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubFactorScore {
    /// Match fraction in `[0, 1]`.
    pub fraction: f64,
    /// Threshold score in `[0, 100]`.
    pub score: f64,
}

/// How a zone's composition score was assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionBreakdown {
    /// Ethnicity sub-factor, if requested and available.
    pub ethnicity: Option<SubFactorScore>,
    /// Gender sub-factor, if requested and available.
    pub gender: Option<SubFactorScore>,
    /// Age sub-factor, if requested and available.
    pub age: Option<SubFactorScore>,
    /// Income sub-factor, if requested and available.
    pub income: Option<SubFactorScore>,
    /// Raw ethnicity ratio when it exceeded 1 before clamping.
    pub overcount_ratio: Option<f64>,
}

impl CompositionBreakdown {
    /// Returns `true` if the zone's ethnicity counts exceeded its total
    /// population.
    #[must_use]
    pub const fn is_overcounted(&self) -> bool {
        self.overcount_ratio.is_some()
    }
}

/// Per-factor scores of a zone, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScores {
    /// Pedestrian activity score.
    pub pedestrian: f64,
    /// Incident score.
    pub incident: f64,
    /// Flood exposure score.
    pub flood: f64,
    /// Rent score.
    pub rent: f64,
    /// Points-of-interest score.
    pub poi: f64,
    /// Composition score, `None` when composition could not be scored.
    pub composition: Option<f64>,
}

impl FactorScores {
    /// Score of `key`; an absent composition score reads as 0.
    #[must_use]
    pub fn get(&self, key: FactorKey) -> f64 {
        match key {
            FactorKey::Pedestrian => self.pedestrian,
            FactorKey::Composition => self.composition.unwrap_or(0.0),
            FactorKey::Incident => self.incident,
            FactorKey::Flood => self.flood,
            FactorKey::Rent => self.rent,
            FactorKey::PointOfInterest => self.poi,
        }
    }
}
