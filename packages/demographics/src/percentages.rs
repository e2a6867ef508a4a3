//! Per-zone match fractions for the population-composition factors.
//!
//! Every function here is total: malformed fields read as zero and
//! zero denominators yield a zero fraction, so a bad row only degrades its
//! own contribution. A factor that was not requested produces an empty map,
//! which downstream scoring treats as "absent" rather than "zero".

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use zone_rank_demographics_models::brackets::{AGE_BRACKETS, Bracket, INCOME_BRACKETS};
use zone_rank_demographics_models::{
    CompositionFilter, DemographicRow, Gender, RangeFilter, TOTAL_POPULATION,
};

use crate::catalog::CategoryCatalog;
use crate::resolver::{CategorySelection, resolve};

/// Zone identifier → match fraction in `[0, 1]`.
pub type FractionMap = BTreeMap<String, f64>;

/// The raw rows available to the calculator. `None` means the table could
/// not be fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionTables<'a> {
    /// Ethnicity table rows.
    pub ethnicity: Option<&'a [DemographicRow]>,
    /// Age/gender composition table rows.
    pub composition: Option<&'a [DemographicRow]>,
    /// Household-income table rows.
    pub income: Option<&'a [DemographicRow]>,
}

/// All composition fractions computed for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionFractions {
    /// Ethnicity match fractions (clamped).
    pub ethnicity: FractionMap,
    /// Gender match fractions.
    pub gender: FractionMap,
    /// Age match fractions.
    pub age: FractionMap,
    /// Income match fractions.
    pub income: FractionMap,
    /// Zones whose raw ethnicity ratio exceeded 1 before clamping, with
    /// the raw ratio.
    pub overcounted: BTreeMap<String, f64>,
    /// Category tokens that could not be resolved.
    pub unresolved: Vec<String>,
}

/// Ethnicity fractions plus the data-quality signals gathered on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EthnicityFractions {
    /// Clamped fractions.
    pub fractions: FractionMap,
    /// Raw ratios above 1, by zone.
    pub overcounted: BTreeMap<String, f64>,
    /// Tokens that did not resolve.
    pub unresolved: Vec<String>,
}

/// Computes every requested composition fraction.
///
/// Factors that are not requested, or whose table is unavailable, come
/// back as empty maps.
#[must_use]
pub fn compute_fractions(
    catalog: &CategoryCatalog,
    tables: CompositionTables<'_>,
    filter: &CompositionFilter,
) -> CompositionFractions {
    let mut fractions = CompositionFractions::default();

    if filter.wants_ethnicity() {
        if let Some(rows) = tables.ethnicity {
            let ethnicity = ethnicity_fractions(catalog, rows, &filter.categories);
            fractions.ethnicity = ethnicity.fractions;
            fractions.overcounted = ethnicity.overcounted;
            fractions.unresolved = ethnicity.unresolved;
        } else {
            log::warn!("Ethnicity table unavailable; ethnicity factor skipped");
        }
    }

    if filter.wants_gender() {
        if let Some(rows) = tables.composition {
            fractions.gender = gender_fractions(rows, &filter.genders);
        } else {
            log::warn!("Composition table unavailable; gender factor skipped");
        }
    }

    if let Some(range) = filter.active_age_range() {
        if let Some(rows) = tables.composition {
            fractions.age = age_fractions(rows, &range);
        } else {
            log::warn!("Composition table unavailable; age factor skipped");
        }
    }

    if let Some(range) = filter.active_income_range() {
        if let Some(rows) = tables.income {
            fractions.income = income_fractions(rows, &range);
        } else {
            log::warn!("Income table unavailable; income factor skipped");
        }
    }

    log::debug!(
        "Composition fractions: ethnicity={} gender={} age={} income={} overcounted={}",
        fractions.ethnicity.len(),
        fractions.gender.len(),
        fractions.age.len(),
        fractions.income.len(),
        fractions.overcounted.len(),
    );

    fractions
}

/// Resolves every distinct token once for this request.
fn resolve_tokens(
    catalog: &CategoryCatalog,
    tokens: &[String],
) -> (Vec<CategorySelection>, Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut selections = Vec::new();
    let mut unresolved = Vec::new();

    for token in tokens.iter().filter(|t| !t.trim().is_empty()) {
        match resolve(catalog, token) {
            Ok(selection) => {
                if seen.insert(selection.columns.clone()) {
                    selections.push(selection);
                } else {
                    log::debug!("Ignoring duplicate category token '{token}'");
                }
            }
            Err(e) => {
                log::warn!("{e}; it will contribute zero");
                unresolved.push(token.clone());
            }
        }
    }

    (selections, unresolved)
}

/// Ethnicity match: the resolved value of every requested token, summed,
/// over the zone's total population.
///
/// Each token contributes a single value (shared parent or largest
/// candidate, see [`CategorySelection::value_in`]). The result is clamped
/// to 1; a raw ratio above 1 is recorded as an overcount.
#[must_use]
pub fn ethnicity_fractions(
    catalog: &CategoryCatalog,
    rows: &[DemographicRow],
    tokens: &[String],
) -> EthnicityFractions {
    let (selections, unresolved) = resolve_tokens(catalog, tokens);
    let mut result = EthnicityFractions {
        unresolved,
        ..EthnicityFractions::default()
    };

    for row in rows {
        let total = row.values.number_or_zero(TOTAL_POPULATION);
        let matched: f64 = selections.iter().map(|s| s.value_in(&row.values)).sum();

        let raw = if total > 0.0 { matched / total } else { 0.0 };
        if raw > 1.0 {
            log::debug!(
                "Zone {} ethnicity ratio {raw:.3} exceeds 1 (matched {matched}, total {total})",
                row.zone_id
            );
            result.overcounted.insert(row.zone_id.clone(), raw);
        }

        result
            .fractions
            .insert(row.zone_id.clone(), raw.clamp(0.0, 1.0));
    }

    if !result.overcounted.is_empty() {
        log::warn!(
            "{} zone(s) have ethnicity counts above their total population; clamped to 100%",
            result.overcounted.len()
        );
    }

    result
}

/// Gender match: the requested genders' percentage-of-total values summed
/// and expressed as a share of the total population.
#[must_use]
pub fn gender_fractions(rows: &[DemographicRow], genders: &[Gender]) -> FractionMap {
    let genders: BTreeSet<Gender> = genders.iter().copied().collect();

    rows.iter()
        .map(|row| {
            let pct: f64 = genders
                .iter()
                .map(|g| row.values.number_or_zero(g.column()))
                .sum();
            (row.zone_id.clone(), (pct / 100.0).clamp(0.0, 1.0))
        })
        .collect()
}

/// Age match: the percentage values of every bracket that overlaps the
/// requested range, summed and divided by 100.
#[must_use]
pub fn age_fractions(rows: &[DemographicRow], range: &RangeFilter) -> FractionMap {
    let brackets = overlapping(AGE_BRACKETS, range);

    rows.iter()
        .map(|row| {
            let pct: f64 = brackets
                .iter()
                .map(|b| row.values.number_or_zero(b.column))
                .sum();
            (row.zone_id.clone(), (pct / 100.0).clamp(0.0, 1.0))
        })
        .collect()
}

/// Income match: household counts of overlapping brackets over the sum of
/// all brackets present in the row (not an external total, so missing
/// brackets do not skew the share).
#[must_use]
pub fn income_fractions(rows: &[DemographicRow], range: &RangeFilter) -> FractionMap {
    let brackets = overlapping(INCOME_BRACKETS, range);

    rows.iter()
        .map(|row| {
            let total: f64 = INCOME_BRACKETS
                .iter()
                .filter_map(|b| row.values.get(b.column))
                .sum();
            let matched: f64 = brackets
                .iter()
                .map(|b| row.values.number_or_zero(b.column))
                .sum();
            let fraction = if total > 0.0 {
                (matched / total).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (row.zone_id.clone(), fraction)
        })
        .collect()
}

fn overlapping<'a>(brackets: &'a [Bracket], range: &RangeFilter) -> Vec<&'a Bracket> {
    let range = RangeFilter::new(range.min, range.max);
    brackets.iter().filter(|b| b.overlaps(&range)).collect()
}
