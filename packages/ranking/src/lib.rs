#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ranks zones by composite desirability.
//!
//! [`rank_zones`] is the request-level entry point: it reads the zone and
//! composition tables from a [`ZoneDataSource`] concurrently, scores and
//! ranks the zones with [`rank_snapshot`], then fetches the yearly series
//! for the retained zones only.
//!
//! Only a missing zone table fails a request. Any other missing table
//! degrades the factors that depend on it and is reported in
//! [`Diagnostics`].

pub mod enrich;
pub mod filter;
pub mod periods;
pub mod select;
pub mod snapshot;
pub mod source;

use std::collections::BTreeMap;

use serde::Serialize;
use zone_rank_demographics::{
    CategoryCatalog, CompositionFractions, CompositionTables, compute_fractions,
};
use zone_rank_demographics_models::DemographicRow;
use zone_rank_ranking_models::{Diagnostics, FactorTable, RankRequest, RankedZone, ZoneRow};
use zone_rank_scoring::composite::sub_factor;
use zone_rank_scoring::{composite_score, composition_score, factor_score, plan_weights};
use zone_rank_scoring_models::{CompositionBreakdown, FactorScores, ScoringConfig, WeightSet};

pub use periods::PeriodSelection;
pub use snapshot::SnapshotSource;
pub use source::{SourceError, ZoneDataSource};

/// Errors that fail a whole ranking request.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// The zone table could not be read.
    #[error("Zone table unavailable: {0}")]
    ZonesUnavailable(#[source] SourceError),
}

/// The result of ranking one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingOutcome {
    /// Retained zones, best first.
    pub zones: Vec<RankedZone>,
    /// Weights the zones were scored with.
    pub weights: WeightSet,
    /// Raw per-factor match fractions for every zone that had a row.
    pub fractions: CompositionFractions,
    /// Non-fatal anomalies.
    pub diagnostics: Diagnostics,
}

/// Which optional tables a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableNeeds {
    ethnicity: bool,
    composition: bool,
    income: bool,
}

impl TableNeeds {
    fn for_request(request: &RankRequest) -> Self {
        let filter = request.composition_filter();
        Self {
            ethnicity: filter.wants_ethnicity(),
            composition: filter.wants_gender() || filter.active_age_range().is_some(),
            income: filter.active_income_range().is_some(),
        }
    }
}

/// Scores, filters, sorts, and truncates `zones`. Pure; no enrichment.
#[must_use]
pub fn rank_snapshot(
    catalog: &CategoryCatalog,
    zones: &[ZoneRow],
    tables: CompositionTables<'_>,
    request: &RankRequest,
    config: &ScoringConfig,
) -> RankingOutcome {
    let filter = request.composition_filter();
    let fractions = compute_fractions(catalog, tables, &filter);
    let plan = plan_weights(&request.weights, filter.is_active());
    let selection = PeriodSelection::new(&request.periods);

    let candidates = filter::filter_by_rent(
        zones,
        request.rent_range.as_ref(),
        &request.rent_whitelist,
    );
    let candidate_count = candidates.len();

    let scored: Vec<RankedZone> = candidates
        .into_iter()
        .map(|zone| {
            let composition = breakdown_for(&zone.zone_id, &fractions);
            let factor_scores = FactorScores {
                pedestrian: factor_score(selection.pedestrian_value(zone), config),
                incident: factor_score(zone.incident, config),
                flood: factor_score(zone.flood, config),
                rent: factor_score(zone.rent, config),
                poi: factor_score(zone.poi, config),
                composition: composition_score(&composition, request.composition_weights.as_ref()),
            };
            RankedZone {
                zone_id: zone.zone_id.clone(),
                rank: 0,
                composite_score: composite_score(&plan.weights, &factor_scores),
                factor_scores,
                composition,
                average_rent: zone.average_rent,
                enrichment: None,
            }
        })
        .collect();

    let ranked = select::select_top(scored, request.top_percent);

    let diagnostics = Diagnostics {
        unresolved_categories: fractions.unresolved.clone(),
        unknown_weight_keys: plan.unknown_keys,
        missing_tables: vec![],
        overcounted_zones: fractions.overcounted.clone(),
        redistributed_composition: plan.redistributed,
        zone_count: zones.len(),
        candidate_count,
    };

    log::debug!(
        "Ranked {} of {} candidate zones ({} in table, {} retained overcounted)",
        ranked.len(),
        candidate_count,
        zones.len(),
        ranked.iter().filter(|z| z.composition.is_overcounted()).count()
    );

    RankingOutcome {
        zones: ranked,
        weights: plan.weights,
        fractions,
        diagnostics,
    }
}

fn breakdown_for(zone_id: &str, fractions: &CompositionFractions) -> CompositionBreakdown {
    let lookup = |map: &BTreeMap<String, f64>| map.get(zone_id).copied().map(sub_factor);
    CompositionBreakdown {
        ethnicity: lookup(&fractions.ethnicity),
        gender: lookup(&fractions.gender),
        age: lookup(&fractions.age),
        income: lookup(&fractions.income),
        overcount_ratio: fractions.overcounted.get(zone_id).copied(),
    }
}

/// Turns an optional fetch into rows, recording a failure as a missing
/// table.
fn degrade(
    result: Option<Result<Vec<DemographicRow>, SourceError>>,
    table: FactorTable,
    missing: &mut Vec<FactorTable>,
) -> Option<Vec<DemographicRow>> {
    match result? {
        Ok(rows) => {
            log::debug!("Fetched {} rows from {table}", rows.len());
            Some(rows)
        }
        Err(e) => {
            log::warn!("Table {table} unavailable, continuing without it: {e}");
            missing.push(table);
            None
        }
    }
}

/// Ranks zones for `request` using rows read from `source`.
///
/// # Errors
///
/// Returns [`RankError::ZonesUnavailable`] if the zone table cannot be
/// read. Failures of any other table only degrade the result.
pub async fn rank_zones<S: ZoneDataSource + ?Sized>(
    source: &S,
    catalog: &CategoryCatalog,
    request: &RankRequest,
    config: &ScoringConfig,
) -> Result<RankingOutcome, RankError> {
    let needs = TableNeeds::for_request(request);

    let (zones, ethnicity, composition, income) = tokio::join!(
        source.zones(),
        async {
            if needs.ethnicity {
                Some(source.ethnicity().await)
            } else {
                None
            }
        },
        async {
            if needs.composition {
                Some(source.composition().await)
            } else {
                None
            }
        },
        async {
            if needs.income {
                Some(source.income().await)
            } else {
                None
            }
        },
    );

    let zones = zones.map_err(RankError::ZonesUnavailable)?;

    let mut missing = vec![];
    let ethnicity = degrade(ethnicity, FactorTable::Ethnicity, &mut missing);
    let composition = degrade(composition, FactorTable::Composition, &mut missing);
    let income = degrade(income, FactorTable::Income, &mut missing);

    let tables = CompositionTables {
        ethnicity: ethnicity.as_deref(),
        composition: composition.as_deref(),
        income: income.as_deref(),
    };

    let mut outcome = rank_snapshot(catalog, &zones, tables, request, config);

    if !outcome.zones.is_empty() {
        let ids: Vec<String> = outcome.zones.iter().map(|z| z.zone_id.clone()).collect();
        let (incidents, pedestrians) = tokio::join!(
            source.incident_detail(&ids),
            source.pedestrian_detail(&ids),
        );
        let incidents = degrade(Some(incidents), FactorTable::IncidentDetail, &mut missing);
        let pedestrians = degrade(Some(pedestrians), FactorTable::PedestrianDetail, &mut missing);

        enrich::enrich(
            &mut outcome.zones,
            incidents.as_deref(),
            pedestrians.as_deref(),
            &PeriodSelection::new(&request.periods),
        );
    }

    outcome.diagnostics.missing_tables = missing;

    log::info!(
        "Ranked zones: returned={} candidates={} missing_tables={} unresolved={}",
        outcome.zones.len(),
        outcome.diagnostics.candidate_count,
        outcome.diagnostics.missing_tables.len(),
        outcome.diagnostics.unresolved_categories.len()
    );

    Ok(outcome)
}
