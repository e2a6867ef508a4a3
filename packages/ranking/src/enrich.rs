//! Attaches yearly series to the zones that survived ranking.

use std::collections::BTreeMap;

use zone_rank_demographics_models::{DemographicRow, SparseRow};
use zone_rank_ranking_models::{RankedZone, ZoneEnrichment};

use crate::periods::PeriodSelection;

const INCIDENT_PREFIX: &str = "incidents";
const PEDESTRIAN_PREFIX: &str = "ped";
const PREDICTION_MARKER: &str = "pred";

/// Yearly series: history and prediction.
type YearSeries = (BTreeMap<u16, f64>, BTreeMap<u16, f64>);

/// Splits a `<...>_<year>` or `<...>_pred_<year>` column into its year and
/// whether it is a prediction.
fn year_of(column: &str) -> Option<(u16, bool)> {
    let (head, year) = column.rsplit_once('_')?;
    let year = year.parse::<u16>().ok()?;
    let predicted = head
        .rsplit_once('_')
        .is_some_and(|(_, marker)| marker == PREDICTION_MARKER);
    Some((year, predicted))
}

/// Reads `incidents_<year>` and `incidents_pred_<year>` columns.
#[must_use]
pub fn incident_series(row: &SparseRow) -> YearSeries {
    let mut history = BTreeMap::new();
    let mut prediction = BTreeMap::new();

    for (column, value) in row.iter() {
        let Some(rest) = column.strip_prefix(INCIDENT_PREFIX) else {
            continue;
        };
        let Some(value) = value else {
            continue;
        };
        let rest = rest.trim_start_matches('_');
        if let Some(year) = rest
            .strip_prefix(PREDICTION_MARKER)
            .and_then(|y| y.trim_start_matches('_').parse::<u16>().ok())
        {
            prediction.insert(year, value);
        } else if let Ok(year) = rest.parse::<u16>() {
            history.insert(year, value);
        }
    }

    (history, prediction)
}

/// Reads `ped_<periods>_<year>` and `ped_<periods>_pred_<year>` columns for
/// the selected periods.
#[must_use]
pub fn pedestrian_series(row: &SparseRow, selection: &PeriodSelection) -> YearSeries {
    let mut history = BTreeMap::new();
    let mut prediction = BTreeMap::new();

    for column in row.columns() {
        if !column.starts_with(PEDESTRIAN_PREFIX) {
            continue;
        }
        let Some((year, predicted)) = year_of(column) else {
            continue;
        };
        let series = if predicted {
            &mut prediction
        } else {
            &mut history
        };
        if series.contains_key(&year) {
            continue;
        }
        let suffix = if predicted {
            format!("_{PREDICTION_MARKER}_{year}")
        } else {
            format!("_{year}")
        };
        if let Some(value) = selection.value_in(row, PEDESTRIAN_PREFIX, &suffix) {
            series.insert(year, value);
        }
    }

    (history, prediction)
}

/// Merges detail rows into `zones`.
///
/// A table that is `None` was unavailable and leaves its series empty. If
/// both tables are unavailable the zones are left unenriched.
pub fn enrich(
    zones: &mut [RankedZone],
    incidents: Option<&[DemographicRow]>,
    pedestrians: Option<&[DemographicRow]>,
    selection: &PeriodSelection,
) {
    if incidents.is_none() && pedestrians.is_none() {
        return;
    }

    let incident_rows: BTreeMap<&str, &SparseRow> = incidents
        .unwrap_or_default()
        .iter()
        .map(|row| (row.zone_id.as_str(), &row.values))
        .collect();
    let pedestrian_rows: BTreeMap<&str, &SparseRow> = pedestrians
        .unwrap_or_default()
        .iter()
        .map(|row| (row.zone_id.as_str(), &row.values))
        .collect();

    for zone in zones {
        let mut enrichment = ZoneEnrichment::default();
        if let Some(row) = incident_rows.get(zone.zone_id.as_str()) {
            (enrichment.incident_history, enrichment.incident_prediction) = incident_series(row);
        }
        if let Some(row) = pedestrian_rows.get(zone.zone_id.as_str()) {
            (enrichment.pedestrian_history, enrichment.pedestrian_prediction) =
                pedestrian_series(row, selection);
        }
        zone.enrichment = Some(enrichment);
    }
}
