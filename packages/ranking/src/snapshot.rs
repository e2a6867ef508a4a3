//! An in-memory [`ZoneDataSource`], optionally loaded from a directory of
//! JSON files.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use zone_rank_demographics_models::DemographicRow;
use zone_rank_ranking_models::{FactorTable, ZoneRow};

use crate::source::{SourceError, ZoneDataSource};

/// A fixed snapshot of every table. `None` marks an unavailable table.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    zones: Option<Vec<ZoneRow>>,
    ethnicity: Option<Vec<DemographicRow>>,
    composition: Option<Vec<DemographicRow>>,
    income: Option<Vec<DemographicRow>>,
    incident_detail: Option<Vec<DemographicRow>>,
    pedestrian_detail: Option<Vec<DemographicRow>>,
}

impl SnapshotSource {
    /// A snapshot with every table unavailable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the zone table.
    #[must_use]
    pub fn with_zones(mut self, rows: Vec<ZoneRow>) -> Self {
        self.zones = Some(rows);
        self
    }

    /// Sets the ethnicity table.
    #[must_use]
    pub fn with_ethnicity(mut self, rows: Vec<DemographicRow>) -> Self {
        self.ethnicity = Some(rows);
        self
    }

    /// Sets the composition table.
    #[must_use]
    pub fn with_composition(mut self, rows: Vec<DemographicRow>) -> Self {
        self.composition = Some(rows);
        self
    }

    /// Sets the income table.
    #[must_use]
    pub fn with_income(mut self, rows: Vec<DemographicRow>) -> Self {
        self.income = Some(rows);
        self
    }

    /// Sets the incident detail table.
    #[must_use]
    pub fn with_incident_detail(mut self, rows: Vec<DemographicRow>) -> Self {
        self.incident_detail = Some(rows);
        self
    }

    /// Sets the pedestrian detail table.
    #[must_use]
    pub fn with_pedestrian_detail(mut self, rows: Vec<DemographicRow>) -> Self {
        self.pedestrian_detail = Some(rows);
        self
    }

    /// Loads a snapshot from `dir`.
    ///
    /// Each table is a JSON array of row objects in its own file
    /// (`zones.json`, `ethnicity.json`, `composition.json`, `income.json`,
    /// `incident_detail.json`, `pedestrian_detail.json`). A missing file
    /// leaves that table unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if a present file cannot be read or parsed.
    pub fn load_dir(dir: &Path) -> Result<Self, SourceError> {
        let snapshot = Self {
            zones: read_table(dir, FactorTable::Zones)?,
            ethnicity: read_table(dir, FactorTable::Ethnicity)?,
            composition: read_table(dir, FactorTable::Composition)?,
            income: read_table(dir, FactorTable::Income)?,
            incident_detail: read_table(dir, FactorTable::IncidentDetail)?,
            pedestrian_detail: read_table(dir, FactorTable::PedestrianDetail)?,
        };

        log::info!(
            "Loaded snapshot from {}: {} zones",
            dir.display(),
            snapshot.zones.as_ref().map_or(0, Vec::len)
        );

        Ok(snapshot)
    }
}

fn read_table<T: DeserializeOwned>(
    dir: &Path,
    table: FactorTable,
) -> Result<Option<Vec<T>>, SourceError> {
    let path = dir.join(format!("{table}.json"));
    if !path.exists() {
        log::debug!("No {} in snapshot", path.display());
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    let rows: Vec<T> = serde_json::from_str(&content)?;
    log::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(Some(rows))
}

fn available<T: Clone>(rows: Option<&Vec<T>>, table: FactorTable) -> Result<Vec<T>, SourceError> {
    rows.cloned().ok_or(SourceError::Unavailable { table })
}

fn subset(
    rows: Option<&Vec<DemographicRow>>,
    table: FactorTable,
    zone_ids: &[String],
) -> Result<Vec<DemographicRow>, SourceError> {
    let rows = rows.ok_or(SourceError::Unavailable { table })?;
    let wanted: BTreeSet<&str> = zone_ids.iter().map(String::as_str).collect();
    Ok(rows
        .iter()
        .filter(|row| wanted.contains(row.zone_id.as_str()))
        .cloned()
        .collect())
}

#[async_trait]
impl ZoneDataSource for SnapshotSource {
    async fn zones(&self) -> Result<Vec<ZoneRow>, SourceError> {
        available(self.zones.as_ref(), FactorTable::Zones)
    }

    async fn ethnicity(&self) -> Result<Vec<DemographicRow>, SourceError> {
        available(self.ethnicity.as_ref(), FactorTable::Ethnicity)
    }

    async fn composition(&self) -> Result<Vec<DemographicRow>, SourceError> {
        available(self.composition.as_ref(), FactorTable::Composition)
    }

    async fn income(&self) -> Result<Vec<DemographicRow>, SourceError> {
        available(self.income.as_ref(), FactorTable::Income)
    }

    async fn incident_detail(
        &self,
        zone_ids: &[String],
    ) -> Result<Vec<DemographicRow>, SourceError> {
        subset(
            self.incident_detail.as_ref(),
            FactorTable::IncidentDetail,
            zone_ids,
        )
    }

    async fn pedestrian_detail(
        &self,
        zone_ids: &[String],
    ) -> Result<Vec<DemographicRow>, SourceError> {
        subset(
            self.pedestrian_detail.as_ref(),
            FactorTable::PedestrianDetail,
            zone_ids,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_rank_demographics_models::SparseRow;

    #[tokio::test]
    async fn missing_tables_are_unavailable() {
        let source = SnapshotSource::new().with_zones(vec![ZoneRow::new("1")]);
        assert_eq!(source.zones().await.unwrap().len(), 1);
        assert!(matches!(
            source.income().await,
            Err(SourceError::Unavailable {
                table: FactorTable::Income
            })
        ));
    }

    #[tokio::test]
    async fn detail_reads_only_requested_zones() {
        let source = SnapshotSource::new().with_incident_detail(vec![
            DemographicRow::new("1", SparseRow::new().with("incidents_2020", 3.0)),
            DemographicRow::new("2", SparseRow::new().with("incidents_2020", 7.0)),
        ]);
        let rows = source.incident_detail(&["2".to_string()]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].zone_id, "2");
    }

    #[test]
    fn loads_directory_with_missing_files() {
        let dir = std::env::temp_dir().join(format!("zone_rank_snapshot_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("zones.json"),
            r#"[{"zone_id": "100", "pedestrian": "4", "average_rent": null}]"#,
        )
        .unwrap();

        let snapshot = SnapshotSource::load_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let zones = snapshot.zones.unwrap();
        assert_eq!(zones[0].zone_id, "100");
        assert!(zones[0].average_rent.is_none());
        assert!(snapshot.ethnicity.is_none());
    }
}
