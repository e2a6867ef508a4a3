#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Postgres-backed [`ZoneDataSource`].
//!
//! Uses `switchy_database` raw queries. Table names are configurable and
//! validated as SQL identifiers before they are interpolated.

pub mod db;
pub mod queries;

use async_trait::async_trait;
use switchy_database::Database;
use zone_rank_demographics_models::DemographicRow;
use zone_rank_ranking::{SourceError, ZoneDataSource};
use zone_rank_ranking_models::{FactorTable, ZoneRow};

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// A row's JSON could not be decoded.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured table or column name is not a plain identifier.
    #[error("Invalid SQL identifier '{name}'")]
    InvalidIdentifier {
        /// The rejected name.
        name: String,
    },

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<DbError> for SourceError {
    fn from(e: DbError) -> Self {
        Self::Backend(Box::new(e))
    }
}

/// Returns `true` if `name` is a plain or schema-qualified identifier
/// (`[A-Za-z_][A-Za-z0-9_]*`, optionally `schema.table`).
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|part| is_column_identifier(part))
}

/// Returns `true` if `name` is a single unqualified identifier
/// (`[A-Za-z_][A-Za-z0-9_]*`).
#[must_use]
pub fn is_column_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Names of the tables read by [`PostgresZoneSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Zone table.
    pub zones: String,
    /// Ethnicity counts.
    pub ethnicity: String,
    /// Age and gender composition.
    pub composition: String,
    /// Household income brackets.
    pub income: String,
    /// Yearly incident series.
    pub incident_detail: String,
    /// Yearly pedestrian series.
    pub pedestrian_detail: String,
    /// Zone identifier column shared by every table.
    pub zone_id_column: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            zones: "zones".to_string(),
            ethnicity: "zone_ethnicity".to_string(),
            composition: "zone_composition".to_string(),
            income: "zone_income".to_string(),
            incident_detail: "zone_incident_detail".to_string(),
            pedestrian_detail: "zone_pedestrian_detail".to_string(),
            zone_id_column: "zone_id".to_string(),
        }
    }
}

impl TableNames {
    /// Defaults overridden by `ZONE_RANK_TABLE_<NAME>` environment variables
    /// (`ZONE_RANK_TABLE_ZONES`, `ZONE_RANK_TABLE_ETHNICITY`, ...,
    /// `ZONE_RANK_ZONE_ID_COLUMN`).
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);
        let defaults = Self::default();
        Self {
            zones: var("ZONE_RANK_TABLE_ZONES", defaults.zones),
            ethnicity: var("ZONE_RANK_TABLE_ETHNICITY", defaults.ethnicity),
            composition: var("ZONE_RANK_TABLE_COMPOSITION", defaults.composition),
            income: var("ZONE_RANK_TABLE_INCOME", defaults.income),
            incident_detail: var("ZONE_RANK_TABLE_INCIDENT_DETAIL", defaults.incident_detail),
            pedestrian_detail: var(
                "ZONE_RANK_TABLE_PEDESTRIAN_DETAIL",
                defaults.pedestrian_detail,
            ),
            zone_id_column: var("ZONE_RANK_ZONE_ID_COLUMN", defaults.zone_id_column),
        }
    }

    /// Checks every table name with [`is_identifier`] and the zone id
    /// column with [`is_column_identifier`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidIdentifier`] for the first bad name.
    pub fn validate(&self) -> Result<(), DbError> {
        for name in [
            &self.zones,
            &self.ethnicity,
            &self.composition,
            &self.income,
            &self.incident_detail,
            &self.pedestrian_detail,
        ] {
            if !is_identifier(name) {
                return Err(DbError::InvalidIdentifier { name: name.clone() });
            }
        }
        if !is_column_identifier(&self.zone_id_column) {
            return Err(DbError::InvalidIdentifier {
                name: self.zone_id_column.clone(),
            });
        }
        Ok(())
    }

    /// Name of `table`.
    #[must_use]
    pub fn table(&self, table: FactorTable) -> &str {
        match table {
            FactorTable::Zones => &self.zones,
            FactorTable::Ethnicity => &self.ethnicity,
            FactorTable::Composition => &self.composition,
            FactorTable::Income => &self.income,
            FactorTable::IncidentDetail => &self.incident_detail,
            FactorTable::PedestrianDetail => &self.pedestrian_detail,
        }
    }
}

/// Reads ranking input from Postgres.
pub struct PostgresZoneSource {
    db: Box<dyn Database>,
    tables: TableNames,
}

impl PostgresZoneSource {
    /// Wraps a connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidIdentifier`] if a table name is not a
    /// plain identifier.
    pub fn new(db: Box<dyn Database>, tables: TableNames) -> Result<Self, DbError> {
        tables.validate()?;
        Ok(Self { db, tables })
    }

    async fn all<T: serde::de::DeserializeOwned>(
        &self,
        table: FactorTable,
    ) -> Result<Vec<T>, SourceError> {
        Ok(queries::fetch_all(
            &*self.db,
            self.tables.table(table),
            &self.tables.zone_id_column,
        )
        .await?)
    }

    async fn for_zones(
        &self,
        table: FactorTable,
        zone_ids: &[String],
    ) -> Result<Vec<DemographicRow>, SourceError> {
        Ok(queries::fetch_for_zones(
            &*self.db,
            self.tables.table(table),
            &self.tables.zone_id_column,
            zone_ids,
        )
        .await?)
    }
}

#[async_trait]
impl ZoneDataSource for PostgresZoneSource {
    async fn zones(&self) -> Result<Vec<ZoneRow>, SourceError> {
        self.all(FactorTable::Zones).await
    }

    async fn ethnicity(&self) -> Result<Vec<DemographicRow>, SourceError> {
        self.all(FactorTable::Ethnicity).await
    }

    async fn composition(&self) -> Result<Vec<DemographicRow>, SourceError> {
        self.all(FactorTable::Composition).await
    }

    async fn income(&self) -> Result<Vec<DemographicRow>, SourceError> {
        self.all(FactorTable::Income).await
    }

    async fn incident_detail(
        &self,
        zone_ids: &[String],
    ) -> Result<Vec<DemographicRow>, SourceError> {
        self.for_zones(FactorTable::IncidentDetail, zone_ids).await
    }

    async fn pedestrian_detail(
        &self,
        zone_ids: &[String],
    ) -> Result<Vec<DemographicRow>, SourceError> {
        self.for_zones(FactorTable::PedestrianDetail, zone_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("zones"));
        assert!(is_identifier("analytics.zone_income"));
        assert!(is_identifier("_t2"));
        assert!(!is_identifier("2zones"));
        assert!(!is_identifier("zones; DROP TABLE x"));
        assert!(!is_identifier("a.b.c"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn default_table_names_are_valid() {
        assert!(TableNames::default().validate().is_ok());

        let bad = TableNames {
            income: "income-table".to_string(),
            ..TableNames::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(DbError::InvalidIdentifier { name }) if name == "income-table"
        ));
    }

    #[test]
    fn zone_id_column_must_be_unqualified() {
        assert!(is_column_identifier("geoid"));
        assert!(!is_column_identifier("t.geoid"));

        let qualified = TableNames {
            zones: "analytics.zones".to_string(),
            zone_id_column: "geoid".to_string(),
            ..TableNames::default()
        };
        assert!(qualified.validate().is_ok());

        let dotted = TableNames {
            zone_id_column: "zones.geoid".to_string(),
            ..TableNames::default()
        };
        assert!(matches!(
            dotted.validate(),
            Err(DbError::InvalidIdentifier { name }) if name == "zones.geoid"
        ));
    }

    #[test]
    fn maps_factor_tables_to_names() {
        let names = TableNames::default();
        assert_eq!(names.table(FactorTable::Income), "zone_income");
        assert_eq!(names.table(FactorTable::Zones), "zones");
    }
}
