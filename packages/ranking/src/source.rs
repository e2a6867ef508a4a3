//! The storage boundary: where zone and composition rows come from.

use async_trait::async_trait;
use zone_rank_demographics_models::DemographicRow;
use zone_rank_ranking_models::{FactorTable, ZoneRow};

/// Errors that can occur while reading a table.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The table does not exist in this source.
    #[error("Table '{table}' is unavailable")]
    Unavailable {
        /// Which table.
        table: FactorTable,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be decoded.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised by a storage backend.
    #[error("Backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Read-only access to the tables a ranking request needs.
///
/// Every method reads one table. Composition and enrichment tables are
/// optional: a failure there degrades the ranking instead of aborting it.
#[async_trait]
pub trait ZoneDataSource: Send + Sync {
    /// Reads every zone row.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the zone table cannot be read.
    async fn zones(&self) -> Result<Vec<ZoneRow>, SourceError>;

    /// Reads the ethnicity count table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the table cannot be read.
    async fn ethnicity(&self) -> Result<Vec<DemographicRow>, SourceError>;

    /// Reads the age and gender composition table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the table cannot be read.
    async fn composition(&self) -> Result<Vec<DemographicRow>, SourceError>;

    /// Reads the household income table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the table cannot be read.
    async fn income(&self) -> Result<Vec<DemographicRow>, SourceError>;

    /// Reads yearly incident history and predictions for `zone_ids` only.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the table cannot be read.
    async fn incident_detail(&self, zone_ids: &[String])
    -> Result<Vec<DemographicRow>, SourceError>;

    /// Reads yearly pedestrian history and predictions for `zone_ids` only.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the table cannot be read.
    async fn pedestrian_detail(
        &self,
        zone_ids: &[String],
    ) -> Result<Vec<DemographicRow>, SourceError>;
}
