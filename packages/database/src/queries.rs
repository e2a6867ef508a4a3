//! Row queries for the zone and composition tables.
//!
//! Each row is selected as a JSON object and decoded with the same lenient
//! deserializers the JSON snapshots use, so arbitrary numeric columns
//! (ethnicity codes, yearly series) come through without a fixed column
//! list. The configured id column is always emitted as `zone_id` text.

use moosicbox_json_utils::database::ToValue as _;
use serde::de::DeserializeOwned;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

const ROW_JSON: &str = "row_json";

/// Key the zone identifier is emitted under, whatever its column name.
const ZONE_ID_KEY: &str = "zone_id";

/// `SELECT` clause producing one JSON object per row of `table`, with
/// `id_column` replaced by a text `zone_id`.
fn select_rows(table: &str, id_column: &str) -> String {
    format!(
        "SELECT ((to_jsonb(t) - '{id_column}') || \
         jsonb_build_object('{ZONE_ID_KEY}', t.{id_column}::text))::text AS {ROW_JSON} \
         FROM {table} t"
    )
}

/// Reads every row of `table`.
///
/// `table` and `id_column` must already be validated identifiers.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn fetch_all<T: DeserializeOwned>(
    db: &dyn Database,
    table: &str,
    id_column: &str,
) -> Result<Vec<T>, DbError> {
    let sql = select_rows(table, id_column);
    let rows = db.query_raw_params(&sql, &[]).await?;
    decode_rows(&rows, table)
}

/// Reads the rows of `table` whose `id_column` is one of `zone_ids`.
///
/// `table` and `id_column` must already be validated identifiers.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn fetch_for_zones<T: DeserializeOwned>(
    db: &dyn Database,
    table: &str,
    id_column: &str,
    zone_ids: &[String],
) -> Result<Vec<T>, DbError> {
    if zone_ids.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!(
        "{} WHERE t.{id_column}::text IN ({})",
        select_rows(table, id_column),
        placeholders(zone_ids.len())
    );
    let params: Vec<DatabaseValue> = zone_ids
        .iter()
        .map(|id| DatabaseValue::String(id.clone()))
        .collect();

    let rows = db.query_raw_params(&sql, &params).await?;
    decode_rows(&rows, table)
}

/// `$1, $2, ..., $n`
fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_rows<T: DeserializeOwned>(
    rows: &[switchy_database::Row],
    table: &str,
) -> Result<Vec<T>, DbError> {
    let mut decoded = Vec::with_capacity(rows.len());
    for row in rows {
        let json: String = row.to_value(ROW_JSON).map_err(|e| DbError::Conversion {
            message: format!("Failed to read row from {table}: {e}"),
        })?;
        decoded.push(serde_json::from_str(&json)?);
    }
    log::debug!("Decoded {} rows from {table}", decoded.len());
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_rank_demographics_models::DemographicRow;
    use zone_rank_ranking_models::ZoneRow;

    #[test]
    fn numbered_placeholders() {
        assert_eq!(placeholders(1), "$1");
        assert_eq!(placeholders(3), "$1, $2, $3");
    }

    #[test]
    fn custom_id_column_is_emitted_as_zone_id() {
        let sql = select_rows("tracts", "geoid");
        assert!(sql.contains("to_jsonb(t) - 'geoid'"));
        assert!(sql.contains("jsonb_build_object('zone_id', t.geoid::text)"));
        assert!(sql.ends_with("FROM tracts t"));
        assert!(!sql.contains("  "));
    }

    #[test]
    fn rows_keyed_by_custom_id_column_decode() {
        // Shape produced by `select_rows` for a table keyed by `geoid`.
        let json = r#"{"total_population": 10, "zone_id": "360610001"}"#;
        let row: DemographicRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.zone_id, "360610001");
        assert_eq!(row.values.get("total_population"), Some(10.0));

        let zone: ZoneRow =
            serde_json::from_str(r#"{"pedestrian": 3, "zone_id": "360610001"}"#).unwrap();
        assert_eq!(zone.zone_id, "360610001");
    }
}
