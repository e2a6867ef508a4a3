//! Sparse numeric rows and lenient field coercion.
//!
//! Rows handed over by the storage layer carry arbitrarily many named
//! columns whose values may be numbers, numeric strings, nulls, or garbage.
//! All tolerance of bad data lives here: every value is coerced exactly once
//! when a row is deserialized, and the rest of the engine only ever sees
//! `Option<f64>` (present-but-unusable is `None`, absent is a missing key).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Parses a raw JSON value into a finite number.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace and
/// thousands separators are ignored). Returns `None` for nulls, booleans,
/// non-numeric strings, and non-finite results.
#[must_use]
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Total conversion of a raw value to a number, with zero as the fallback.
#[must_use]
pub fn to_number_or_zero(value: &Value) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// `deserialize_with` helper for numeric fields that must never fail.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce any value at all.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_number_or_zero(&value))
}

/// `deserialize_with` helper for nullable numeric fields.
///
/// # Errors
///
/// Only fails if the underlying deserializer cannot produce any value at all.
pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_number(&value))
}

/// `deserialize_with` helper for identifiers that may arrive as numbers.
///
/// Zone codes are fixed-length numeric strings; a source that emits them as
/// JSON numbers loses nothing as long as the code has no leading zero, so
/// numbers are stringified as-is.
///
/// # Errors
///
/// Returns an error if the value is neither a string nor a number.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric identifier, got {other}"
        ))),
    }
}

/// A row of named numeric columns that keeps "missing" apart from "zero".
///
/// A column that is absent from the row is different from one that is
/// present but null or unparseable: several contracts (parent-column
/// presence, "requested but zero" vs. "not requested") depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, Option<f64>>"
)]
pub struct SparseRow {
    values: BTreeMap<String, Option<f64>>,
}

impl SparseRow {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Inserts a column value. Non-finite numbers are stored as `None`.
    pub fn insert(&mut self, column: impl Into<String>, value: Option<f64>) {
        self.values
            .insert(column.into(), value.filter(|v| v.is_finite()));
    }

    /// Builder-style insert of a known numeric value.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: f64) -> Self {
        self.insert(column, Some(value));
        self
    }

    /// Returns `true` if the column exists in the row, even if its value
    /// could not be parsed.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Returns the column's numeric value, or `None` if the column is
    /// missing or its value was unusable.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    /// Returns the column's numeric value, treating anything unusable as 0.
    #[must_use]
    pub fn number_or_zero(&self, column: &str) -> f64 {
        self.get(column).unwrap_or(0.0)
    }

    /// Iterates over column names in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for SparseRow {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        raw.into_iter()
            .map(|(column, value)| {
                let number = parse_number(&value);
                (column, number)
            })
            .collect()
    }
}

impl From<SparseRow> for BTreeMap<String, Option<f64>> {
    fn from(row: SparseRow) -> Self {
        row.values
    }
}

impl FromIterator<(String, Option<f64>)> for SparseRow {
    fn from_iter<T: IntoIterator<Item = (String, Option<f64>)>>(iter: T) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numbers_and_numeric_strings() {
        assert_eq!(parse_number(&json!(42)), Some(42.0));
        assert_eq!(parse_number(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(parse_number(&json!("1,250")), Some(1250.0));
    }

    #[test]
    fn garbage_coerces_to_zero() {
        assert!(parse_number(&json!(null)).is_none());
        assert!(parse_number(&json!("n/a")).is_none());
        assert!(parse_number(&json!("NaN")).is_none());
        assert!(parse_number(&json!(true)).is_none());
        assert!((to_number_or_zero(&json!("-")) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn keeps_missing_apart_from_null() {
        let row: SparseRow =
            serde_json::from_value(json!({ "A": 450, "AEA": null, "ASA": "bad" })).unwrap();
        assert!(row.contains("AEA"));
        assert!(row.get("AEA").is_none());
        assert!(row.contains("ASA"));
        assert!(!row.contains("ASE"));
        assert!((row.number_or_zero("ASE") - 0.0).abs() < f64::EPSILON);
        assert_eq!(row.get("A"), Some(450.0));
    }

    #[test]
    fn serializes_as_flat_map() {
        let row = SparseRow::new().with("total_population", 5000.0);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value, json!({ "total_population": 5000.0 }));
    }

    #[test]
    fn non_finite_inserts_become_none() {
        let mut row = SparseRow::new();
        row.insert("x", Some(f64::NAN));
        assert!(row.contains("x"));
        assert!(row.get("x").is_none());
    }
}
