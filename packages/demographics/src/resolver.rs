//! Category token resolution.
//!
//! Maps a caller-supplied token to the data columns that represent it and
//! decides how to read a single value for that token out of a row without
//! double counting overlapping subgroups.

use thiserror::Error;
use zone_rank_demographics_models::SparseRow;

use crate::catalog::{CategoryCatalog, normalize_name};

/// A token that could not be resolved. Non-fatal: the token contributes
/// zero to its aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Neither a raw column identifier nor a known category name.
    #[error("Unknown population category '{token}'")]
    UnknownCategory {
        /// The token as supplied by the caller.
        token: String,
    },
}

/// The columns a category token resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection {
    /// The token as supplied by the caller.
    pub token: String,
    /// Underlying column identifiers (1..N, no duplicates).
    pub columns: Vec<String>,
    /// Single parent shared by all `columns`, only set when there is more
    /// than one column.
    pub shared_parent: Option<String>,
}

impl CategorySelection {
    /// Reads this selection's value from a row.
    ///
    /// * one column: that column's value;
    /// * several columns with a shared parent present in the row: the
    ///   parent's value alone, since it already aggregates the children;
    /// * otherwise: the largest single candidate value, never the sum.
    ///
    /// Missing or malformed columns read as zero.
    #[must_use]
    pub fn value_in(&self, row: &SparseRow) -> f64 {
        match self.columns.as_slice() {
            [] => 0.0,
            [only] => row.number_or_zero(only),
            many => {
                if let Some(parent) = self.shared_parent.as_deref()
                    && let Some(value) = row.get(parent)
                {
                    return value;
                }
                many.iter()
                    .map(|column| row.number_or_zero(column))
                    .fold(0.0, f64::max)
            }
        }
    }
}

/// Resolves a category token against the catalog.
///
/// A recognized raw column identifier (matched exactly) resolves to itself.
/// Anything else is normalized and looked up in the catalog's name table.
///
/// # Errors
///
/// Returns [`ResolveError::UnknownCategory`] if the token is blank or
/// matches neither a column nor a category name.
pub fn resolve(catalog: &CategoryCatalog, token: &str) -> Result<CategorySelection, ResolveError> {
    let trimmed = token.trim();

    if catalog.is_column(trimmed) {
        return Ok(CategorySelection {
            token: token.to_string(),
            columns: vec![trimmed.to_string()],
            shared_parent: None,
        });
    }

    let columns = catalog
        .category(&normalize_name(trimmed))
        .filter(|_| !trimmed.is_empty())
        .ok_or_else(|| ResolveError::UnknownCategory {
            token: token.to_string(),
        })?
        .to_vec();

    let shared_parent = if columns.len() > 1 {
        catalog.common_parent(&columns).map(str::to_string)
    } else {
        None
    };

    Ok(CategorySelection {
        token: token.to_string(),
        columns,
        shared_parent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CategoryCatalog {
        CategoryCatalog::from_toml_str(
            r#"
            [[columns]]
            id = "A"
            label = "Asian"

            [[columns]]
            id = "AEA"
            label = "East Asian"
            parent = "A"

            [[columns]]
            id = "ASA"
            label = "South Asian"
            parent = "A"

            [[columns]]
            id = "AEAKrn"
            label = "Korean"
            parent = "AEA"

            [[columns]]
            id = "X1"
            label = "x1"

            [[columns]]
            id = "X2"
            label = "x2"

            [[columns]]
            id = "X3"
            label = "x3"

            [[categories]]
            name = "asian"
            columns = ["AEA", "ASA"]

            [[categories]]
            name = "korean"
            columns = ["AEAKrn"]

            [[categories]]
            name = "mixed"
            columns = ["X1", "X2", "X3"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn raw_column_resolves_to_itself() {
        let selection = resolve(&catalog(), "AEAKrn").unwrap();
        assert_eq!(selection.columns, vec!["AEAKrn".to_string()]);
        assert!(selection.shared_parent.is_none());
    }

    #[test]
    fn names_are_case_insensitive() {
        let selection = resolve(&catalog(), " Korean ").unwrap();
        assert_eq!(selection.columns, vec!["AEAKrn".to_string()]);
    }

    #[test]
    fn unknown_token_is_an_error() {
        assert_eq!(
            resolve(&catalog(), "martian"),
            Err(ResolveError::UnknownCategory {
                token: "martian".to_string()
            })
        );
        assert!(resolve(&catalog(), "   ").is_err());
    }

    #[test]
    fn shared_parent_wins_over_child_sum() {
        let selection = resolve(&catalog(), "asian").unwrap();
        assert_eq!(selection.shared_parent.as_deref(), Some("A"));

        let row = SparseRow::new()
            .with("AEA", 300.0)
            .with("ASA", 200.0)
            .with("A", 450.0);
        assert!((selection.value_in(&row) - 450.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_parent_falls_back_to_max() {
        let selection = resolve(&catalog(), "asian").unwrap();
        let row = SparseRow::new().with("AEA", 300.0).with("ASA", 200.0);
        assert!((selection.value_in(&row) - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn siblings_without_parent_take_max() {
        let selection = resolve(&catalog(), "mixed").unwrap();
        assert!(selection.shared_parent.is_none());

        let row = SparseRow::new()
            .with("X1", 5.0)
            .with("X2", 12.0)
            .with("X3", 3.0);
        assert!((selection.value_in(&row) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_single_column_reads_zero() {
        let selection = resolve(&catalog(), "korean").unwrap();
        assert!(selection.value_in(&SparseRow::new()).abs() < f64::EPSILON);
    }
}
