//! The ethnicity column hierarchy and category-name table.
//!
//! The catalog is plain data: a tree of column identifiers with explicit
//! parent pointers plus a name → column-set table. It is loaded once per
//! process (the default one is embedded at compile time) and passed around
//! by reference; nothing mutates it after validation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use zone_rank_demographics_models::{CatalogColumn, CatalogDocument};

use crate::DemographicsError;

/// Catalog shipped with the crate.
const EMBEDDED_CATALOG: &str = include_str!("../categories/ethnicity.toml");

/// Validated, immutable category catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    columns: BTreeMap<String, CatalogColumn>,
    categories: BTreeMap<String, Vec<String>>,
}

/// Normalizes a human-readable category name for lookup: trimmed,
/// lower-cased, with runs of spaces and hyphens collapsed to `_`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c == ' ' || c == '-' || c == '_' {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.extend(c.to_lowercase());
        }
    }
    out
}

impl CategoryCatalog {
    /// Loads the catalog embedded in the crate.
    ///
    /// # Errors
    ///
    /// Returns [`DemographicsError`] if the embedded TOML is malformed or
    /// inconsistent. This indicates a development error.
    pub fn embedded() -> Result<Self, DemographicsError> {
        Self::from_toml_str(EMBEDDED_CATALOG)
    }

    /// Reads and validates a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`DemographicsError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn from_path(path: &Path) -> Result<Self, DemographicsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DemographicsError`] if the TOML is malformed or the
    /// catalog is inconsistent.
    pub fn from_toml_str(content: &str) -> Result<Self, DemographicsError> {
        let document: CatalogDocument = toml::de::from_str(content)?;
        Self::from_document(document)
    }

    /// Validates a parsed catalog document.
    ///
    /// Rejects duplicate column ids, parents that do not exist, parent
    /// cycles, duplicate category names, and names that reference unknown
    /// columns.
    ///
    /// # Errors
    ///
    /// Returns [`DemographicsError::InvalidCatalog`] describing the first
    /// inconsistency found.
    pub fn from_document(document: CatalogDocument) -> Result<Self, DemographicsError> {
        let mut columns = BTreeMap::new();
        for mut column in document.columns {
            column.id = column.id.trim().to_string();
            if column.id.is_empty() {
                return Err(invalid("column with an empty id"));
            }
            if columns.contains_key(&column.id) {
                return Err(invalid(format!("duplicate column '{}'", column.id)));
            }
            columns.insert(column.id.clone(), column);
        }

        for column in columns.values() {
            if let Some(parent) = &column.parent
                && !columns.contains_key(parent)
            {
                return Err(invalid(format!(
                    "column '{}' has unknown parent '{parent}'",
                    column.id
                )));
            }
        }

        for id in columns.keys() {
            let mut current = id.as_str();
            let mut steps = 0;
            while let Some(parent) = columns.get(current).and_then(|c| c.parent.as_deref()) {
                steps += 1;
                if steps > columns.len() {
                    return Err(invalid(format!("parent cycle through column '{id}'")));
                }
                current = parent;
            }
        }

        let mut categories = BTreeMap::new();
        for category in document.categories {
            let name = normalize_name(&category.name);
            if name.is_empty() {
                return Err(invalid("category with an empty name"));
            }
            if categories.contains_key(&name) {
                return Err(invalid(format!("duplicate category '{name}'")));
            }
            if category.columns.is_empty() {
                return Err(invalid(format!("category '{name}' has no columns")));
            }

            let mut seen = BTreeSet::new();
            let mut resolved = Vec::with_capacity(category.columns.len());
            for column in category.columns {
                if !columns.contains_key(&column) {
                    return Err(invalid(format!(
                        "category '{name}' references unknown column '{column}'"
                    )));
                }
                if seen.insert(column.clone()) {
                    resolved.push(column);
                }
            }
            categories.insert(name, resolved);
        }

        log::debug!(
            "Loaded category catalog: {} columns, {} names",
            columns.len(),
            categories.len()
        );

        Ok(Self {
            columns,
            categories,
        })
    }

    /// Returns `true` if `id` is a known raw column identifier.
    #[must_use]
    pub fn is_column(&self, id: &str) -> bool {
        self.columns.contains_key(id)
    }

    /// Looks up a column definition.
    #[must_use]
    pub fn column(&self, id: &str) -> Option<&CatalogColumn> {
        self.columns.get(id)
    }

    /// Iterates over all columns in identifier order.
    pub fn columns(&self) -> impl Iterator<Item = &CatalogColumn> {
        self.columns.values()
    }

    /// Returns the parent of `id`, if it has one.
    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.columns.get(id).and_then(|c| c.parent.as_deref())
    }

    /// Returns the direct children of `id`.
    #[must_use]
    pub fn children_of(&self, id: &str) -> Vec<&str> {
        self.columns
            .values()
            .filter(|c| c.parent.as_deref() == Some(id))
            .map(|c| c.id.as_str())
            .collect()
    }

    /// Looks up the columns behind a category name (already normalized).
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&[String]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    /// Iterates over `(name, columns)` pairs in name order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, columns)| (name.as_str(), columns.as_slice()))
    }

    /// Returns the single parent shared by every column in `columns`.
    ///
    /// `None` if the slice is empty, any column is a root or unknown, or
    /// the columns have different parents.
    #[must_use]
    pub fn common_parent<S: AsRef<str>>(&self, columns: &[S]) -> Option<&str> {
        let (first, rest) = columns.split_first()?;
        let parent = self.parent_of(first.as_ref())?;
        rest.iter()
            .all(|c| self.parent_of(c.as_ref()) == Some(parent))
            .then_some(parent)
    }
}

fn invalid(message: impl Into<String>) -> DemographicsError {
    DemographicsError::InvalidCatalog {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Number of columns in the embedded catalog. Update after editing
    /// `categories/ethnicity.toml`.
    const EXPECTED_COLUMN_COUNT: usize = 48;

    /// Number of category names in the embedded catalog.
    const EXPECTED_CATEGORY_COUNT: usize = 46;

    #[test]
    fn loads_embedded_catalog() {
        let catalog = CategoryCatalog::embedded().unwrap();
        assert_eq!(catalog.columns().count(), EXPECTED_COLUMN_COUNT);
        assert_eq!(catalog.categories().count(), EXPECTED_CATEGORY_COUNT);
    }

    #[test]
    fn asian_maps_to_five_siblings_of_root() {
        let catalog = CategoryCatalog::embedded().unwrap();
        let columns = catalog.category("asian").unwrap();
        assert_eq!(columns.len(), 5);
        assert_eq!(catalog.common_parent(columns), Some("A"));
        assert_eq!(catalog.children_of("A").len(), 5);
    }

    #[test]
    fn common_parent_requires_a_single_shared_parent() {
        let catalog = CategoryCatalog::embedded().unwrap();
        assert_eq!(catalog.common_parent(&["AEAKrn", "AEAChn"]), Some("AEA"));
        assert_eq!(catalog.common_parent(&["AEAKrn", "ASAInd"]), None);
        assert_eq!(catalog.common_parent(&["A", "B"]), None);
        assert_eq!(catalog.common_parent::<&str>(&[]), None);
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("  Puerto Rican "), "puerto_rican");
        assert_eq!(normalize_name("South-Asian"), "south_asian");
        assert_eq!(normalize_name("east  asian"), "east_asian");
    }

    #[test]
    fn rejects_unknown_parent() {
        let err = CategoryCatalog::from_toml_str(
            r#"
            [[columns]]
            id = "X1"
            label = "x"
            parent = "X"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, DemographicsError::InvalidCatalog { .. }));
    }

    #[test]
    fn rejects_parent_cycles() {
        let err = CategoryCatalog::from_toml_str(
            r#"
            [[columns]]
            id = "X"
            label = "x"
            parent = "Y"

            [[columns]]
            id = "Y"
            label = "y"
            parent = "X"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn rejects_names_with_unknown_columns() {
        let err = CategoryCatalog::from_toml_str(
            r#"
            [[columns]]
            id = "X"
            label = "x"

            [[categories]]
            name = "ex"
            columns = ["X", "Z"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown column 'Z'"));
    }

    #[test]
    fn category_ids_are_unique_and_columns_exist() {
        let catalog = CategoryCatalog::embedded().unwrap();
        for (name, columns) in catalog.categories() {
            assert!(!columns.is_empty(), "category {name} has no columns");
            for column in columns {
                assert!(
                    catalog.is_column(column),
                    "category {name} points at unknown column {column}"
                );
            }
        }
    }
}
