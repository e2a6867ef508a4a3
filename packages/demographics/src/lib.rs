#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Demographic aggregation for zone ranking.
//!
//! Resolves caller-supplied population categories into data columns
//! (without double counting across the ethnicity hierarchy) and turns raw
//! composition rows into per-zone match fractions.

pub mod catalog;
pub mod percentages;
pub mod resolver;

use thiserror::Error;

pub use catalog::CategoryCatalog;
pub use percentages::{CompositionFractions, CompositionTables, FractionMap, compute_fractions};
pub use resolver::{CategorySelection, ResolveError, resolve};

/// Errors that can occur while loading demographic configuration.
#[derive(Debug, Error)]
pub enum DemographicsError {
    /// Catalog TOML could not be parsed.
    #[error("Catalog parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog parsed but is internally inconsistent.
    #[error("Invalid catalog: {message}")]
    InvalidCatalog {
        /// Description of what went wrong.
        message: String,
    },
}
