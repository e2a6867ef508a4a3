#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns match fractions and raw factor values into 0–100 scores and
//! blends them into one composite score per zone.

pub mod composite;
pub mod threshold;
pub mod weights;

pub use composite::{composite_score, composition_score, factor_score};
pub use threshold::threshold_score;
pub use weights::{WeightPlan, plan_weights};
