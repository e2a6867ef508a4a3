#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for ranking zones.
//!
//! ```text
//! zone_rank rank --request request.json --snapshot data/ [--pretty]
//! zone_rank rank --request request.json --database
//! zone_rank categories [--catalog categories.toml]
//! zone_rank score 12.5
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use zone_rank_database::{PostgresZoneSource, TableNames};
use zone_rank_demographics::CategoryCatalog;
use zone_rank_ranking::{RankingOutcome, SnapshotSource, ZoneDataSource, rank_zones};
use zone_rank_ranking_models::RankRequest;
use zone_rank_scoring::threshold_score;
use zone_rank_scoring_models::{QualityBand, ScoringConfig};

#[derive(Parser)]
#[command(name = "zone_rank", about = "Rank city zones by composite desirability")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank zones for a JSON request
    Rank {
        /// Path to the request JSON (`-` for stdin)
        #[arg(long)]
        request: PathBuf,
        /// Read tables from a directory of JSON files
        #[arg(long, conflicts_with = "database", required_unless_present = "database")]
        snapshot: Option<PathBuf>,
        /// Read tables from Postgres (`DATABASE_URL`)
        #[arg(long)]
        database: bool,
        /// Category catalog TOML replacing the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Top of the raw factor scale in the zone table
        #[arg(long, default_value_t = ScoringConfig::DEFAULT_RAW_SCALE_MAX)]
        raw_scale_max: f64,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// List the population categories the catalog understands
    Categories {
        /// Category catalog TOML replacing the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Show the threshold score for a match percentage
    Score {
        /// Match percentage (0–100)
        percent: f64,
    },
}

fn load_catalog(path: Option<&Path>) -> Result<CategoryCatalog, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => CategoryCatalog::from_path(path)?,
        None => CategoryCatalog::embedded()?,
    })
}

fn read_request(path: &Path) -> Result<RankRequest, Box<dyn std::error::Error>> {
    let content = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&content)?)
}

async fn run_rank(
    source: &dyn ZoneDataSource,
    catalog: &CategoryCatalog,
    request: &RankRequest,
    config: &ScoringConfig,
) -> Result<RankingOutcome, Box<dyn std::error::Error>> {
    Ok(rank_zones(source, catalog, request, config).await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            request,
            snapshot,
            database,
            catalog,
            raw_scale_max,
            pretty,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let request = read_request(&request)?;
            let config = ScoringConfig { raw_scale_max };
            log::debug!(
                "Request: {} weights, {} categories, top {}%",
                request.weights.len(),
                request.categories.len(),
                request.top_percent
            );

            let outcome = if database {
                let db = zone_rank_database::db::connect_from_env().await?;
                let source = PostgresZoneSource::new(db, TableNames::from_env())?;
                run_rank(&source, &catalog, &request, &config).await?
            } else {
                let dir = snapshot.ok_or("either --snapshot or --database is required")?;
                let source = SnapshotSource::load_dir(&dir)?;
                run_rank(&source, &catalog, &request, &config).await?
            };

            let json = if pretty {
                serde_json::to_string_pretty(&outcome)?
            } else {
                serde_json::to_string(&outcome)?
            };
            println!("{json}");
        }
        Commands::Categories { catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;

            println!("{:<24} COLUMNS", "NAME");
            println!("{}", "-".repeat(72));
            for (name, columns) in catalog.categories() {
                let labelled: Vec<String> = columns
                    .iter()
                    .map(|id| match catalog.column(id) {
                        Some(column) => format!("{id} ({})", column.label),
                        None => id.clone(),
                    })
                    .collect();
                println!("{name:<24} {}", labelled.join(", "));
            }
            println!("\n{} categories", catalog.categories().count());
        }
        Commands::Score { percent } => {
            let fraction = percent / 100.0;
            let band = QualityBand::for_percent(percent);
            println!(
                "{percent}% -> {:.2} ({band}, from {}%)",
                threshold_score(fraction),
                band.lower_bound_pct()
            );
        }
    }

    Ok(())
}
