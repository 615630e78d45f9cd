pub mod classify;
pub mod config;
pub mod coverage;
pub mod error;
pub mod model;
pub mod normalize;
pub mod table;
pub mod trace;

use classify::{CategoryLookup, RunOptions, RunResult};
use config::schema::DatabaseConfig;
use error::WellcatError;
use model::WellRecord;
use table::schema::CategoryTable;

/// Main API entry point: classify a batch of wells against a category table.
///
/// Builds the lookup once (failing fast on a broken table) and then assigns
/// every well to exactly one bucket.
pub fn classify_wells(
    wells: &[WellRecord],
    table: &CategoryTable,
    config: &DatabaseConfig,
    options: &RunOptions,
) -> Result<RunResult, WellcatError> {
    let lookup = CategoryLookup::from_table(table, config)?;
    classify::classify_run(wells, &lookup, options)
}

/// Parse a JSON array of well records.
pub fn parse_wells(json: &str) -> Result<Vec<WellRecord>, WellcatError> {
    Ok(serde_json::from_str(json)?)
}
