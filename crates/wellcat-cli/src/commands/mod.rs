pub mod classify;
pub mod config;
pub mod coverage;
pub mod table;

use crate::DatabaseArgs;
use std::path::{Path, PathBuf};
use wellcat_core::config::builtin;
use wellcat_core::config::schema::DatabaseConfig;
use wellcat_core::error::WellcatError;
use wellcat_core::model::WellRecord;
use wellcat_core::table::schema::CategoryTable;

/// Resolve `--db` / `--config` into a database config.
pub fn load_database(args: &DatabaseArgs) -> Result<DatabaseConfig, WellcatError> {
    match (&args.db, &args.config) {
        (Some(name), _) => builtin::load_preset(name),
        (None, Some(path)) => wellcat_core::config::load_config(path),
        (None, None) => Err(WellcatError::ConfigInvalid(format!(
            "no database selected: pass --db <{}> or --config <FILE>",
            builtin::PRESETS.join("|")
        ))),
    }
}

/// Load the category table from `--table`, falling back to the config's table.
pub fn load_category_table(
    table: Option<PathBuf>,
    config: &DatabaseConfig,
) -> Result<CategoryTable, WellcatError> {
    let path = table
        .or_else(|| config.category_table.clone())
        .ok_or_else(|| {
            WellcatError::ConfigInvalid(format!(
                "no category table for '{}': pass --table or set category_table in the config",
                config.name
            ))
        })?;
    wellcat_core::table::load_table(&path)
}

pub fn load_wells(path: &Path) -> Result<Vec<WellRecord>, WellcatError> {
    let json = std::fs::read_to_string(path)?;
    wellcat_core::parse_wells(&json)
}
