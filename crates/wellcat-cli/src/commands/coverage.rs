use std::path::PathBuf;
use wellcat_core::classify::CategoryLookup;
use wellcat_core::error::WellcatError;

use crate::output;
use crate::DatabaseArgs;

/// Returns whether every well pattern is covered by the table.
pub fn run(
    input_file: PathBuf,
    database: &DatabaseArgs,
    table: Option<PathBuf>,
    output_format: &str,
) -> Result<bool, WellcatError> {
    let config = super::load_database(database)?;
    let category_table = super::load_category_table(table, &config)?;
    let lookup = CategoryLookup::from_table(&category_table, &config)?;
    let wells = super::load_wells(&input_file)?;

    let report = wellcat_core::coverage::coverage(&wells, &lookup);

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_coverage(&report),
    }

    Ok(report.is_complete())
}
