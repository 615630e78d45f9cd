use std::path::PathBuf;
use wellcat_core::classify::RunOptions;
use wellcat_core::error::WellcatError;

use crate::output;
use crate::DatabaseArgs;

pub fn run(
    input_file: PathBuf,
    database: &DatabaseArgs,
    table: Option<PathBuf>,
    output_format: &str,
    show_all: bool,
    trace: bool,
) -> Result<(), WellcatError> {
    let config = super::load_database(database)?;
    let category_table = super::load_category_table(table, &config)?;
    let wells = super::load_wells(&input_file)?;
    tracing::info!(wells = wells.len(), file = %input_file.display(), "loaded wells");

    let options = RunOptions { trace };
    let result = wellcat_core::classify_wells(&wells, &category_table, &config, &options)?;

    match output_format {
        "json" => output::json::print(&result)?,
        _ => output::table::print_run(&result, show_all, trace),
    }

    Ok(())
}
