use std::collections::BTreeMap;
use std::path::Path;
use wellcat_core::classify::CategoryLookup;
use wellcat_core::error::WellcatError;
use wellcat_core::model::{Category, CategoryFamily, WellType};
use wellcat_core::table::{index_rows, load_table};

use crate::DatabaseArgs;

pub fn validate(file: &Path, database: &DatabaseArgs) -> Result<(), WellcatError> {
    let table = load_table(file)?;
    println!(
        "Category table '{}' parsed: {} rows.",
        file.display(),
        table.rows.len()
    );

    if database.db.is_some() || database.config.is_some() {
        let config = super::load_database(database)?;
        let lookup = CategoryLookup::from_table(&table, &config)?;
        println!("  Database: {}", config.name);
        println!(
            "  Keys: {} explicit, {} with normalized LIMS variants",
            lookup.explicit_len(),
            lookup.len()
        );
        let codes: Vec<&str> = lookup
            .control_attribution_codes()
            .iter()
            .map(String::as_str)
            .collect();
        if codes.is_empty() {
            println!("  Control-attributed error codes: none");
        } else {
            println!("  Control-attributed error codes: {}", codes.join(", "));
        }
    } else {
        let keys = index_rows(&table.rows)?;
        println!("  Keys: {} (no conflicting duplicates)", keys.len());
    }

    let mut warnings = Vec::new();
    for row in &table.rows {
        if row.key.well_type == WellType::Control && row.category == Category::ControlAffectedSample {
            warnings.push(format!(
                "line {}: CONTROL row categorised {} is never used for sample exclusion",
                row.line, row.category
            ));
        }
        if row.category == Category::DiscrepNeedsClsData && row.key.well_type == WellType::Control {
            warnings.push(format!(
                "line {}: control wells are never discrepancy candidates; {} resolves to VALID_CONTROL",
                row.line, row.category
            ));
        }
    }
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

pub fn explain(file: &Path) -> Result<(), WellcatError> {
    let table = load_table(file)?;

    println!("{}\n", file.display());
    for line in &table.preamble {
        if !line.is_empty() {
            println!("  # {}", line);
        }
    }
    if !table.preamble.is_empty() {
        println!();
    }

    let mut by_category: BTreeMap<Category, (usize, u64)> = BTreeMap::new();
    for row in &table.rows {
        let entry = by_category.entry(row.category).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += row.occurrence_count.unwrap_or(0);
    }

    println!("  {:<26} {:>6} {:>12}", "Category", "Rows", "Occurrences");
    println!("  {}", "-".repeat(46));
    for family in CategoryFamily::ALL {
        let members: Vec<(Category, usize, u64)> = Category::ALL
            .into_iter()
            .filter(|c| c.family() == family)
            .filter_map(|c| by_category.get(&c).map(|(rows, occ)| (c, *rows, *occ)))
            .collect();
        if members.is_empty() {
            continue;
        }
        println!("  [{}]", family.as_str());
        for (category, rows, occurrences) in members {
            println!("  {:<26} {:>6} {:>12}", category, rows, occurrences);
        }
    }
    println!();

    let unused: Vec<&str> = Category::ALL
        .iter()
        .filter(|c| !by_category.contains_key(*c))
        .map(|c| c.as_str())
        .collect();
    if !unused.is_empty() {
        println!("  Categories without rows: {}\n", unused.join(", "));
    }

    Ok(())
}
