pub mod schema;

use crate::error::WellcatError;
use crate::model::{Category, LookupKey, WellType};
use schema::{CategoryRow, CategoryTable, RawRow, REQUIRED_COLUMNS};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

/// Load a category table from a delimited text file.
pub fn load_table(path: &Path) -> Result<CategoryTable, WellcatError> {
    let content = std::fs::read_to_string(path).map_err(|e| WellcatError::TableLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut table = parse_table_str(&content)?;
    table.source = Some(path.to_path_buf());
    Ok(table)
}

/// Parse a category table from text.
///
/// Leading lines starting with `#` (and blank lines between them) are kept as
/// the preamble and skipped before the header row. After the header a `#`
/// line is an ordinary row and fails validation. The delimiter is a comma,
/// or a tab when the header row contains tabs but no commas.
pub fn parse_table_str(text: &str) -> Result<CategoryTable, WellcatError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut preamble = Vec::new();
    let mut offset: u64 = 0;
    let mut header_start = text.len();
    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix('#') {
            preamble.push(comment.trim().to_string());
        } else if !trimmed.is_empty() {
            header_start = pos;
            break;
        }
        pos += line.len();
        offset += 1;
    }

    let body = &text[header_start..];
    let header_line = body.lines().next().unwrap_or("");
    if header_line.trim().is_empty() {
        return Err(WellcatError::TableRow {
            line: offset + 1,
            reason: "missing header row".into(),
        });
    }
    let delimiter = if header_line.contains('\t') && !header_line.contains(',') {
        b'\t'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| csv_row_error(&e, offset))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(WellcatError::TableRow {
                line: offset + 1,
                reason: format!("missing required column '{}'", column),
            });
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_row_error(&e, offset))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0) + offset;
        let raw: RawRow = record
            .deserialize(Some(&headers))
            .map_err(|e| WellcatError::TableRow {
                line,
                reason: e.to_string(),
            })?;
        rows.push(convert_row(raw, line)?);
    }

    if rows.is_empty() {
        tracing::warn!("category table has a header but no rows");
    }

    Ok(CategoryTable {
        source: None,
        preamble,
        rows,
    })
}

/// Index rows by canonical key, keeping the line of the first occurrence.
///
/// Identical repeats are accepted; a key mapped to two different categories
/// is a `ConflictingKey` error at the later line.
pub fn index_rows(
    rows: &[CategoryRow],
) -> Result<HashMap<LookupKey, (Category, u64)>, WellcatError> {
    let mut index: HashMap<LookupKey, (Category, u64)> = HashMap::new();
    for row in rows {
        match index.entry(row.key.clone()) {
            Entry::Occupied(existing) => {
                let (first, first_line) = *existing.get();
                if first != row.category {
                    return Err(WellcatError::ConflictingKey {
                        key: row.key.to_string(),
                        first: format!("{} (line {})", first, first_line),
                        second: row.category.to_string(),
                        line: row.line,
                    });
                }
            }
            Entry::Vacant(slot) => {
                slot.insert((row.category, row.line));
            }
        }
    }
    Ok(index)
}

fn convert_row(raw: RawRow, line: u64) -> Result<CategoryRow, WellcatError> {
    let well_type = WellType::parse(&raw.well_type).ok_or_else(|| WellcatError::TableRow {
        line,
        reason: format!(
            "unknown WELL_TYPE '{}' (expected SAMPLE or CONTROL)",
            raw.well_type
        ),
    })?;
    let category = Category::parse(&raw.category).ok_or_else(|| WellcatError::TableRow {
        line,
        reason: format!("unknown CATEGORY '{}'", raw.category),
    })?;

    Ok(CategoryRow {
        line,
        key: LookupKey::new(
            well_type,
            Some(&raw.error_code),
            Some(&raw.resolution_codes),
            Some(&raw.lims_status),
        ),
        category,
        error_message: non_empty(raw.error_message),
        occurrence_count: raw
            .occurrence_count
            .and_then(|c| c.trim().replace(',', "").parse().ok()),
        notes: non_empty(raw.notes),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn csv_row_error(e: &csv::Error, offset: u64) -> WellcatError {
    WellcatError::TableRow {
        line: e.position().map(|p| p.line()).unwrap_or(0) + offset,
        reason: e.to_string(),
    }
}
