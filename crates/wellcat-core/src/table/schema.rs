use crate::model::{Category, LookupKey, WellType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Column names the lookup depends on.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "WELL_TYPE",
    "ERROR_CODE",
    "RESOLUTION_CODES",
    "WELL_LIMS_STATUS",
    "CATEGORY",
];

/// One row as it appears on disk. `ERROR_MESSAGE`, `OCCURRENCE_COUNT` and
/// `NOTES` are documentation and may be absent.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRow {
    #[serde(rename = "WELL_TYPE")]
    pub well_type: String,
    #[serde(rename = "ERROR_CODE")]
    pub error_code: String,
    #[serde(rename = "ERROR_MESSAGE", default)]
    pub error_message: Option<String>,
    #[serde(rename = "RESOLUTION_CODES")]
    pub resolution_codes: String,
    #[serde(rename = "WELL_LIMS_STATUS")]
    pub lims_status: String,
    #[serde(rename = "OCCURRENCE_COUNT", default)]
    pub occurrence_count: Option<String>,
    #[serde(rename = "CATEGORY")]
    pub category: String,
    #[serde(rename = "NOTES", default)]
    pub notes: Option<String>,
}

/// A validated category table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub key: LookupKey,
    pub category: Category,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub occurrence_count: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CategoryRow {
    pub fn new(
        well_type: WellType,
        error_code: &str,
        resolution_codes: &str,
        lims_status: &str,
        category: Category,
    ) -> CategoryRow {
        CategoryRow {
            line: 0,
            key: LookupKey::new(
                well_type,
                Some(error_code),
                Some(resolution_codes),
                Some(lims_status),
            ),
            category,
            error_message: None,
            occurrence_count: None,
            notes: None,
        }
    }
}

/// A parsed category table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryTable {
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Leading `#` comment lines, without the marker.
    #[serde(default)]
    pub preamble: Vec<String>,
    pub rows: Vec<CategoryRow>,
}
