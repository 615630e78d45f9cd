pub mod control;

use crate::config::schema::DatabaseConfig;

pub use control::{is_control, resolve_well_type};

/// Placeholder some category tables use for an empty cell.
pub const EMPTY_PLACEHOLDER: &str = "[]";

/// Fold every representation of "no value" to the empty string.
///
/// `None`, `""`, whitespace-only and the table placeholder `[]` are all empty.
/// Other values are returned trimmed.
pub fn fold_empty(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") | Some(EMPTY_PLACEHOLDER) => String::new(),
        Some(v) => v.to_string(),
    }
}

/// Canonicalize a comma-joined resolution code list.
///
/// Codes are trimmed and upper-cased, empty entries dropped, then sorted and
/// re-joined with `,`, so `"SKIP, WG12S"`, `"WG12S,SKIP"` and `"skip,wg12s"`
/// all become `"SKIP,WG12S"`.
pub fn canonical_resolution_codes(raw: Option<&str>) -> String {
    let folded = fold_empty(raw);
    let mut codes: Vec<String> = folded
        .split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    codes.sort();
    codes.join(",")
}

/// Map a raw LIMS status onto the database's canonical vocabulary.
///
/// Unknown statuses pass through unchanged so that later lookups surface the gap.
pub fn normalize_lims(raw: &str, config: &DatabaseConfig) -> String {
    match config.lims_normalization.get(raw) {
        Some(canonical) => canonical.clone(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::load_preset;

    #[test]
    fn test_fold_empty() {
        assert_eq!(fold_empty(None), "");
        assert_eq!(fold_empty(Some("")), "");
        assert_eq!(fold_empty(Some("   ")), "");
        assert_eq!(fold_empty(Some("[]")), "");
        assert_eq!(fold_empty(Some(" REAMP ")), "REAMP");
    }

    #[test]
    fn test_resolution_codes_order_and_case() {
        let expected = "SKIP,WG12S";
        assert_eq!(canonical_resolution_codes(Some("SKIP, WG12S")), expected);
        assert_eq!(canonical_resolution_codes(Some("WG12S,SKIP")), expected);
        assert_eq!(canonical_resolution_codes(Some("skip,wg12s")), expected);
    }

    #[test]
    fn test_resolution_codes_drop_empty_entries() {
        assert_eq!(canonical_resolution_codes(Some("BLA,,")), "BLA");
        assert_eq!(canonical_resolution_codes(Some("[]")), "");
        assert_eq!(canonical_resolution_codes(None), "");
    }

    #[test]
    fn test_normalize_lims_mapped() {
        let qst = load_preset("qst").unwrap();
        assert_eq!(normalize_lims("HSV1_DETECTED", &qst), "DETECTED");
        assert_eq!(normalize_lims("HSV_NOT_DETECTED", &qst), "NOT DETECTED");

        let notts = load_preset("notts").unwrap();
        assert_eq!(normalize_lims("<1500", &notts), "DETECTED");
    }

    #[test]
    fn test_normalize_lims_passthrough() {
        let vira = load_preset("vira").unwrap();
        assert_eq!(normalize_lims("REAMP", &vira), "REAMP");
        assert_eq!(normalize_lims("", &vira), "");
    }

    #[test]
    fn test_normalize_lims_is_per_database() {
        let vira = load_preset("vira").unwrap();
        assert_eq!(normalize_lims("HSV1_DETECTED", &vira), "HSV1_DETECTED");
    }
}
