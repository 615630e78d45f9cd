use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WellType {
    Sample,
    Control,
}

impl fmt::Display for WellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl WellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WellType::Sample => "SAMPLE",
            WellType::Control => "CONTROL",
        }
    }

    /// Parse the canonical table spelling (`SAMPLE` / `CONTROL`), ignoring case.
    pub fn parse(s: &str) -> Option<WellType> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("SAMPLE") {
            Some(WellType::Sample)
        } else if trimmed.eq_ignore_ascii_case("CONTROL") {
            Some(WellType::Control)
        } else {
            None
        }
    }
}

/// The family a category belongs to.
///
/// Each family routes to its own group of report buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFamily {
    Discrepancy,
    SopError,
    ValidResult,
    Special,
}

impl CategoryFamily {
    pub const ALL: [CategoryFamily; 4] = [
        CategoryFamily::Discrepancy,
        CategoryFamily::SopError,
        CategoryFamily::ValidResult,
        CategoryFamily::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFamily::Discrepancy => "discrepancy",
            CategoryFamily::SopError => "sop_error",
            CategoryFamily::ValidResult => "valid_result",
            CategoryFamily::Special => "special",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    DiscrepInError,
    DiscrepIgnored,
    DiscrepResultChanged,
    DiscrepNeedsClsData,
    SopUnresolved,
    SopIgnored,
    SopRepeated,
    ValidDetected,
    ValidNotDetected,
    ValidControl,
    ValidOther,
    ControlAffectedSample,
    IgnoreWell,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::DiscrepInError,
        Category::DiscrepIgnored,
        Category::DiscrepResultChanged,
        Category::DiscrepNeedsClsData,
        Category::SopUnresolved,
        Category::SopIgnored,
        Category::SopRepeated,
        Category::ValidDetected,
        Category::ValidNotDetected,
        Category::ValidControl,
        Category::ValidOther,
        Category::ControlAffectedSample,
        Category::IgnoreWell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DiscrepInError => "DISCREP_IN_ERROR",
            Category::DiscrepIgnored => "DISCREP_IGNORED",
            Category::DiscrepResultChanged => "DISCREP_RESULT_CHANGED",
            Category::DiscrepNeedsClsData => "DISCREP_NEEDS_CLS_DATA",
            Category::SopUnresolved => "SOP_UNRESOLVED",
            Category::SopIgnored => "SOP_IGNORED",
            Category::SopRepeated => "SOP_REPEATED",
            Category::ValidDetected => "VALID_DETECTED",
            Category::ValidNotDetected => "VALID_NOT_DETECTED",
            Category::ValidControl => "VALID_CONTROL",
            Category::ValidOther => "VALID_OTHER",
            Category::ControlAffectedSample => "CONTROL_AFFECTED_SAMPLE",
            Category::IgnoreWell => "IGNORE_WELL",
        }
    }

    /// Parse a category label as written in a category table.
    ///
    /// `NO_CONTROLS` is an older label for wells whose run lacked usable
    /// controls; it is treated as `CONTROL_AFFECTED_SAMPLE`.
    pub fn parse(s: &str) -> Option<Category> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "NO_CONTROLS" {
            return Some(Category::ControlAffectedSample);
        }
        Category::ALL.into_iter().find(|c| c.as_str() == upper)
    }

    pub fn family(&self) -> CategoryFamily {
        match self {
            Category::DiscrepInError
            | Category::DiscrepIgnored
            | Category::DiscrepResultChanged
            | Category::DiscrepNeedsClsData => CategoryFamily::Discrepancy,
            Category::SopUnresolved | Category::SopIgnored | Category::SopRepeated => {
                CategoryFamily::SopError
            }
            Category::ValidDetected
            | Category::ValidNotDetected
            | Category::ValidControl
            | Category::ValidOther => CategoryFamily::ValidResult,
            Category::ControlAffectedSample | Category::IgnoreWell => CategoryFamily::Special,
        }
    }

    /// Whether the category must pass through the discrepancy classifier before routing.
    ///
    /// `CONTROL_AFFECTED_SAMPLE` and `IGNORE_WELL` are terminal and never do.
    pub fn needs_discrepancy_resolution(&self) -> bool {
        matches!(self, Category::DiscrepNeedsClsData)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Exact-match key of the category table.
///
/// Always built through [`LookupKey::new`], which folds empty values and
/// canonicalizes resolution codes, so two keys compare equal exactly when
/// they denote the same table row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LookupKey {
    pub well_type: WellType,
    pub error_code: String,
    pub resolution_codes: String,
    pub lims_status: String,
}

impl LookupKey {
    pub fn new(
        well_type: WellType,
        error_code: Option<&str>,
        resolution_codes: Option<&str>,
        lims_status: Option<&str>,
    ) -> LookupKey {
        LookupKey {
            well_type,
            error_code: crate::normalize::fold_empty(error_code),
            resolution_codes: crate::normalize::canonical_resolution_codes(resolution_codes),
            lims_status: crate::normalize::fold_empty(lims_status),
        }
    }

    /// Same key with a different LIMS status.
    pub fn with_lims(&self, lims_status: &str) -> LookupKey {
        LookupKey {
            lims_status: lims_status.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_none(s: &str) -> &str {
            if s.is_empty() {
                "(none)"
            } else {
                s
            }
        }
        write!(
            f,
            "{} error_code={} resolution={} lims={}",
            self.well_type,
            or_none(&self.error_code),
            or_none(&self.resolution_codes),
            or_none(&self.lims_status)
        )
    }
}

/// Outcome of the discrepancy decision procedure for one well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalBucket {
    ActedUpon,
    Ignored,
    SamplesRepeated,
}

impl ClinicalBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalBucket::ActedUpon => "acted_upon",
            ClinicalBucket::Ignored => "ignored",
            ClinicalBucket::SamplesRepeated => "samples_repeated",
        }
    }
}

impl fmt::Display for ClinicalBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One assay target's result inside a (possibly multiplexed) well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub target_id: String,
    #[serde(default)]
    pub target_name: Option<String>,
    /// Internal-control targets never count towards discrepancy decisions.
    #[serde(default)]
    pub is_internal_control: bool,
    /// Automated caller classification.
    #[serde(default)]
    pub machine_cls: Option<i32>,
    /// Human-reviewed final classification.
    #[serde(default)]
    pub final_cls: Option<i32>,
    /// AI-assist classification.
    #[serde(default)]
    pub dxai_cls: Option<i32>,
}

/// A physical reaction well as delivered by the extraction layer.
///
/// Read-only for the duration of a run; classification output is carried
/// separately in `ClassifiedWell`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellRecord {
    pub well_id: String,
    #[serde(default)]
    pub sample_name: Option<String>,
    #[serde(default)]
    pub mix_name: Option<String>,
    /// Raw role alias from the LIMS (e.g. "Patient", "NTC", "QS1 | HSV").
    #[serde(default)]
    pub role: Option<String>,
    /// Upstream-computed well type; takes precedence over role-based detection.
    #[serde(default)]
    pub well_type: Option<WellType>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub resolution_codes: Option<String>,
    #[serde(default)]
    pub lims_status: Option<String>,
    #[serde(default)]
    pub observations: Vec<ObservationRecord>,
}

impl WellRecord {
    /// Observations that may contribute to discrepancy decisions.
    pub fn clinical_observations(&self) -> impl Iterator<Item = &ObservationRecord> {
        self.observations.iter().filter(|o| !o.is_internal_control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_roundtrip() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!(
            Category::parse(" valid_detected "),
            Some(Category::ValidDetected)
        );
        assert_eq!(Category::parse("NOT_A_CATEGORY"), None);
    }

    #[test]
    fn test_no_controls_alias() {
        assert_eq!(
            Category::parse("NO_CONTROLS"),
            Some(Category::ControlAffectedSample)
        );
    }

    #[test]
    fn test_families() {
        assert_eq!(
            Category::DiscrepNeedsClsData.family(),
            CategoryFamily::Discrepancy
        );
        assert_eq!(Category::SopRepeated.family(), CategoryFamily::SopError);
        assert_eq!(Category::ValidOther.family(), CategoryFamily::ValidResult);
        assert_eq!(Category::IgnoreWell.family(), CategoryFamily::Special);
    }

    #[test]
    fn test_only_needs_cls_data_is_resolved_further() {
        let pending: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| c.needs_discrepancy_resolution())
            .collect();
        assert_eq!(pending, vec![Category::DiscrepNeedsClsData]);
    }

    #[test]
    fn test_well_type_parse() {
        assert_eq!(WellType::parse("sample"), Some(WellType::Sample));
        assert_eq!(WellType::parse(" CONTROL"), Some(WellType::Control));
        assert_eq!(WellType::parse("Patient"), None);
    }

    #[test]
    fn test_lookup_key_canonicalizes() {
        let a = LookupKey::new(WellType::Sample, Some(""), Some("WG12S,SKIP"), Some("[]"));
        let b = LookupKey::new(WellType::Sample, None, Some("skip, wg12s"), None);
        assert_eq!(a, b);
        assert_eq!(a.resolution_codes, "SKIP,WG12S");
        assert_eq!(a.lims_status, "");
    }

    #[test]
    fn test_lookup_key_display() {
        let key = LookupKey::new(WellType::Control, Some("FAILED_POS_WELL"), None, None);
        assert_eq!(
            key.to_string(),
            "CONTROL error_code=FAILED_POS_WELL resolution=(none) lims=(none)"
        );
    }

    #[test]
    fn test_well_record_deserializes_with_defaults() {
        let json = r#"{ "well_id": "w1", "lims_status": "DETECTED" }"#;
        let well: WellRecord = serde_json::from_str(json).unwrap();
        assert_eq!(well.well_id, "w1");
        assert!(well.error_code.is_none());
        assert!(well.observations.is_empty());
    }

    #[test]
    fn test_clinical_observations_skip_ic() {
        let obs = |id: &str, ic: bool| ObservationRecord {
            target_id: id.into(),
            target_name: None,
            is_internal_control: ic,
            machine_cls: Some(1),
            final_cls: Some(0),
            dxai_cls: None,
        };
        let well = WellRecord {
            well_id: "w1".into(),
            sample_name: None,
            mix_name: None,
            role: None,
            well_type: None,
            error_code: None,
            resolution_codes: None,
            lims_status: None,
            observations: vec![obs("t1", false), obs("ic", true)],
        };
        let ids: Vec<&str> = well
            .clinical_observations()
            .map(|o| o.target_id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1"]);
    }
}
