use crate::classify::discrepancy::DiscrepancyChecks;
use crate::classify::router::Bucket;
use crate::model::{Category, ClinicalBucket, LookupKey, WellType};
use crate::trace::TraceBundle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification of a single well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedWell {
    pub well_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix_name: Option<String>,
    pub well_type: WellType,
    /// Canonical key used for the table lookup.
    pub key: LookupKey,
    /// False when the looked-up category is the substituted default.
    pub matched: bool,
    /// Category returned by the table (or the default on a miss).
    pub looked_up: Category,
    /// Category after discrepancy handling; equals `looked_up` for most wells.
    pub category: Category,
    /// Present only for discrepancy-eligible wells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_bucket: Option<ClinicalBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<DiscrepancyChecks>,
    pub bucket: Bucket,
    /// Human-readable explanation of the assignment.
    pub reason: String,
}

/// A lookup key that missed the table, with the default it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingKey {
    pub key: LookupKey,
    pub substituted: Category,
    /// Number of wells in the run that produced this key.
    pub occurrences: usize,
}

/// A well id seen more than once in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateWell {
    pub well_id: String,
    pub kept: Bucket,
    pub dropped: Bucket,
}

/// Recoverable problems found during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Wells whose key missed the table.
    pub miss_count: usize,
    /// Distinct missing keys, most frequent first.
    pub missing_keys: Vec<MissingKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_wells: Vec<DuplicateWell>,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.miss_count == 0 && self.duplicate_wells.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyCounts {
    pub acted_upon: usize,
    pub samples_repeated: usize,
    pub ignored: usize,
}

impl DiscrepancyCounts {
    pub fn total(&self) -> usize {
        self.acted_upon + self.samples_repeated + self.ignored
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub database: String,
    pub total_wells: usize,
    /// Wells per bucket. Every bucket is listed, including empty ones.
    pub bucket_counts: BTreeMap<Bucket, usize>,
    pub discrepancies: DiscrepancyCounts,
    pub unique_samples: usize,
}

/// Per-mix valid-result and error statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixStats {
    pub mix_name: String,
    pub samples_detected: usize,
    pub samples_not_detected: usize,
    pub controls_passed: usize,
    pub controls_total: usize,
    pub total_samples: usize,
    /// All SOP-error wells (unresolved, error ignored, test repeated).
    pub sop_errors: usize,
    /// SOP errors that affected the result: unresolved + test repeated.
    pub sop_errors_affected: usize,
    /// All discrepancy wells.
    pub classification_errors: usize,
    /// Discrepancies that affected the result: acted upon + samples repeated.
    pub classification_errors_affected: usize,
    pub samples_affected_by_controls: usize,
}

/// Everything produced by one classification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub summary: RunSummary,
    pub mix_stats: Vec<MixStats>,
    pub diagnostics: Diagnostics,
    pub wells: Vec<ClassifiedWell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceBundle>,
}

impl RunResult {
    pub fn well(&self, well_id: &str) -> Option<&ClassifiedWell> {
        self.wells.iter().find(|w| w.well_id == well_id)
    }
}
