use crate::classify::lookup::CategoryLookup;
use crate::config::schema::DiscrepancyPolicy;
use crate::model::{ClinicalBucket, WellRecord, WellType};
use crate::normalize::{canonical_resolution_codes, fold_empty, normalize_lims};
use serde::{Deserialize, Serialize};

/// Resolution token that marks a manually adjusted classification.
pub const BLA_TOKEN: &str = "BLA";

/// LIMS substring that marks a reportable result (matches `NOT DETECTED` too).
pub const VALID_LIMS_MARKER: &str = "DETECTED";

/// The three checks behind a clinical bucket decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyChecks {
    pub has_changed_result: bool,
    pub has_bla_resolution: bool,
    pub has_valid_lims: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyDecision {
    pub bucket: ClinicalBucket,
    pub checks: DiscrepancyChecks,
    /// LIMS status after database normalization.
    pub normalized_lims: String,
}

/// What the classifier did with one well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscrepancyOutcome {
    /// Error code is attributed to a failed control; the well belongs to the
    /// controls appendix and never to a discrepancy bucket.
    ControlAttributed,
    /// No non-IC observation disagrees with the machine call.
    NotEligible,
    Bucketed(DiscrepancyDecision),
}

/// A well is a discrepancy candidate when it is a sample and at least one
/// non-internal-control observation disagrees with the machine call under
/// either the detection or the change comparator. A present AI call must not
/// hide a final call that changed the result.
pub fn is_eligible(well: &WellRecord, well_type: WellType, policy: &DiscrepancyPolicy) -> bool {
    well_type == WellType::Sample
        && well.clinical_observations().any(|obs| {
            policy.detection_comparator.differs(obs) || policy.change_comparator.differs(obs)
        })
}

pub fn evaluate_checks(well: &WellRecord, lookup: &CategoryLookup) -> DiscrepancyChecks {
    let policy = &lookup.config().discrepancy;

    // OR over every clinical observation; IC targets never count.
    let has_changed_result = well
        .clinical_observations()
        .any(|obs| policy.change_comparator.differs(obs));

    let codes = canonical_resolution_codes(well.resolution_codes.as_deref());
    let has_bla_resolution = codes.contains(BLA_TOKEN);

    let lims = normalize_lims(&fold_empty(well.lims_status.as_deref()), lookup.config());
    let has_valid_lims = lims.to_ascii_uppercase().contains(VALID_LIMS_MARKER);

    DiscrepancyChecks {
        has_changed_result,
        has_bla_resolution,
        has_valid_lims,
    }
}

/// First match wins; everything else was reviewed and re-run.
pub fn decide(checks: &DiscrepancyChecks) -> ClinicalBucket {
    match (
        checks.has_changed_result,
        checks.has_bla_resolution,
        checks.has_valid_lims,
    ) {
        (true, true, true) => ClinicalBucket::ActedUpon,
        (false, true, true) => ClinicalBucket::Ignored,
        _ => ClinicalBucket::SamplesRepeated,
    }
}

/// Run the full discrepancy procedure for one well.
///
/// The control-attribution exclusion is resolved through the lookup's
/// `CONTROL_AFFECTED_SAMPLE` rows and is checked before eligibility.
pub fn classify(
    well: &WellRecord,
    well_type: WellType,
    lookup: &CategoryLookup,
) -> DiscrepancyOutcome {
    if well_type == WellType::Sample
        && lookup.is_control_attributed(&fold_empty(well.error_code.as_deref()))
    {
        return DiscrepancyOutcome::ControlAttributed;
    }
    if !is_eligible(well, well_type, &lookup.config().discrepancy) {
        return DiscrepancyOutcome::NotEligible;
    }

    let checks = evaluate_checks(well, lookup);
    DiscrepancyOutcome::Bucketed(DiscrepancyDecision {
        bucket: decide(&checks),
        checks,
        normalized_lims: normalize_lims(&fold_empty(well.lims_status.as_deref()), lookup.config()),
    })
}
