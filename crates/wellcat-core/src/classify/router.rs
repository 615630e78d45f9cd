use crate::error::WellcatError;
use crate::model::{Category, ClinicalBucket};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Downstream report bucket. Every well ends in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "unresolved")]
    Unresolved,
    #[serde(rename = "resolved/error_ignored")]
    ErrorIgnored,
    #[serde(rename = "resolved/test_repeated")]
    TestRepeated,
    #[serde(rename = "discrepancy/acted_upon")]
    DiscrepancyActedUpon,
    #[serde(rename = "discrepancy/ignored")]
    DiscrepancyIgnored,
    #[serde(rename = "discrepancy/samples_repeated")]
    DiscrepancySamplesRepeated,
    #[serde(rename = "valid_results.samples_detected")]
    ValidSamplesDetected,
    #[serde(rename = "valid_results.samples_not_detected")]
    ValidSamplesNotDetected,
    #[serde(rename = "valid_results.controls")]
    ValidControls,
    #[serde(rename = "valid_results.other")]
    ValidOther,
    #[serde(rename = "controls_appendix")]
    ControlsAppendix,
    #[serde(rename = "excluded")]
    Excluded,
}

impl Bucket {
    pub const ALL: [Bucket; 12] = [
        Bucket::Unresolved,
        Bucket::ErrorIgnored,
        Bucket::TestRepeated,
        Bucket::DiscrepancyActedUpon,
        Bucket::DiscrepancyIgnored,
        Bucket::DiscrepancySamplesRepeated,
        Bucket::ValidSamplesDetected,
        Bucket::ValidSamplesNotDetected,
        Bucket::ValidControls,
        Bucket::ValidOther,
        Bucket::ControlsAppendix,
        Bucket::Excluded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Unresolved => "unresolved",
            Bucket::ErrorIgnored => "resolved/error_ignored",
            Bucket::TestRepeated => "resolved/test_repeated",
            Bucket::DiscrepancyActedUpon => "discrepancy/acted_upon",
            Bucket::DiscrepancyIgnored => "discrepancy/ignored",
            Bucket::DiscrepancySamplesRepeated => "discrepancy/samples_repeated",
            Bucket::ValidSamplesDetected => "valid_results.samples_detected",
            Bucket::ValidSamplesNotDetected => "valid_results.samples_not_detected",
            Bucket::ValidControls => "valid_results.controls",
            Bucket::ValidOther => "valid_results.other",
            Bucket::ControlsAppendix => "controls_appendix",
            Bucket::Excluded => "excluded",
        }
    }

    pub fn is_discrepancy(&self) -> bool {
        matches!(
            self,
            Bucket::DiscrepancyActedUpon
                | Bucket::DiscrepancyIgnored
                | Bucket::DiscrepancySamplesRepeated
        )
    }

    /// Rank used to pick one assignment for a repeated well id. Lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Bucket::DiscrepancyActedUpon => 0,
            Bucket::DiscrepancySamplesRepeated => 1,
            Bucket::DiscrepancyIgnored => 2,
            Bucket::Unresolved => 3,
            Bucket::ErrorIgnored => 4,
            Bucket::TestRepeated => 5,
            Bucket::ValidSamplesDetected => 6,
            Bucket::ValidSamplesNotDetected => 7,
            Bucket::ValidControls => 8,
            Bucket::ValidOther => 9,
            Bucket::ControlsAppendix => 10,
            Bucket::Excluded => 11,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<ClinicalBucket> for Bucket {
    fn from(clinical: ClinicalBucket) -> Self {
        match clinical {
            ClinicalBucket::ActedUpon => Bucket::DiscrepancyActedUpon,
            ClinicalBucket::Ignored => Bucket::DiscrepancyIgnored,
            ClinicalBucket::SamplesRepeated => Bucket::DiscrepancySamplesRepeated,
        }
    }
}

/// Map a resolved category to its bucket.
///
/// The table is static. `DISCREP_NEEDS_CLS_DATA` only routes once the
/// discrepancy classifier has produced a clinical bucket; without one this
/// returns `UnresolvedDiscrepancy`.
pub fn route(
    category: Category,
    clinical: Option<ClinicalBucket>,
    well_id: &str,
) -> Result<Bucket, WellcatError> {
    let bucket = match category {
        Category::SopUnresolved | Category::DiscrepInError => Bucket::Unresolved,
        Category::SopIgnored | Category::DiscrepIgnored => Bucket::ErrorIgnored,
        Category::SopRepeated | Category::DiscrepResultChanged => Bucket::TestRepeated,
        Category::ValidDetected => Bucket::ValidSamplesDetected,
        Category::ValidNotDetected => Bucket::ValidSamplesNotDetected,
        Category::ValidControl => Bucket::ValidControls,
        Category::ValidOther => Bucket::ValidOther,
        Category::ControlAffectedSample => Bucket::ControlsAppendix,
        Category::IgnoreWell => Bucket::Excluded,
        Category::DiscrepNeedsClsData => match clinical {
            Some(clinical) => Bucket::from(clinical),
            None => {
                return Err(WellcatError::UnresolvedDiscrepancy {
                    well_id: well_id.to_string(),
                })
            }
        },
    };
    Ok(bucket)
}

/// Result of offering a bucket for a well id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// First assignment for this id.
    New,
    /// Took over from the assignment at this position.
    Replaced { previous: usize, bucket: Bucket },
    /// An existing assignment at this position outranks the offer.
    Rejected { kept: usize, bucket: Bucket },
}

/// One bucket per well id across a batch.
#[derive(Debug, Default)]
pub struct RoutingTable {
    slots: HashMap<String, (usize, Bucket)>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `bucket` for `well_id`, where `position` identifies the offer.
    /// Ties keep the earlier assignment.
    pub fn assign(&mut self, well_id: &str, bucket: Bucket, position: usize) -> Assignment {
        match self.slots.get_mut(well_id) {
            None => {
                self.slots.insert(well_id.to_string(), (position, bucket));
                Assignment::New
            }
            Some(slot) => {
                let (held_position, held_bucket) = *slot;
                if bucket.priority() < held_bucket.priority() {
                    *slot = (position, bucket);
                    Assignment::Replaced {
                        previous: held_position,
                        bucket: held_bucket,
                    }
                } else {
                    Assignment::Rejected {
                        kept: held_position,
                        bucket: held_bucket,
                    }
                }
            }
        }
    }

    pub fn bucket_of(&self, well_id: &str) -> Option<Bucket> {
        self.slots.get(well_id).map(|(_, bucket)| *bucket)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
