//! Category table coverage audit.
//!
//! Groups a batch of wells by canonical lookup key and lists every key the
//! table cannot resolve, so gaps can be filled before a report is produced.

use crate::classify::lookup::CategoryLookup;
use crate::model::{Category, LookupKey, WellRecord};
use crate::normalize::resolve_well_type;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of example well ids kept per missing pattern.
const EXAMPLE_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingPattern {
    pub key: LookupKey,
    pub wells: usize,
    /// Category the run would substitute.
    pub default_category: Category,
    pub example_well_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub database: String,
    pub total_wells: usize,
    pub distinct_keys: usize,
    pub matched_keys: usize,
    /// Missing patterns, most frequent first.
    pub missing: Vec<MissingPattern>,
    /// Wells covered by a missing pattern.
    pub affected_wells: usize,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Share of wells whose key resolves, in percent.
    pub fn well_coverage_pct(&self) -> f64 {
        if self.total_wells == 0 {
            return 100.0;
        }
        let covered = self.total_wells - self.affected_wells;
        covered as f64 * 100.0 / self.total_wells as f64
    }
}

/// Audit how well `lookup` covers the keys produced by `wells`.
///
/// A key counts as covered when it resolves directly or after LIMS
/// normalization.
pub fn coverage(wells: &[WellRecord], lookup: &CategoryLookup) -> CoverageReport {
    let mut groups: BTreeMap<LookupKey, Vec<&str>> = BTreeMap::new();
    for well in wells {
        let well_type = resolve_well_type(well, lookup.config());
        let key = LookupKey::new(
            well_type,
            well.error_code.as_deref(),
            well.resolution_codes.as_deref(),
            well.lims_status.as_deref(),
        );
        groups.entry(key).or_default().push(&well.well_id);
    }

    let distinct_keys = groups.len();
    let mut missing = Vec::new();
    for (key, ids) in groups {
        let resolution = lookup.resolve_key(&key);
        if resolution.matched {
            continue;
        }
        missing.push(MissingPattern {
            default_category: resolution.category,
            wells: ids.len(),
            example_well_ids: ids.iter().take(EXAMPLE_LIMIT).map(|s| s.to_string()).collect(),
            key,
        });
    }
    missing.sort_by(|a, b| b.wells.cmp(&a.wells));

    let affected_wells = missing.iter().map(|m| m.wells).sum();
    tracing::info!(
        distinct_keys,
        missing = missing.len(),
        affected_wells,
        "coverage audit complete"
    );

    CoverageReport {
        database: lookup.config().name.clone(),
        total_wells: wells.len(),
        distinct_keys,
        matched_keys: distinct_keys - missing.len(),
        missing,
        affected_wells,
    }
}
