use crate::classify::discrepancy::{self, DiscrepancyOutcome};
use crate::classify::lookup::CategoryLookup;
use crate::classify::outcome::{
    ClassifiedWell, Diagnostics, DiscrepancyCounts, DuplicateWell, MissingKey, MixStats,
    RunResult, RunSummary,
};
use crate::classify::router::{route, Assignment, Bucket, RoutingTable};
use crate::config::schema::DatabaseConfig;
use crate::error::WellcatError;
use crate::model::{Category, ClinicalBucket, LookupKey, WellRecord, WellType};
use crate::normalize::{fold_empty, normalize_lims, resolve_well_type};
use crate::trace::{
    build_diagnostic_warnings, build_well_decision, StepRecorder, TraceBundle, TraceStep,
    TraceStepType,
};
use std::collections::{BTreeMap, BTreeSet};

/// Mix label used for wells without a mix name.
pub const NO_MIX: &str = "(no mix)";

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Record per-well decision steps.
    pub trace: bool,
}

/// Classify a single well.
pub fn classify_well(
    well: &WellRecord,
    lookup: &CategoryLookup,
) -> Result<ClassifiedWell, WellcatError> {
    classify_recorded(well, lookup, &mut StepRecorder::disabled())
}

/// Classify a batch of wells.
///
/// Every input well id ends up in exactly one bucket. Lookup misses and
/// repeated well ids are collected into the run diagnostics instead of
/// failing the run.
pub fn classify_run(
    wells: &[WellRecord],
    lookup: &CategoryLookup,
    options: &RunOptions,
) -> Result<RunResult, WellcatError> {
    let mut classified: Vec<(ClassifiedWell, Option<Vec<TraceStep>>)> =
        Vec::with_capacity(wells.len());
    let mut keep = Vec::with_capacity(wells.len());
    let mut routing = RoutingTable::new();
    let mut duplicate_wells = Vec::new();

    for (position, well) in wells.iter().enumerate() {
        let mut recorder = if options.trace {
            StepRecorder::enabled()
        } else {
            StepRecorder::disabled()
        };
        let result = classify_recorded(well, lookup, &mut recorder)?;

        match routing.assign(&result.well_id, result.bucket, position) {
            Assignment::New => keep.push(true),
            Assignment::Replaced { previous, bucket } => {
                keep[previous] = false;
                keep.push(true);
                duplicate_wells.push(DuplicateWell {
                    well_id: result.well_id.clone(),
                    kept: result.bucket,
                    dropped: bucket,
                });
            }
            Assignment::Rejected { bucket, .. } => {
                keep.push(false);
                duplicate_wells.push(DuplicateWell {
                    well_id: result.well_id.clone(),
                    kept: bucket,
                    dropped: result.bucket,
                });
            }
        }
        classified.push((result, recorder.finish()));
    }

    for dup in &duplicate_wells {
        tracing::warn!(
            well_id = %dup.well_id,
            kept = %dup.kept,
            dropped = %dup.dropped,
            "duplicate well id in batch"
        );
    }

    // Misses on dropped duplicates are still reported.
    let diagnostics = collect_diagnostics(classified.iter().map(|(w, _)| w), duplicate_wells);

    let mut trace = options.trace.then(TraceBundle::default);
    let mut kept_wells = Vec::with_capacity(routing.len());
    for (index, ((well, steps), retained)) in classified.into_iter().zip(keep).enumerate() {
        if !retained {
            continue;
        }
        if let (Some(bundle), Some(steps)) = (trace.as_mut(), steps) {
            bundle.decisions.push(build_well_decision(index, &well, steps));
        }
        kept_wells.push(well);
    }

    for missing in &diagnostics.missing_keys {
        tracing::warn!(
            key = %missing.key,
            occurrences = missing.occurrences,
            substituted = %missing.substituted,
            "no category table row for key"
        );
    }
    if let Some(bundle) = trace.as_mut() {
        bundle.warnings = build_diagnostic_warnings(&diagnostics);
    }

    let summary = summarize(&kept_wells, &lookup.config().name);
    let mix_stats = mix_statistics(&kept_wells);

    tracing::info!(
        database = %summary.database,
        wells = summary.total_wells,
        misses = diagnostics.miss_count,
        discrepancies = summary.discrepancies.total(),
        "classification run complete"
    );

    Ok(RunResult {
        summary,
        mix_stats,
        diagnostics,
        wells: kept_wells,
        trace,
    })
}

fn classify_recorded(
    well: &WellRecord,
    lookup: &CategoryLookup,
    recorder: &mut StepRecorder,
) -> Result<ClassifiedWell, WellcatError> {
    let config = lookup.config();
    let well_type = resolve_well_type(well, config);
    recorder.push(TraceStepType::ControlDetection, || {
        match (well.well_type, well.role.as_deref()) {
            (Some(explicit), _) => format!("Well type {} given explicitly", explicit),
            (None, Some(role)) => format!("Role '{}' -> {}", role, well_type),
            (None, None) => format!("No role; defaulted to {}", well_type),
        }
    });

    let resolution = lookup.resolve(
        well_type,
        well.error_code.as_deref(),
        well.resolution_codes.as_deref(),
        well.lims_status.as_deref(),
    );
    if resolution.via_normalized_lims {
        recorder.push(TraceStepType::LimsNormalization, || {
            format!(
                "LIMS '{}' normalized to '{}'",
                resolution.key.lims_status,
                normalize_lims(&resolution.key.lims_status, config)
            )
        });
    }
    if resolution.matched {
        recorder.push(TraceStepType::Lookup, || {
            format!("Table row {} -> {}", resolution.key, resolution.category)
        });
    } else {
        recorder.push(TraceStepType::Fallback, || {
            format!(
                "No table row for {}; defaulted to {}",
                resolution.key, resolution.category
            )
        });
    }

    let mut category = resolution.category;
    let mut clinical_bucket = None;
    let mut checks = None;
    let reason = if category.needs_discrepancy_resolution() {
        match discrepancy::classify(well, well_type, lookup) {
            DiscrepancyOutcome::ControlAttributed => {
                category = Category::ControlAffectedSample;
                let message = format!(
                    "Error code {} is attributed to a failed control",
                    resolution.key.error_code
                );
                recorder.push(TraceStepType::ControlAttribution, || message.clone());
                message
            }
            DiscrepancyOutcome::NotEligible => {
                category = ineligible_category(well, well_type, config);
                let message = format!(
                    "No clinical observation disagrees with the machine call; resolved to {}",
                    category
                );
                recorder.push(TraceStepType::Eligibility, || message.clone());
                message
            }
            DiscrepancyOutcome::Bucketed(decision) => {
                recorder.push(TraceStepType::Eligibility, || {
                    "Clinical observation disagrees with the machine call".to_string()
                });
                let message = format!(
                    "changed={} bla={} valid_lims={} (lims '{}') -> {}",
                    decision.checks.has_changed_result,
                    decision.checks.has_bla_resolution,
                    decision.checks.has_valid_lims,
                    decision.normalized_lims,
                    decision.bucket
                );
                recorder.push(TraceStepType::DiscrepancyDecision, || message.clone());
                clinical_bucket = Some(decision.bucket);
                checks = Some(decision.checks);
                message
            }
        }
    } else if resolution.matched {
        format!("{} -> {}", resolution.key, category)
    } else {
        format!("{} not in table; defaulted to {}", resolution.key, category)
    };

    let bucket = route(category, clinical_bucket, &well.well_id)?;
    recorder.push(TraceStepType::Routing, || format!("{} -> {}", category, bucket));

    tracing::debug!(
        well_id = %well.well_id,
        category = %category,
        bucket = %bucket,
        matched = resolution.matched,
        "classified well"
    );

    Ok(ClassifiedWell {
        well_id: well.well_id.clone(),
        sample_name: well.sample_name.clone(),
        mix_name: well.mix_name.clone(),
        well_type,
        key: resolution.key,
        matched: resolution.matched,
        looked_up: resolution.category,
        category,
        clinical_bucket,
        checks,
        bucket,
        reason,
    })
}

/// Valid-result category for a needs-data well that is not a discrepancy
/// candidate, decided from its normalized LIMS status.
pub fn ineligible_category(
    well: &WellRecord,
    well_type: WellType,
    config: &DatabaseConfig,
) -> Category {
    if well_type == WellType::Control {
        return Category::ValidControl;
    }
    let lims = normalize_lims(&fold_empty(well.lims_status.as_deref()), config).to_ascii_uppercase();
    if lims.contains("NOT DETECTED") {
        Category::ValidNotDetected
    } else if lims.contains("DETECTED") {
        Category::ValidDetected
    } else {
        Category::ValidOther
    }
}

fn collect_diagnostics<'a>(
    wells: impl IntoIterator<Item = &'a ClassifiedWell>,
    duplicate_wells: Vec<DuplicateWell>,
) -> Diagnostics {
    let mut misses: BTreeMap<&LookupKey, (Category, usize)> = BTreeMap::new();
    for well in wells.into_iter().filter(|w| !w.matched) {
        misses.entry(&well.key).or_insert((well.looked_up, 0)).1 += 1;
    }
    let miss_count = misses.values().map(|(_, n)| n).sum();

    let mut missing_keys: Vec<MissingKey> = misses
        .into_iter()
        .map(|(key, (substituted, occurrences))| MissingKey {
            key: key.clone(),
            substituted,
            occurrences,
        })
        .collect();
    // Stable sort keeps key order among equal counts.
    missing_keys.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));

    Diagnostics {
        miss_count,
        missing_keys,
        duplicate_wells,
    }
}

pub fn summarize(wells: &[ClassifiedWell], database: &str) -> RunSummary {
    let mut bucket_counts: BTreeMap<Bucket, usize> =
        Bucket::ALL.iter().map(|b| (*b, 0)).collect();
    let mut discrepancies = DiscrepancyCounts::default();
    let mut samples = BTreeSet::new();

    for well in wells {
        *bucket_counts.entry(well.bucket).or_insert(0) += 1;
        match well.clinical_bucket {
            Some(ClinicalBucket::ActedUpon) => discrepancies.acted_upon += 1,
            Some(ClinicalBucket::SamplesRepeated) => discrepancies.samples_repeated += 1,
            Some(ClinicalBucket::Ignored) => discrepancies.ignored += 1,
            None => {}
        }
        if well.well_type == WellType::Sample {
            if let Some(name) = well.sample_name.as_deref().filter(|n| !n.trim().is_empty()) {
                samples.insert(name);
            }
        }
    }

    RunSummary {
        database: database.to_string(),
        total_wells: wells.len(),
        bucket_counts,
        discrepancies,
        unique_samples: samples.len(),
    }
}

/// Per-mix statistics, sorted by mix name. Excluded wells are not counted.
pub fn mix_statistics(wells: &[ClassifiedWell]) -> Vec<MixStats> {
    let mut by_mix: BTreeMap<&str, MixStats> = BTreeMap::new();

    for well in wells.iter().filter(|w| w.bucket != Bucket::Excluded) {
        let mix = well
            .mix_name
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(NO_MIX);
        let stats = by_mix.entry(mix).or_insert_with(|| MixStats {
            mix_name: mix.to_string(),
            ..Default::default()
        });

        match well.well_type {
            WellType::Sample => stats.total_samples += 1,
            WellType::Control => stats.controls_total += 1,
        }

        match well.bucket {
            Bucket::ValidSamplesDetected => stats.samples_detected += 1,
            Bucket::ValidSamplesNotDetected => stats.samples_not_detected += 1,
            Bucket::ValidControls => stats.controls_passed += 1,
            Bucket::Unresolved | Bucket::TestRepeated => {
                stats.sop_errors += 1;
                stats.sop_errors_affected += 1;
            }
            Bucket::ErrorIgnored => stats.sop_errors += 1,
            Bucket::DiscrepancyActedUpon | Bucket::DiscrepancySamplesRepeated => {
                stats.classification_errors += 1;
                stats.classification_errors_affected += 1;
            }
            Bucket::DiscrepancyIgnored => stats.classification_errors += 1,
            Bucket::ControlsAppendix if well.well_type == WellType::Sample => {
                stats.samples_affected_by_controls += 1
            }
            _ => {}
        }
    }

    by_mix.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::load_preset;
    use crate::model::ObservationRecord;
    use crate::table::schema::CategoryRow;

    fn lookup() -> CategoryLookup {
        let rows = vec![
            CategoryRow::new(WellType::Sample, "", "", "NOT DETECTED", Category::ValidNotDetected),
            CategoryRow::new(WellType::Sample, "", "", "DETECTED", Category::ValidDetected),
            CategoryRow::new(WellType::Control, "", "", "", Category::ValidControl),
            CategoryRow::new(WellType::Sample, "", "BLA", "DETECTED", Category::DiscrepNeedsClsData),
            CategoryRow::new(WellType::Control, "BLA", "", "", Category::DiscrepNeedsClsData),
            CategoryRow::new(
                WellType::Sample,
                "INH_CONTROL",
                "BLA",
                "DETECTED",
                Category::DiscrepNeedsClsData,
            ),
            CategoryRow::new(WellType::Sample, "INH_CONTROL", "", "", Category::ControlAffectedSample),
            CategoryRow::new(WellType::Sample, "", "", "REAMP", Category::SopRepeated),
        ];
        CategoryLookup::load(&rows, &load_preset("qst").unwrap()).unwrap()
    }

    fn well(id: &str, res: &str, lims: &str, changed: bool) -> WellRecord {
        WellRecord {
            well_id: id.into(),
            sample_name: Some(format!("S-{id}")),
            mix_name: Some("HSV".into()),
            role: Some("Patient".into()),
            well_type: None,
            error_code: None,
            resolution_codes: Some(res.into()),
            lims_status: Some(lims.into()),
            observations: vec![ObservationRecord {
                target_id: "HSV1".into(),
                target_name: None,
                is_internal_control: false,
                machine_cls: Some(1),
                final_cls: Some(if changed { 0 } else { 1 }),
                dxai_cls: None,
            }],
        }
    }

    #[test]
    fn test_plain_valid_well() {
        let w = well("A1", "", "NOT DETECTED", false);
        let result = classify_well(&w, &lookup()).unwrap();
        assert_eq!(result.category, Category::ValidNotDetected);
        assert_eq!(result.bucket, Bucket::ValidSamplesNotDetected);
        assert!(result.matched);
        assert!(result.clinical_bucket.is_none());
    }

    #[test]
    fn test_discrepancy_well_gets_clinical_bucket() {
        let w = well("A2", "BLA", "DETECTED", true);
        let result = classify_well(&w, &lookup()).unwrap();
        assert_eq!(result.looked_up, Category::DiscrepNeedsClsData);
        assert_eq!(result.clinical_bucket, Some(ClinicalBucket::ActedUpon));
        assert_eq!(result.bucket, Bucket::DiscrepancyActedUpon);
        assert!(result.checks.is_some());
    }

    #[test]
    fn test_changed_final_call_not_hidden_by_ai_call() {
        let mut w = well("A5", "BLA", "DETECTED", true);
        w.observations[0].dxai_cls = Some(1);
        let result = classify_well(&w, &lookup()).unwrap();
        assert_eq!(result.clinical_bucket, Some(ClinicalBucket::ActedUpon));
        assert_eq!(result.bucket, Bucket::DiscrepancyActedUpon);
    }

    #[test]
    fn test_ineligible_needs_data_resolves_from_lims() {
        let w = well("A3", "BLA", "DETECTED", false);
        let result = classify_well(&w, &lookup()).unwrap();
        assert_eq!(result.category, Category::ValidDetected);
        assert_eq!(result.bucket, Bucket::ValidSamplesDetected);
        assert!(result.clinical_bucket.is_none());
    }

    #[test]
    fn test_ineligible_control_resolves_to_valid_control() {
        let mut w = well("C1", "", "", true);
        w.role = Some("NTC".into());
        w.error_code = Some("BLA".into());
        let result = classify_well(&w, &lookup()).unwrap();
        assert_eq!(result.well_type, WellType::Control);
        assert_eq!(result.category, Category::ValidControl);
    }

    #[test]
    fn test_control_attributed_needs_data_goes_to_appendix() {
        let mut w = well("A4", "BLA", "DETECTED", true);
        w.error_code = Some("INH_CONTROL".into());
        let result = classify_well(&w, &lookup()).unwrap();
        assert_eq!(result.category, Category::ControlAffectedSample);
        assert_eq!(result.bucket, Bucket::ControlsAppendix);
        assert!(!result.bucket.is_discrepancy());
    }

    #[test]
    fn test_run_dedupes_by_priority() {
        let wells = vec![
            well("A1", "BLA", "DETECTED", false),
            well("A1", "BLA", "DETECTED", true),
            well("A2", "", "DETECTED", false),
        ];
        let run = classify_run(&wells, &lookup(), &RunOptions::default()).unwrap();
        assert_eq!(run.wells.len(), 2);
        assert_eq!(run.well("A1").unwrap().bucket, Bucket::DiscrepancyActedUpon);
        assert_eq!(run.diagnostics.duplicate_wells.len(), 1);
        assert_eq!(
            run.diagnostics.duplicate_wells[0].dropped,
            Bucket::ValidSamplesDetected
        );
    }

    #[test]
    fn test_run_collects_distinct_misses() {
        let mut odd = well("B1", "", "", false);
        odd.error_code = Some("WEIRD_CODE".into());
        let mut odd_again = odd.clone();
        odd_again.well_id = "B2".into();
        let mut blank = well("B3", "", "", false);
        blank.lims_status = None;

        let run = classify_run(&[odd, odd_again, blank], &lookup(), &RunOptions::default()).unwrap();
        assert_eq!(run.diagnostics.miss_count, 3);
        assert_eq!(run.diagnostics.missing_keys.len(), 2);
        let first = &run.diagnostics.missing_keys[0];
        assert_eq!(first.occurrences, 2);
        assert_eq!(first.substituted, Category::SopUnresolved);
        assert_eq!(run.summary.bucket_counts[&Bucket::Unresolved], 2);
        assert_eq!(run.summary.bucket_counts[&Bucket::Excluded], 1);
    }

    #[test]
    fn test_miss_on_dropped_duplicate_is_reported() {
        let kept = well("D1", "BLA", "DETECTED", true);
        let mut dropped = well("D1", "", "", false);
        dropped.error_code = Some("WEIRD_CODE".into());

        let run = classify_run(&[kept, dropped], &lookup(), &RunOptions::default()).unwrap();
        assert_eq!(run.well("D1").unwrap().bucket, Bucket::DiscrepancyActedUpon);
        assert_eq!(run.diagnostics.duplicate_wells[0].dropped, Bucket::Unresolved);
        assert_eq!(run.diagnostics.miss_count, 1);
        assert_eq!(run.diagnostics.missing_keys[0].key.error_code, "WEIRD_CODE");
    }

    #[test]
    fn test_mix_statistics() {
        let mut control = well("C1", "", "", false);
        control.role = Some("PC".into());
        let mut appendix = well("A9", "", "", false);
        appendix.error_code = Some("INH_CONTROL".into());
        let wells = vec![
            well("A1", "", "DETECTED", false),
            well("A2", "", "NOT DETECTED", false),
            well("A3", "BLA", "DETECTED", true),
            well("A4", "", "REAMP", false),
            control,
            appendix,
        ];
        let run = classify_run(&wells, &lookup(), &RunOptions::default()).unwrap();
        assert_eq!(run.mix_stats.len(), 1);
        let stats = &run.mix_stats[0];
        assert_eq!(stats.mix_name, "HSV");
        assert_eq!(stats.samples_detected, 1);
        assert_eq!(stats.samples_not_detected, 1);
        assert_eq!(stats.controls_passed, 1);
        assert_eq!(stats.controls_total, 1);
        assert_eq!(stats.total_samples, 5);
        assert_eq!(stats.sop_errors, 1);
        assert_eq!(stats.sop_errors_affected, 1);
        assert_eq!(stats.classification_errors, 1);
        assert_eq!(stats.classification_errors_affected, 1);
        assert_eq!(stats.samples_affected_by_controls, 1);
    }

    #[test]
    fn test_trace_only_when_requested() {
        let wells = vec![well("A1", "BLA", "DETECTED", true)];
        let run = classify_run(&wells, &lookup(), &RunOptions::default()).unwrap();
        assert!(run.trace.is_none());

        let run = classify_run(&wells, &lookup(), &RunOptions { trace: true }).unwrap();
        let trace = run.trace.unwrap();
        assert_eq!(trace.decisions.len(), 1);
        let steps: Vec<TraceStepType> =
            trace.decisions[0].steps.iter().map(|s| s.step_type).collect();
        assert!(steps.contains(&TraceStepType::DiscrepancyDecision));
        assert_eq!(steps.last(), Some(&TraceStepType::Routing));
    }
}
