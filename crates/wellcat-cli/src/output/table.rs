use wellcat_core::classify::{Bucket, ClassifiedWell, RunResult};
use wellcat_core::coverage::CoverageReport;

pub fn print_run(result: &RunResult, show_all: bool, trace: bool) {
    let summary = &result.summary;
    println!("=== {} ===\n", summary.database);
    println!(
        "  Wells: {} ({} unique samples)\n",
        summary.total_wells, summary.unique_samples
    );

    println!("  Buckets:");
    for (bucket, count) in &summary.bucket_counts {
        if *count > 0 || show_all {
            println!("    {:<36} {:>6}", bucket.as_str(), count);
        }
    }
    println!();

    let disc = &summary.discrepancies;
    if disc.total() > 0 {
        println!(
            "  Discrepancies: {} acted upon, {} samples repeated, {} ignored\n",
            disc.acted_upon, disc.samples_repeated, disc.ignored
        );
    }

    if !result.mix_stats.is_empty() {
        let width = result
            .mix_stats
            .iter()
            .map(|m| m.mix_name.len())
            .max()
            .unwrap_or(8)
            .max(8);
        println!(
            "  {:<width$}  {:>8}  {:>8}  {:>9}  {:>9}  {:>9}  {:>9}",
            "Mix",
            "Det",
            "Not det",
            "Controls",
            "SOP",
            "Class.",
            "Ctrl aff",
            width = width
        );
        for m in &result.mix_stats {
            println!(
                "  {:<width$}  {:>8}  {:>8}  {:>9}  {:>9}  {:>9}  {:>9}",
                m.mix_name,
                m.samples_detected,
                m.samples_not_detected,
                format!("{}/{}", m.controls_passed, m.controls_total),
                format!("{}/{}", m.sop_errors_affected, m.sop_errors),
                format!(
                    "{}/{}",
                    m.classification_errors_affected, m.classification_errors
                ),
                m.samples_affected_by_controls,
                width = width
            );
        }
        println!("  (Controls passed/total; SOP and Class. affected/total)\n");
    }

    let listed: Vec<&ClassifiedWell> = result
        .wells
        .iter()
        .filter(|w| show_all || needs_attention(w))
        .collect();
    if !listed.is_empty() {
        let id_width = listed.iter().map(|w| w.well_id.len()).max().unwrap_or(6).max(6);
        println!("  Wells:");
        for well in &listed {
            let unmatched_marker = if well.matched { "" } else { " (default)" };
            println!(
                "    {:<width$}  {:<24} {}{}",
                well.well_id,
                well.category.as_str(),
                well.bucket,
                unmatched_marker,
                width = id_width
            );
            println!("    {:<width$}  {}", "", well.reason, width = id_width);
        }
        println!();
    }

    if trace {
        if let Some(ref bundle) = result.trace {
            println!("  Decision trace:");
            for decision in &bundle.decisions {
                if !show_all && !listed.iter().any(|w| w.well_id == decision.well_id) {
                    continue;
                }
                println!("    {} -> {}", decision.well_id, decision.bucket);
                for step in &decision.steps {
                    println!("      - {}", step.message);
                }
            }
            println!();
        }
    }

    let diag = &result.diagnostics;
    if diag.miss_count > 0 {
        println!(
            "  Warnings: {} wells matched no table row ({} distinct patterns):",
            diag.miss_count,
            diag.missing_keys.len()
        );
        for missing in &diag.missing_keys {
            println!(
                "    - {} ({} wells) -> {}",
                missing.key, missing.occurrences, missing.substituted
            );
        }
        println!();
    }
    if !diag.duplicate_wells.is_empty() {
        println!("  Duplicate well ids:");
        for dup in &diag.duplicate_wells {
            println!(
                "    - {}: kept {}, dropped {}",
                dup.well_id, dup.kept, dup.dropped
            );
        }
        println!();
    }
}

fn needs_attention(well: &ClassifiedWell) -> bool {
    !well.matched || well.bucket.is_discrepancy() || well.bucket == Bucket::Unresolved
}

pub fn print_coverage(report: &CoverageReport) {
    println!("=== {} ===\n", report.database);
    println!(
        "  Wells: {}  Distinct patterns: {}  Covered: {}",
        report.total_wells, report.distinct_keys, report.matched_keys
    );
    println!("  Well coverage: {:.1}%\n", report.well_coverage_pct());

    if report.is_complete() {
        println!("  All patterns are covered by the category table.\n");
        return;
    }

    println!(
        "  Missing patterns ({} wells affected):",
        report.affected_wells
    );
    for pattern in &report.missing {
        println!(
            "    {:>6}  {}  -> {}",
            pattern.wells, pattern.key, pattern.default_category
        );
        println!("            e.g. {}", pattern.example_well_ids.join(", "));
    }
    println!();
}
