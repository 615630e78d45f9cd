use crate::classify::outcome::{ClassifiedWell, Diagnostics};
use crate::classify::router::Bucket;
use crate::model::Category;
use serde::{Deserialize, Serialize};

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Critical,
    Important,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceVisibility {
    Always,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStepType {
    ControlDetection,
    LimsNormalization,
    Lookup,
    Fallback,
    ControlAttribution,
    Eligibility,
    DiscrepancyDecision,
    Routing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step_type: TraceStepType,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceDecision {
    pub decision_id: String,
    pub well_id: String,
    pub category: Category,
    pub bucket: Bucket,
    pub reason: String,
    pub severity: TraceSeverity,
    pub visibility: TraceVisibility,
    pub steps: Vec<TraceStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub well_id: Option<String>,
    pub message: String,
    pub severity: TraceSeverity,
    pub visibility: TraceVisibility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceBundle {
    pub trace_schema_version: String,
    pub decisions: Vec<TraceDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TraceWarning>,
}

impl Default for TraceBundle {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            decisions: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Collects decision steps while a well is classified. A disabled recorder
/// never builds the step messages.
#[derive(Debug, Default)]
pub struct StepRecorder {
    steps: Option<Vec<TraceStep>>,
}

impl StepRecorder {
    pub fn enabled() -> Self {
        Self {
            steps: Some(Vec::new()),
        }
    }

    pub fn disabled() -> Self {
        Self { steps: None }
    }

    pub fn push(&mut self, step_type: TraceStepType, message: impl FnOnce() -> String) {
        if let Some(steps) = self.steps.as_mut() {
            steps.push(TraceStep {
                step_type,
                message: message(),
            });
        }
    }

    pub fn finish(self) -> Option<Vec<TraceStep>> {
        self.steps
    }
}

pub fn build_well_decision(
    index: usize,
    well: &ClassifiedWell,
    steps: Vec<TraceStep>,
) -> TraceDecision {
    let severity = if !well.matched {
        TraceSeverity::Critical
    } else if well.bucket.is_discrepancy() || well.bucket == Bucket::Unresolved {
        TraceSeverity::Important
    } else {
        TraceSeverity::Info
    };
    let visibility = match severity {
        TraceSeverity::Info => TraceVisibility::Auto,
        _ => TraceVisibility::Always,
    };

    TraceDecision {
        decision_id: format!("dec_{}_{}", index, well.well_id),
        well_id: well.well_id.clone(),
        category: well.category,
        bucket: well.bucket,
        reason: well.reason.clone(),
        severity,
        visibility,
        steps,
    }
}

pub fn build_diagnostic_warnings(diagnostics: &Diagnostics) -> Vec<TraceWarning> {
    let mut warnings: Vec<TraceWarning> = diagnostics
        .missing_keys
        .iter()
        .map(|missing| TraceWarning {
            well_id: None,
            message: format!(
                "No category table row for {} ({} wells); defaulted to {}",
                missing.key, missing.occurrences, missing.substituted
            ),
            severity: TraceSeverity::Critical,
            visibility: TraceVisibility::Always,
        })
        .collect();

    warnings.extend(diagnostics.duplicate_wells.iter().map(|dup| TraceWarning {
        well_id: Some(dup.well_id.clone()),
        message: format!(
            "Well id repeated in batch; kept {} and dropped {}",
            dup.kept, dup.dropped
        ),
        severity: TraceSeverity::Important,
        visibility: TraceVisibility::Always,
    }));

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_recorder_skips_messages() {
        let mut rec = StepRecorder::disabled();
        rec.push(TraceStepType::Lookup, || panic!("message built"));
        assert!(rec.finish().is_none());
    }

    #[test]
    fn test_enabled_recorder_keeps_order() {
        let mut rec = StepRecorder::enabled();
        rec.push(TraceStepType::Lookup, || "first".into());
        rec.push(TraceStepType::Routing, || "second".into());
        let steps = rec.finish().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].step_type, TraceStepType::Routing);
    }

    #[test]
    fn test_bundle_default_version() {
        let bundle = TraceBundle::default();
        assert_eq!(bundle.trace_schema_version, TRACE_SCHEMA_VERSION);
        let json = serde_json::to_string(&bundle).unwrap();
        assert!(!json.contains("warnings"));
    }
}
