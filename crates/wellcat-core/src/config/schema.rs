use crate::model::ObservationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Per-database configuration: how raw LIMS vocabulary and control naming map
/// onto the shared taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Exact-match map from raw LIMS status to canonical status.
    #[serde(default)]
    pub lims_normalization: BTreeMap<String, String>,
    pub control_rule: ControlRule,
    #[serde(default)]
    pub discrepancy: DiscrepancyPolicy,
    /// Default category table, used when no table is given explicitly.
    #[serde(default)]
    pub category_table: Option<PathBuf>,
}

/// How a well's role alias decides whether it is a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlRule {
    /// Any role other than the designated patient role is a control.
    PatientRole { patient_role: String },
    /// Role alias equals one of the listed values.
    Exact { roles: Vec<String> },
    /// Some alphanumeric word of the role alias equals a listed token.
    Tokens {
        tokens: Vec<String>,
        #[serde(default)]
        allow_numeric_suffix: bool,
    },
}

/// Which observation field is compared against `machine_cls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Final,
    Dxai,
    /// AI-assist call when present, final call otherwise.
    DxaiThenFinal,
}

impl Comparator {
    pub fn value(&self, obs: &ObservationRecord) -> Option<i32> {
        match self {
            Comparator::Final => obs.final_cls,
            Comparator::Dxai => obs.dxai_cls,
            Comparator::DxaiThenFinal => obs.dxai_cls.or(obs.final_cls),
        }
    }

    /// True when both `machine_cls` and the compared value are present and differ.
    pub fn differs(&self, obs: &ObservationRecord) -> bool {
        match (obs.machine_cls, self.value(obs)) {
            (Some(machine), Some(other)) => machine != other,
            _ => false,
        }
    }
}

/// Comparator choices for discrepancy detection and categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyPolicy {
    /// Decides whether a well is a discrepancy candidate at all.
    #[serde(default = "default_detection")]
    pub detection_comparator: Comparator,
    /// Decides the has-changed-result check.
    #[serde(default = "default_change")]
    pub change_comparator: Comparator,
}

fn default_detection() -> Comparator {
    Comparator::DxaiThenFinal
}

fn default_change() -> Comparator {
    Comparator::Final
}

impl Default for DiscrepancyPolicy {
    fn default() -> Self {
        Self {
            detection_comparator: default_detection(),
            change_comparator: default_change(),
        }
    }
}
