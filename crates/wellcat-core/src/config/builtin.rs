use super::schema::DatabaseConfig;
use super::validate_config;
use crate::error::WellcatError;

const QST_JSON: &str = include_str!("../../../../configs/qst.json");
const NOTTS_JSON: &str = include_str!("../../../../configs/notts.json");
const VIRA_JSON: &str = include_str!("../../../../configs/vira.json");

/// Available predefined database configs.
pub const PRESETS: &[&str] = &["qst", "notts", "vira"];

/// Load a predefined database config by name (case-insensitive).
pub fn load_preset(name: &str) -> Result<DatabaseConfig, WellcatError> {
    let json = match name.to_ascii_lowercase().as_str() {
        "qst" => QST_JSON,
        "notts" => NOTTS_JSON,
        "vira" => VIRA_JSON,
        _ => {
            return Err(WellcatError::UnknownDatabase {
                name: name.to_string(),
                available: PRESETS.join(", "),
            })
        }
    };
    let config: DatabaseConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Comparator, ControlRule};

    #[test]
    fn test_all_presets_load() {
        for name in PRESETS {
            let config = load_preset(name).unwrap();
            assert!(!config.name.is_empty());
            assert!(!config.lims_normalization.is_empty());
        }
    }

    #[test]
    fn test_preset_name_case_insensitive() {
        assert_eq!(load_preset("QST").unwrap().name, "QST Production");
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(
            load_preset("xyz"),
            Err(WellcatError::UnknownDatabase { .. })
        ));
    }

    #[test]
    fn test_presets_use_patient_role() {
        for name in PRESETS {
            let config = load_preset(name).unwrap();
            assert_eq!(
                config.control_rule,
                ControlRule::PatientRole {
                    patient_role: "Patient".into()
                }
            );
        }
    }

    #[test]
    fn test_presets_state_comparators() {
        for name in PRESETS {
            let config = load_preset(name).unwrap();
            assert_eq!(
                config.discrepancy.detection_comparator,
                Comparator::DxaiThenFinal
            );
            assert_eq!(config.discrepancy.change_comparator, Comparator::Final);
        }
    }

    #[test]
    fn test_notts_quantitative_statuses() {
        let config = load_preset("notts").unwrap();
        assert_eq!(
            config.lims_normalization.get("<1500").map(String::as_str),
            Some("DETECTED")
        );
    }
}
