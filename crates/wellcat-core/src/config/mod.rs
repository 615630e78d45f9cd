pub mod builtin;
pub mod schema;

use crate::error::WellcatError;
use schema::{ControlRule, DatabaseConfig};
use std::path::Path;

/// Load a database config from a JSON file.
///
/// A relative `category_table` is resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<DatabaseConfig, WellcatError> {
    let content = std::fs::read_to_string(path).map_err(|e| WellcatError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut config = parse_config(&content, path)?;
    if let (Some(table), Some(dir)) = (config.category_table.as_ref(), path.parent()) {
        if table.is_relative() {
            config.category_table = Some(dir.join(table));
        }
    }
    Ok(config)
}

/// Parse a database config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<DatabaseConfig, WellcatError> {
    let config: DatabaseConfig =
        serde_json::from_str(json).map_err(|e| WellcatError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a database config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<DatabaseConfig, WellcatError> {
    let config: DatabaseConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a database config is well-formed.
pub fn validate_config(config: &DatabaseConfig) -> Result<(), WellcatError> {
    if config.name.trim().is_empty() {
        return Err(WellcatError::ConfigInvalid("name must not be empty".into()));
    }

    for (raw, canonical) in &config.lims_normalization {
        if raw.trim().is_empty() {
            return Err(WellcatError::ConfigInvalid(
                "lims_normalization keys must not be empty".into(),
            ));
        }
        if canonical.trim().is_empty() {
            return Err(WellcatError::ConfigInvalid(format!(
                "lims_normalization maps '{}' to an empty status",
                raw
            )));
        }
    }

    match &config.control_rule {
        ControlRule::PatientRole { patient_role } => {
            if patient_role.trim().is_empty() {
                return Err(WellcatError::ConfigInvalid(
                    "control_rule.patient_role must not be empty".into(),
                ));
            }
        }
        ControlRule::Exact { roles } => {
            if roles.is_empty() || roles.iter().any(|r| r.trim().is_empty()) {
                return Err(WellcatError::ConfigInvalid(
                    "control_rule.roles must be a non-empty list of non-empty values".into(),
                ));
            }
        }
        ControlRule::Tokens { tokens, .. } => {
            if tokens.is_empty() {
                return Err(WellcatError::ConfigInvalid(
                    "control_rule.tokens must not be empty".into(),
                ));
            }
            for token in tokens {
                if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(WellcatError::ConfigInvalid(format!(
                        "control_rule token '{}' must be a single alphanumeric word",
                        token
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Comparator;

    #[test]
    fn test_parse_valid_config() {
        let json = r#"{
            "name": "Test Lab",
            "lims_normalization": { "HSV1_DETECTED": "DETECTED" },
            "control_rule": { "kind": "patient_role", "patient_role": "Patient" }
        }"#;
        let config = parse_config_str(json).unwrap();
        assert_eq!(config.name, "Test Lab");
        assert_eq!(
            config.lims_normalization.get("HSV1_DETECTED").map(String::as_str),
            Some("DETECTED")
        );
        assert_eq!(config.discrepancy.change_comparator, Comparator::Final);
        assert_eq!(
            config.discrepancy.detection_comparator,
            Comparator::DxaiThenFinal
        );
    }

    #[test]
    fn test_explicit_comparators() {
        let json = r#"{
            "name": "Test Lab",
            "control_rule": { "kind": "exact", "roles": ["NTC"] },
            "discrepancy": { "detection_comparator": "final", "change_comparator": "dxai" }
        }"#;
        let config = parse_config_str(json).unwrap();
        assert_eq!(config.discrepancy.detection_comparator, Comparator::Final);
        assert_eq!(config.discrepancy.change_comparator, Comparator::Dxai);
    }

    #[test]
    fn test_empty_name_rejected() {
        let json = r#"{
            "name": " ",
            "control_rule": { "kind": "exact", "roles": ["NTC"] }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_empty_lims_target_rejected() {
        let json = r#"{
            "name": "Bad",
            "lims_normalization": { "<1500": "" },
            "control_rule": { "kind": "exact", "roles": ["NTC"] }
        }"#;
        assert!(matches!(
            parse_config_str(json),
            Err(WellcatError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_non_word_token_rejected() {
        let json = r#"{
            "name": "Bad",
            "control_rule": { "kind": "tokens", "tokens": ["% PC"] }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_unknown_rule_kind_rejected() {
        let json = r#"{
            "name": "Bad",
            "control_rule": { "kind": "like", "pattern": "%PC" }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.json");
        std::fs::write(
            &path,
            r#"{ "name": "Disk Lab", "control_rule": { "kind": "exact", "roles": ["POS"] } }"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.name, "Disk Lab");
        assert!(config.category_table.is_none());
    }

    #[test]
    fn test_relative_table_resolved_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.json");
        std::fs::write(
            &path,
            r#"{ "name": "Disk Lab", "category_table": "tables/lab.csv",
                 "control_rule": { "kind": "exact", "roles": ["POS"] } }"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(
            config.category_table,
            Some(dir.path().join("tables/lab.csv"))
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/lab.json"));
        assert!(matches!(result, Err(WellcatError::ConfigLoad { .. })));
    }
}
