use crate::config::schema::{ControlRule, DatabaseConfig};
use crate::model::{WellRecord, WellType};

/// Decide whether a role alias (or a canonical well type string) denotes a control well.
///
/// `SAMPLE` / `CONTROL` are answered directly. Anything else is evaluated
/// against the database's control rule. Token rules only match whole
/// alphanumeric words, so a sample named "SMITH PCR" never matches `PC`.
pub fn is_control(role_or_well_type: &str, config: &DatabaseConfig) -> bool {
    if let Some(well_type) = WellType::parse(role_or_well_type) {
        return well_type == WellType::Control;
    }

    let role = role_or_well_type.trim();
    if role.is_empty() {
        return false;
    }

    match &config.control_rule {
        ControlRule::PatientRole { patient_role } => !role.eq_ignore_ascii_case(patient_role.trim()),
        ControlRule::Exact { roles } => roles.iter().any(|r| r.trim() == role),
        ControlRule::Tokens {
            tokens,
            allow_numeric_suffix,
        } => words(role).any(|word| {
            tokens
                .iter()
                .any(|token| word_matches(word, token, *allow_numeric_suffix))
        }),
    }
}

/// Well type for a record: explicit `well_type` first, then the role alias,
/// otherwise SAMPLE.
pub fn resolve_well_type(well: &WellRecord, config: &DatabaseConfig) -> WellType {
    if let Some(well_type) = well.well_type {
        return well_type;
    }
    match well.role.as_deref() {
        Some(role) if is_control(role, config) => WellType::Control,
        _ => WellType::Sample,
    }
}

fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn word_matches(word: &str, token: &str, allow_numeric_suffix: bool) -> bool {
    if word.len() < token.len() || !word.is_char_boundary(token.len()) {
        return false;
    }
    let (head, rest) = word.split_at(token.len());
    if !head.eq_ignore_ascii_case(token) {
        return false;
    }
    rest.is_empty() || (allow_numeric_suffix && rest.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config(rule: ControlRule) -> DatabaseConfig {
        DatabaseConfig {
            name: "test".into(),
            description: None,
            lims_normalization: BTreeMap::new(),
            control_rule: rule,
            discrepancy: Default::default(),
            category_table: None,
        }
    }

    fn tokens(list: &[&str], numeric: bool) -> DatabaseConfig {
        config(ControlRule::Tokens {
            tokens: list.iter().map(|s| s.to_string()).collect(),
            allow_numeric_suffix: numeric,
        })
    }

    #[test]
    fn test_canonical_well_type_strings() {
        let cfg = tokens(&["PC"], false);
        assert!(is_control("CONTROL", &cfg));
        assert!(!is_control("SAMPLE", &cfg));
    }

    #[test]
    fn test_patient_role() {
        let cfg = config(ControlRule::PatientRole {
            patient_role: "Patient".into(),
        });
        assert!(!is_control("Patient", &cfg));
        assert!(!is_control("patient", &cfg));
        assert!(is_control("NTC", &cfg));
        assert!(is_control("HSV PC", &cfg));
        assert!(!is_control("", &cfg));
    }

    #[test]
    fn test_exact_roles() {
        let cfg = config(ControlRule::Exact {
            roles: vec!["CC1".into(), "POS".into(), "S#".into()],
        });
        assert!(is_control("CC1", &cfg));
        assert!(is_control("S#", &cfg));
        assert!(!is_control("CC12", &cfg));
        assert!(!is_control("pos", &cfg));
    }

    #[test]
    fn test_tokens_match_whole_words() {
        let cfg = tokens(&["PC", "NC"], false);
        assert!(is_control("PC", &cfg));
        assert!(is_control("HSV PC", &cfg));
        assert!(is_control("NC_MPX", &cfg));
        assert!(!is_control("SMITH PCR", &cfg));
        assert!(!is_control("EPC", &cfg));
        assert!(!is_control("PC1", &cfg));
    }

    #[test]
    fn test_tokens_numeric_suffix() {
        let cfg = tokens(&["QS", "NEG", "NTC", "NIBSC"], true);
        assert!(is_control(" QS1 | HSV", &cfg));
        assert!(is_control("Neg", &cfg));
        assert!(is_control("NIBSC", &cfg));
        assert!(!is_control("QSX", &cfg));
        assert!(!is_control("NEGATIVE-JONES", &cfg));
    }

    #[test]
    fn test_tokens_ignore_non_ascii() {
        let cfg = tokens(&["PC"], false);
        assert!(!is_control("Pécs", &cfg));
    }

    #[test]
    fn test_resolve_well_type_precedence() {
        let cfg = config(ControlRule::PatientRole {
            patient_role: "Patient".into(),
        });
        let mut well = WellRecord {
            well_id: "w".into(),
            sample_name: None,
            mix_name: None,
            role: Some("NTC".into()),
            well_type: None,
            error_code: None,
            resolution_codes: None,
            lims_status: None,
            observations: vec![],
        };
        assert_eq!(resolve_well_type(&well, &cfg), WellType::Control);

        well.well_type = Some(WellType::Sample);
        assert_eq!(resolve_well_type(&well, &cfg), WellType::Sample);

        well.well_type = None;
        well.role = None;
        assert_eq!(resolve_well_type(&well, &cfg), WellType::Sample);
    }
}
