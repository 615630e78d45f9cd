use wellcat_core::config::builtin;
use wellcat_core::config::schema::ControlRule;
use wellcat_core::error::WellcatError;

use crate::output;

pub fn list() -> Result<(), WellcatError> {
    println!("Available database presets:\n");
    for name in builtin::PRESETS {
        let config = builtin::load_preset(name)?;
        println!("  {:<8} {}", name, config.name);
        if let Some(ref desc) = config.description {
            println!("           {}", desc);
        }
        let rule = match &config.control_rule {
            ControlRule::PatientRole { patient_role } => {
                format!("control unless role is '{}'", patient_role)
            }
            ControlRule::Exact { roles } => format!("control roles: {}", roles.join(", ")),
            ControlRule::Tokens { tokens, .. } => format!("control tokens: {}", tokens.join(", ")),
        };
        println!(
            "           {}; {} LIMS normalizations",
            rule,
            config.lims_normalization.len()
        );
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), WellcatError> {
    let config = builtin::load_preset(preset)?;
    output::json::print(&config)
}
