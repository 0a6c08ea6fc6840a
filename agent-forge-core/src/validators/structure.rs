use super::ValidationReport;
use super::python::PythonModule;
use crate::layout;
use crate::progress::ErrorRecord;
use crate::state::FileMap;

/// Structural conventions for the entrypoint, config and tool package.
///
/// Each missing element is a separate error.
pub fn check(path: &str, module: &PythonModule<'_>, report: &mut ValidationReport) {
    match path {
        "agent.py" => {
            if !module.module_bindings().iter().any(|name| name == "root_agent") {
                report.add_error(
                    ErrorRecord::new("MISSING_ROOT_AGENT", "agent.py missing root_agent variable")
                        .for_file(path),
                );
            }
            if !imports_agent_framework(module) {
                report.add_error(
                    ErrorRecord::new(
                        "MISSING_AGENT_IMPORT",
                        "agent.py missing Agent import from google.adk",
                    )
                    .for_file(path),
                );
            }
        }
        "config/agent_config.py" => {
            if !has_zero_arg_function(module, "get_agent_config") {
                report.add_error(
                    ErrorRecord::new(
                        "MISSING_GET_CONFIG",
                        "config/agent_config.py missing get_agent_config() function",
                    )
                    .for_file(path),
                );
            }
        }
        "tools/__init__.py" => {
            if !has_zero_arg_function(module, "get_agent_tools") {
                report.add_error(
                    ErrorRecord::new(
                        "MISSING_GET_TOOLS",
                        "tools/__init__.py missing get_agent_tools() function",
                    )
                    .for_file(path),
                );
            }
        }
        _ => {}
    }
}

/// Softer conventions reported as warnings by the standalone checker
pub fn check_recommended(path: &str, module: &PythonModule<'_>, report: &mut ValidationReport) {
    match path {
        "agent.py" => {
            if !module.functions().iter().any(|f| f.name == "_get_model") {
                report.add_warning(
                    ErrorRecord::new("MISSING_GET_MODEL", "agent.py has no _get_model() function")
                        .for_file(path),
                );
            }
        }
        "config/agent_config.py" => {
            let literals = module.string_literals();
            let missing: Vec<&str> = ["name", "model", "instruction"]
                .into_iter()
                .filter(|key| !literals.contains(key))
                .collect();
            if !missing.is_empty() {
                report.add_warning(
                    ErrorRecord::new(
                        "MISSING_CONFIG_KEYS",
                        format!("Config does not mention keys: {}", missing.join(", ")),
                    )
                    .for_file(path)
                    .with("missing", missing),
                );
            }
        }
        _ => {}
    }
}

/// Planned files that are absent (errors) and unexpected files (one warning)
pub fn check_layout(files: &FileMap, report: &mut ValidationReport) {
    for path in layout::PLANNED_FILES {
        if !files.contains_key(path) {
            report.add_error(missing_file(path));
        }
    }

    let extra: Vec<&str> =
        files.keys().map(String::as_str).filter(|path| !layout::is_known(path)).collect();
    if !extra.is_empty() {
        report.add_warning(
            ErrorRecord::new("EXTRA_FILES", format!("Extra files found: {}", extra.join(", ")))
                .with("extra", extra),
        );
    }
}

pub(crate) fn missing_file(path: &str) -> ErrorRecord {
    ErrorRecord::new("MISSING_FILE", format!("Required file {path} not generated")).for_file(path)
}

fn imports_agent_framework(module: &PythonModule<'_>) -> bool {
    module.imports().iter().any(|import| {
        import.module.contains("google.adk")
            || (import.is_from && import.name.as_deref() == Some("Agent"))
    })
}

fn has_zero_arg_function(module: &PythonModule<'_>, name: &str) -> bool {
    module.functions().iter().any(|f| f.top_level && f.name == name && f.required_params == 0)
}
