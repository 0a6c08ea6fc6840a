use super::ValidationReport;
use super::python::PythonModule;
use crate::progress::ErrorRecord;

/// Import references each well-known file is expected to carry
pub const EXPECTED_IMPORTS: &[(&str, &[&str])] = &[
    ("agent.py", &["google.adk", "Agent"]),
    ("tools/pipedream_tools.py", &["pipedream_client"]),
    ("tools/__init__.py", &["pipedream_tools"]),
];

/// Warn about expected imports that are absent.
///
/// Matching is a case-insensitive substring test against every imported
/// module path and imported symbol.
pub fn check(path: &str, module: &PythonModule<'_>, report: &mut ValidationReport) {
    let Some((_, expected)) = EXPECTED_IMPORTS.iter().find(|(file, _)| *file == path) else {
        return;
    };

    let haystack: Vec<String> = module
        .imports()
        .into_iter()
        .flat_map(|import| {
            let mut names = vec![import.module.to_lowercase()];
            names.extend(import.name.map(|name| name.to_lowercase()));
            names
        })
        .collect();

    for wanted in expected.iter() {
        let needle = wanted.to_lowercase();
        if !haystack.iter().any(|name| name.contains(&needle)) {
            report.add_warning(
                ErrorRecord::new(
                    "MISSING_IMPORT",
                    format!("Expected import '{wanted}' not found in {path}"),
                )
                .for_file(path)
                    .with("expected", *wanted),
            );
        }
    }
}
