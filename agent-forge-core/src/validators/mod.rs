//! Static checks over generated project files
//!
//! Every validator is stateless and works on `path -> text` pairs. Python
//! files are parsed once with tree-sitter and the resulting module is shared
//! by the syntax, import and structure checks. Findings are split into hard
//! errors and soft warnings; neither kind ever stops the remaining checks.

pub mod compliance;
mod grammar;
pub mod imports;
pub mod manifest;
pub mod python;
pub mod secrets;
pub mod structure;
pub mod syntax;


use crate::progress::ErrorRecord;
use crate::state::FileMap;
use compliance::{ComplianceReport, ReferenceAgent};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use python::PythonModule;

/// Errors and warnings collected by one validation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ErrorRecord>,
    pub warnings: Vec<ErrorRecord>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, record: ErrorRecord) {
        debug!(code = %record.code, "validation error: {}", record.message);
        self.errors.push(record);
    }

    pub fn add_warning(&mut self, record: ErrorRecord) {
        debug!(code = %record.code, "validation warning: {}", record.message);
        self.warnings.push(record);
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().chain(&self.warnings).any(|record| record.code == code)
    }
}

/// Run syntax, import, structure and secret checks on one file.
///
/// Import and structure checks are skipped for Python files that fail to
/// parse; the syntax error is the only finding reported for them.
pub fn validate_file(path: &str, content: &str, report: &mut ValidationReport) {
    if syntax::is_python(path) {
        match PythonModule::parse(content) {
            Ok(module) => match module.syntax_error() {
                Some(issue) => report.add_error(syntax::syntax_error(path, &issue)),
                None => {
                    imports::check(path, &module, report);
                    structure::check(path, &module, report);
                }
            },
            Err(e) => report.add_error(syntax::parse_error(path, &e)),
        }
    }

    secrets::check(path, content, report);
}

/// Run the per-file checks over every file
pub fn validate_files(files: &FileMap) -> ValidationReport {
    let mut report = ValidationReport::new();
    for (path, content) in files {
        validate_file(path, content, &mut report);
    }
    report
}

/// Full suite for an already written project: per-file checks, layout and
/// recommended conventions, plus compliance when a reference is given.
/// Compliance findings keep their own severity here.
pub fn audit(files: &FileMap, reference: Option<&ReferenceAgent>) -> ComplianceReport {
    let mut findings = validate_files(files);
    structure::check_layout(files, &mut findings);

    for (path, content) in files.iter().filter(|(path, _)| syntax::is_python(path)) {
        if let Ok(module) = PythonModule::parse(content) {
            if module.syntax_error().is_none() {
                structure::check_recommended(path, &module, &mut findings);
            }
        }
    }

    let mut report = ComplianceReport { findings, ..ComplianceReport::default() };
    if let Some(reference) = reference {
        let compliance = compliance::check(files, reference);
        report.similarity_scores = compliance.similarity_scores;
        report.findings.merge(compliance.findings);
    }
    report
}
