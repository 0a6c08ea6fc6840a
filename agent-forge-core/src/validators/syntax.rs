use super::python::{ParseError, PythonModule, SyntaxIssue};
use crate::progress::ErrorRecord;

pub fn is_python(path: &str) -> bool {
    path.ends_with(".py")
}

/// Syntax findings for one file; files without a `.py` suffix are always valid
pub fn validate(path: &str, content: &str) -> Vec<ErrorRecord> {
    if !is_python(path) {
        return Vec::new();
    }

    match PythonModule::parse(content) {
        Ok(module) => {
            module.syntax_error().map(|issue| syntax_error(path, &issue)).into_iter().collect()
        }
        Err(e) => vec![parse_error(path, &e)],
    }
}

pub(crate) fn syntax_error(path: &str, issue: &SyntaxIssue) -> ErrorRecord {
    ErrorRecord::new(
        "SYNTAX_ERROR",
        format!("Syntax error in {path}: {} at line {}", issue.message, issue.line),
    )
    .for_file(path)
    .with("line", issue.line)
    .with("error", issue.message.clone())
}

pub(crate) fn parse_error(path: &str, error: &ParseError) -> ErrorRecord {
    ErrorRecord::new("PARSE_ERROR", format!("Failed to parse {path}: {error}"))
        .for_file(path)
        .with("error", error.to_string())
}
