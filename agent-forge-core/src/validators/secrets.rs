use super::ValidationReport;
use crate::progress::ErrorRecord;
use regex_utils::secrets::{self as patterns, PATTERNS};

/// Largest number of matching snippets kept per finding
const MAX_REPORTED_MATCHES: usize = 3;

/// Flag hard-coded credentials; one error per file and pattern.
///
/// Runs on every file regardless of suffix.
pub fn check(path: &str, content: &str, report: &mut ValidationReport) {
    for pattern in PATTERNS.iter() {
        let suspicious = patterns::suspicious(pattern, content);
        if suspicious.is_empty() {
            continue;
        }

        let shown: Vec<&str> = suspicious.into_iter().take(MAX_REPORTED_MATCHES).collect();
        report.add_error(
            ErrorRecord::new(
                "HARDCODED_SECRET",
                format!("Potential hardcoded secret found in {path}"),
            )
            .for_file(path)
                .with("pattern", pattern.source)
                .with("matches", shown),
        );
    }
}
