use super::ValidationReport;
use crate::progress::ErrorRecord;
use crate::state::{FileMap, Manifest};
use std::collections::BTreeSet;

/// Compare manifest entries with generated paths; any difference is a warning
pub fn check(manifest: &Manifest, files: &FileMap, report: &mut ValidationReport) {
    let listed: BTreeSet<&str> = manifest.files.iter().map(String::as_str).collect();
    let present: BTreeSet<&str> = files.keys().map(String::as_str).collect();

    let missing: Vec<&str> = listed.difference(&present).copied().collect();
    let extra: Vec<&str> = present.difference(&listed).copied().collect();
    if missing.is_empty() && extra.is_empty() {
        return;
    }

    report.add_warning(
        ErrorRecord::new("MANIFEST_MISMATCH", "Manifest files don't match generated files")
            .with("missing", missing)
            .with("extra", extra),
    );
}
