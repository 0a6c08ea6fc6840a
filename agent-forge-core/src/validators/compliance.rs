//! Template compliance scoring against a known-good reference agent
//!
//! Both sides are reduced to sets of import paths, function names, class
//! names and private module globals. The similarity score is the share of the
//! reference's imports, functions and classes that the generated file also
//! has; a reference with none of them scores 1.0.

use super::ValidationReport;
use super::python::{ImportedName, PythonModule};
use crate::layout;
use crate::progress::ErrorRecord;
use crate::state::FileMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

const CRITICAL_IMPORTS: &[(&str, &[&str])] = &[
    ("agent.py", &["google.adk", "Agent", "config", "tools"]),
    ("tools/pipedream_tools.py", &["pipedream_client", "PipedreamMCPClient", "asyncio"]),
    ("tools/pipedream_client.py", &["mcp", "ClientSession", "Pipedream"]),
];

const REQUIRED_FUNCTIONS: &[(&str, &[&str])] = &[
    ("agent.py", &["_get_model"]),
    ("config/agent_config.py", &["get_agent_config"]),
    ("tools/__init__.py", &["get_agent_tools"]),
    (
        "tools/pipedream_tools.py",
        &[
            "initialize_pipedream_client",
            "create_pipedream_tool_function",
            "create_smart_pipedream_tool",
            "create_list_pipedream_tools_tool",
            "_init_tools_sync",
        ],
    ),
];

const REQUIRED_CLASSES: &[(&str, &[&str])] =
    &[("tools/pipedream_client.py", &["PipedreamMCPClient"])];

const REQUIRED_GLOBALS: &[(&str, &[&str])] = &[(
    "tools/pipedream_tools.py",
    &["_pipedream_client", "_pipedream_tools", "_pipedream_initialized"],
)];

fn lookup(
    table: &'static [(&str, &'static [&'static str])],
    path: &str,
) -> &'static [&'static str] {
    table.iter().find(|(file, _)| *file == path).map(|(_, items)| *items).unwrap_or_default()
}

/// Reference implementation files keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct ReferenceAgent {
    files: FileMap,
}

impl ReferenceAgent {
    pub fn from_files(files: FileMap) -> Self {
        Self { files }
    }

    /// Load the critical files of a reference agent directory; absent files are skipped
    pub fn load(dir: &Path) -> std::io::Result<Self> {
        let mut files = FileMap::new();
        for path in layout::CRITICAL_FILES {
            let full = dir.join(path);
            if full.is_file() {
                files.insert(path.to_string(), std::fs::read_to_string(&full)?);
            } else {
                debug!(file = %full.display(), "reference file not present");
            }
        }
        if files.is_empty() {
            warn!(dir = %dir.display(), "reference agent directory has no usable files");
        }
        Ok(Self { files })
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Name sets extracted from one Python file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodePatterns {
    pub imports: BTreeSet<String>,
    pub functions: BTreeSet<String>,
    pub classes: BTreeSet<String>,
    pub globals: BTreeSet<String>,
}

impl CodePatterns {
    /// Sources that do not parse cleanly yield empty sets
    pub fn extract(content: &str) -> Self {
        let Ok(module) = PythonModule::parse(content) else {
            return Self::default();
        };
        if module.has_error() {
            return Self::default();
        }

        Self {
            imports: module.imports().iter().map(ImportedName::qualified).collect(),
            functions: module.functions().into_iter().map(|f| f.name).collect(),
            classes: module.classes().into_iter().collect(),
            globals: module
                .assigned_names()
                .into_iter()
                .filter(|name| name.starts_with('_') && !name.starts_with("__"))
                .collect(),
        }
    }

    /// Share of the reference's imports, functions and classes found here
    pub fn similarity(&self, reference: &CodePatterns) -> f64 {
        let pairs = [
            (&self.imports, &reference.imports),
            (&self.functions, &reference.functions),
            (&self.classes, &reference.classes),
        ];

        let total: usize = pairs.iter().map(|(_, theirs)| theirs.len()).sum();
        if total == 0 {
            return 1.0;
        }
        let matching: usize =
            pairs.iter().map(|(ours, theirs)| ours.intersection(theirs).count()).sum();
        matching as f64 / total as f64
    }
}

/// Outcome of comparing a set of generated files with the reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub similarity_scores: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub findings: ValidationReport,
}

impl ComplianceReport {
    pub fn is_valid(&self) -> bool {
        self.findings.is_valid()
    }
}

/// Compare one generated file with its reference counterpart
pub fn compare(
    path: &str,
    generated: &str,
    reference: &str,
    findings: &mut ValidationReport,
) -> f64 {
    let ours = CodePatterns::extract(generated);
    let theirs = CodePatterns::extract(reference);

    for wanted in lookup(CRITICAL_IMPORTS, path) {
        let needle = wanted.to_lowercase();
        if !ours.imports.iter().any(|import| import.to_lowercase().contains(&needle)) {
            findings.add_error(
                ErrorRecord::new(
                    "MISSING_CRITICAL_IMPORT",
                    format!("Missing critical import related to '{wanted}'"),
                )
                .for_file(path),
            );
        }
    }

    for function in lookup(REQUIRED_FUNCTIONS, path) {
        if !ours.functions.contains(*function) {
            findings.add_error(
                ErrorRecord::new(
                    "MISSING_REQUIRED_FUNCTION",
                    format!("Missing required function: {function}"),
                )
                .for_file(path),
            );
        }
    }

    for class in lookup(REQUIRED_CLASSES, path) {
        if !ours.classes.contains(*class) {
            findings.add_error(
                ErrorRecord::new(
                    "MISSING_REQUIRED_CLASS",
                    format!("Missing required class: {class}"),
                )
                .for_file(path),
            );
        }
    }

    let missing_globals: Vec<&str> = lookup(REQUIRED_GLOBALS, path)
        .iter()
        .copied()
        .filter(|name| !ours.globals.contains(*name))
        .collect();
    if !missing_globals.is_empty() {
        findings.add_warning(
            ErrorRecord::new(
                "MISSING_GLOBAL_VARS",
                format!("Missing global variables: {}", missing_globals.join(", ")),
            )
            .for_file(path)
            .with("missing", missing_globals),
        );
    }

    ours.similarity(&theirs)
}

/// Score every generated file that has a reference counterpart
pub fn check(files: &FileMap, reference: &ReferenceAgent) -> ComplianceReport {
    let mut report = ComplianceReport::default();

    for (path, content) in files {
        match reference.get(path) {
            Some(reference_content) => {
                let score = compare(path, content, reference_content, &mut report.findings);
                debug!(file = %path, score, "template similarity");
                report.similarity_scores.insert(path.clone(), score);
            }
            None if path.ends_with(".py") && path != "__init__.py" => {
                report.findings.add_warning(
                    ErrorRecord::new("NO_REFERENCE", format!("No reference file found for {path}"))
                        .for_file(path),
                );
            }
            None => {}
        }
    }

    report
}
