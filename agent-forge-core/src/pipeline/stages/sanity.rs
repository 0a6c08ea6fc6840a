//! Static checks over everything generated so far

use crate::pipeline::{PipelineDeps, PipelineStage, StageId};
use crate::progress::Level;
use crate::state::PipelineState;
use crate::validators::{self, ValidationReport, compliance, manifest, structure};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Runs every validator over every file. Errors land on the state; warnings
/// only appear in this stage's final progress event.
pub struct SanityChecks {
    reference: Option<Arc<compliance::ReferenceAgent>>,
}

impl SanityChecks {
    pub fn new(deps: &PipelineDeps) -> Self {
        Self { reference: deps.reference.clone() }
    }

    /// Findings for the current state; nothing is written back
    pub fn inspect(
        &self,
        state: &PipelineState,
    ) -> (ValidationReport, Option<compliance::ComplianceReport>) {
        let files = state.generated_files();
        let mut report = ValidationReport::new();

        for path in &state.files_to_generate {
            if !files.contains_key(path) {
                report.add_error(structure::missing_file(path));
            }
        }

        report.merge(validators::validate_files(files));

        if let Some(manifest) = &state.manifest {
            manifest::check(manifest, files, &mut report);
        }

        let compliance = self.reference.as_ref().map(|reference| {
            let compliance = compliance::check(files, reference);
            // Compliance findings never fail a run
            for finding in compliance.findings.errors.iter().chain(&compliance.findings.warnings) {
                report.add_warning(finding.clone());
            }
            compliance
        });

        (report, compliance)
    }
}

#[async_trait]
impl PipelineStage for SanityChecks {
    fn name(&self) -> &'static str {
        StageId::RunningSanityChecks.as_str()
    }

    async fn execute(&self, mut state: PipelineState) -> PipelineState {
        let stage = self.name();
        state.progress.emit(stage, "Running sanity checks", Level::Info);

        let (report, compliance) = self.inspect(&state);
        let warning_count = report.warning_count();
        debug!(
            pipeline_id = %state.pipeline_id,
            errors = report.error_count(),
            warnings = warning_count,
            "sanity checks finished"
        );

        state.errors.extend(report.errors);

        let mut data = crate::data! {
            "warning_count" => warning_count,
            "warnings" => report.warnings,
        };
        if !state.errors.is_empty() {
            data.insert("error_count".to_string(), Value::from(state.errors.len()));
        }
        if let Some(compliance) = compliance {
            data.insert(
                "similarity_scores".to_string(),
                serde_json::to_value(&compliance.similarity_scores).unwrap_or(Value::Null),
            );
        }

        if state.errors.is_empty() {
            state.progress.emit_with(
                stage,
                format!("All sanity checks passed ({warning_count} warnings)"),
                Level::Success,
                data,
            );
        } else {
            let error_count = state.errors.len();
            state.progress.emit_with(
                stage,
                format!("Sanity checks failed: {error_count} errors, {warning_count} warnings"),
                Level::Error,
                data,
            );
        }
        state
    }
}
