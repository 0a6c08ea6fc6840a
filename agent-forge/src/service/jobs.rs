//! In-memory registry of background generation jobs

use agent_forge_core::Status;
use agent_forge_core::progress::ErrorRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Success,
    Error,
}

impl From<Status> for JobStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => JobStatus::Success,
            // A finished run that never reached a terminal status still failed
            Status::Error | Status::Processing => JobStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub pipeline_id: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
    pub errors: Vec<ErrorRecord>,
}

/// Row in the job listing
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub pipeline_id: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Jobs keyed by pipeline id; a resubmitted id replaces the earlier record
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl JobRegistry {
    pub async fn start(&self, pipeline_id: &str) -> JobRecord {
        let record = JobRecord {
            pipeline_id: pipeline_id.to_string(),
            status: JobStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            output_directory: None,
            errors: Vec::new(),
        };
        self.jobs.write().await.insert(pipeline_id.to_string(), record.clone());
        info!(pipeline_id, "job started");
        record
    }

    pub async fn complete(
        &self,
        pipeline_id: &str,
        status: Status,
        output_directory: Option<&Path>,
        errors: Vec<ErrorRecord>,
    ) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(pipeline_id) {
            job.status = status.into();
            job.completed_at = Some(Utc::now());
            job.output_directory = output_directory.map(|dir| dir.display().to_string());
            job.errors = errors;
            info!(pipeline_id, status = ?job.status, "job finished");
        }
    }

    /// Mark a job failed by a fault outside the pipeline
    pub async fn fail(&self, pipeline_id: &str, message: String) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(pipeline_id) {
            job.status = JobStatus::Error;
            job.completed_at = Some(Utc::now());
            job.errors = vec![ErrorRecord::new("INTERNAL_ERROR", message)];
            tracing::error!(pipeline_id, "job failed");
        }
    }

    pub async fn get(&self, pipeline_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(pipeline_id).cloned()
    }

    /// All jobs, oldest first
    pub async fn list(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.read().await;
        let mut summaries: Vec<JobSummary> = jobs
            .values()
            .map(|job| JobSummary {
                pipeline_id: job.pipeline_id.clone(),
                status: job.status,
                started_at: job.started_at,
                completed_at: job.completed_at,
            })
            .collect();
        summaries.sort_by_key(|job| job.started_at);
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let registry = JobRegistry::default();
        let started = registry.start("p-1").await;
        assert_eq!(started.status, JobStatus::Pending);

        registry.complete("p-1", Status::Success, Some(Path::new("out/p-1")), Vec::new()).await;
        let job = registry.get("p-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(job.output_directory.as_deref(), Some("out/p-1"));
        assert!(job.completed_at.unwrap() >= job.started_at);
    }

    #[tokio::test]
    async fn test_failure_and_listing() {
        let registry = JobRegistry::default();
        registry.start("a").await;
        registry.start("b").await;
        registry.fail("b", "disk full".to_string()).await;

        let listed = registry.list().await;
        assert_eq!(listed.len(), 2);
        let b = registry.get("b").await.unwrap();
        assert_eq!(b.status, JobStatus::Error);
        assert_eq!(b.errors[0].message, "disk full");
        assert!(registry.get("missing").await.is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_value(JobStatus::Pending).unwrap(), "pending");
        assert_eq!(JobStatus::from(Status::Processing), JobStatus::Error);
    }
}
