use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type JobId = String;

/// Id under which the backend tracks the single bulk-index job.
pub const INDEX_JOB_ID: &str = "index";
/// Prefix of on-demand and webhook-triggered document processing jobs.
pub const PROCESS_JOB_PREFIX: &str = "process-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Index,
    Scan,
    Process,
}

impl JobKind {
    /// Classifies a job by the id the backend assigned to it.
    pub fn from_job_id(job_id: &str) -> Self {
        if job_id == INDEX_JOB_ID {
            JobKind::Index
        } else if job_id.starts_with(PROCESS_JOB_PREFIX) {
            JobKind::Process
        } else {
            JobKind::Scan
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobKind::Index => "index",
            JobKind::Scan => "scan",
            JobKind::Process => "process",
        }
    }
}

/// One failed document inside a running job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentError {
    pub document_id: u64,
    pub error: String,
}

/// Request parameters echoed back by the backend for the job that used them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newer_than: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub older_than: Option<String>,
}

impl JobFilters {
    pub fn is_empty(&self) -> bool {
        self.newer_than.is_none() && self.older_than.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub processed: Option<u64>,
    #[serde(default)]
    pub errors: Vec<DocumentError>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub filters: JobFilters,
    /// Terminal failure message, present once `status` is `failed`.
    #[serde(default)]
    pub error: Option<String>,
    /// Set for jobs started by a document webhook.
    #[serde(default)]
    pub document_id: Option<u64>,
}

impl JobSnapshot {
    pub fn running(processed: u64, total: u64) -> Self {
        Self {
            status: JobStatus::Running,
            total: Some(total),
            processed: Some(processed),
            ..Self::with_status(JobStatus::Running)
        }
    }

    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            total: None,
            processed: None,
            errors: Vec::new(),
            created_at: None,
            completed_at: None,
            filters: JobFilters::default(),
            error: None,
            document_id: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<DocumentError>) -> Self {
        self.errors = errors;
        self
    }

    /// Completed fraction in `0.0..=1.0`, when the backend reported a total.
    pub fn fraction(&self) -> Option<f64> {
        match (self.processed, self.total) {
            (Some(processed), Some(total)) if total > 0 => {
                Some((processed.min(total) as f64) / (total as f64))
            }
            _ => None,
        }
    }
}

/// Mapping of job id to its latest snapshot, replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressFeed {
    jobs: BTreeMap<JobId, JobSnapshot>,
}

impl ProgressFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &str) -> Option<&JobSnapshot> {
        self.jobs.get(job_id)
    }

    pub fn insert(&mut self, job_id: impl Into<JobId>, snapshot: JobSnapshot) {
        self.jobs.insert(job_id.into(), snapshot);
    }

    pub fn with_job(mut self, job_id: impl Into<JobId>, snapshot: JobSnapshot) -> Self {
        self.insert(job_id, snapshot);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JobId, &JobSnapshot)> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.jobs
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .count()
    }
}

impl FromIterator<(JobId, JobSnapshot)> for ProgressFeed {
    fn from_iter<I: IntoIterator<Item = (JobId, JobSnapshot)>>(iter: I) -> Self {
        Self {
            jobs: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<JobId, JobSnapshot>> for ProgressFeed {
    fn from(jobs: BTreeMap<JobId, JobSnapshot>) -> Self {
        Self { jobs }
    }
}
