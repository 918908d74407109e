use crate::{ArchiveCategory, JobId, JobKind, JobStatus, Notice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub loading: bool,
    pub running_jobs: usize,
    pub jobs: Vec<JobRowView>,
    pub active_tab: ArchiveCategory,
    pub archive: ArchiveView,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub processed: Option<u64>,
    pub total: Option<u64>,
    pub percent: Option<u8>,
    pub error_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveView {
    pub category: ArchiveCategory,
    pub rows: Vec<String>,
    pub total: Option<u64>,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}
