//! Discrete events derived from two consecutive progress feeds.

use crate::{DocumentError, JobId, JobKind, JobStatus, ProgressFeed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent {
    /// A job observed as running is now failed.
    JobFailed {
        job_id: JobId,
        error: Option<String>,
    },
    /// A running job appended document errors; only the new suffix is carried.
    NewDocumentErrors {
        job_id: JobId,
        errors: Vec<DocumentError>,
    },
    /// A job reached a terminal status since the previous feed.
    JobFinished {
        job_id: JobId,
        kind: JobKind,
        status: JobStatus,
    },
}

impl TransitionEvent {
    pub fn job_id(&self) -> &str {
        match self {
            TransitionEvent::JobFailed { job_id, .. }
            | TransitionEvent::NewDocumentErrors { job_id, .. }
            | TransitionEvent::JobFinished { job_id, .. } => job_id,
        }
    }
}

/// Compares `current` against `previous` and reports every transition once.
///
/// Feeding the same feed as both arguments yields no events. Jobs absent from
/// `current` are treated as removed and produce nothing.
pub fn diff(current: &ProgressFeed, previous: &ProgressFeed) -> Vec<TransitionEvent> {
    let mut events = Vec::new();

    for (job_id, job) in current.iter() {
        let before = previous.get(job_id);
        let was_running = before.is_some_and(|prev| prev.status == JobStatus::Running);

        if was_running && job.status == JobStatus::Failed {
            events.push(TransitionEvent::JobFailed {
                job_id: job_id.clone(),
                error: job.error.clone(),
            });
        }

        if job.status == JobStatus::Running {
            let seen = before.map_or(0, |prev| prev.errors.len());
            if job.errors.len() > seen {
                events.push(TransitionEvent::NewDocumentErrors {
                    job_id: job_id.clone(),
                    errors: job.errors[seen..].to_vec(),
                });
            }
        }

        let status_changed = before.map_or(true, |prev| prev.status != job.status);
        if job.status.is_terminal() && (was_running || status_changed) {
            events.push(TransitionEvent::JobFinished {
                job_id: job_id.clone(),
                kind: JobKind::from_job_id(job_id),
                status: job.status,
            });
        }
    }

    events
}
