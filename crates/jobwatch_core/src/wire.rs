//! Normalization of `GET /progress` bodies into a [`ProgressFeed`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{JobId, JobSnapshot, ProgressFeed};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("progress body is not a JSON object")]
    NotAnObject,
    #[error("malformed job entry: {0}")]
    MalformedJob(#[from] serde_json::Error),
}

/// Accepts either the all-jobs shape `{"jobs": {...}}` or a single job object.
///
/// A single job is keyed by `requested_job_id` when the caller asked for one,
/// otherwise by its status string. Objects carrying neither shape yield an
/// empty feed.
pub fn normalize_progress(
    body: Value,
    requested_job_id: Option<&str>,
) -> Result<ProgressFeed, WireError> {
    let Value::Object(mut object) = body else {
        return Err(WireError::NotAnObject);
    };

    if let Some(jobs) = object.remove("jobs") {
        let jobs: BTreeMap<JobId, JobSnapshot> = serde_json::from_value(jobs)?;
        return Ok(ProgressFeed::from(jobs));
    }

    if object.contains_key("status") {
        let snapshot: JobSnapshot = serde_json::from_value(Value::Object(object))?;
        let key = match requested_job_id {
            Some(job_id) => job_id.to_string(),
            None => snapshot.status.as_str().to_string(),
        };
        return Ok(ProgressFeed::new().with_job(key, snapshot));
    }

    Ok(ProgressFeed::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::JobStatus;

    #[test]
    fn all_jobs_shape_keeps_ids() {
        let feed = normalize_progress(
            json!({"jobs": {
                "index": {"status": "running", "total": 10, "processed": 3, "older_than": "2024-01-01", "last_reported": 1.5},
                "process-1": {"status": "failed", "error": "boom", "errors": [{"document_id": 4, "error": "x"}]}
            }}),
            None,
        )
        .unwrap();

        assert_eq!(feed.len(), 2);
        let index = feed.get("index").unwrap();
        assert_eq!(index.processed, Some(3));
        assert_eq!(index.filters.older_than.as_deref(), Some("2024-01-01"));
        let process = feed.get("process-1").unwrap();
        assert_eq!(process.status, JobStatus::Failed);
        assert_eq!(process.errors[0].document_id, 4);
    }

    #[test]
    fn single_job_is_keyed_by_request_or_status() {
        let body = json!({"status": "completed", "total": 1, "processed": 1,
                          "created_at": "2024-05-01T10:00:00.123456"});
        let by_id = normalize_progress(body.clone(), Some("abc")).unwrap();
        assert!(by_id.get("abc").is_some());

        let by_status = normalize_progress(body, None).unwrap();
        assert!(by_status.get("completed").is_some());
    }

    #[test]
    fn unknown_object_is_empty_and_non_object_is_error() {
        assert!(normalize_progress(json!({}), None).unwrap().is_empty());
        assert!(matches!(
            normalize_progress(json!([1, 2]), None),
            Err(WireError::NotAnObject)
        ));
        assert!(matches!(
            normalize_progress(json!({"jobs": {"a": {"status": "paused"}}}), None),
            Err(WireError::MalformedJob(_))
        ));
    }
}
