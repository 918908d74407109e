use jobwatch_core::validate_document_ids;
use jobwatch_logging::watch_info;
use serde::Deserialize;
use serde_json::json;

use crate::client::{malformed, ApiClient};
use crate::{FailureKind, FetchError};

/// Acknowledgement returned by the job-launch endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStarted {
    pub status: String,
    #[serde(default)]
    pub job_id: Option<String>,
}

#[async_trait::async_trait]
pub trait JobLauncher: Send + Sync {
    async fn trigger_scan(&self, newer_than: Option<&str>) -> Result<JobStarted, FetchError>;
    async fn trigger_index(&self, older_than: Option<&str>) -> Result<JobStarted, FetchError>;
    /// Rejects an empty list or a zero id without contacting the backend.
    async fn process_documents(&self, document_ids: &[u64]) -> Result<JobStarted, FetchError>;
    async fn health(&self) -> Result<(), FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobLauncher {
    api: ApiClient,
}

impl ReqwestJobLauncher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn launch(
        &self,
        url: reqwest::Url,
        body: Option<serde_json::Value>,
    ) -> Result<JobStarted, FetchError> {
        let response = self.api.post(url, body.as_ref()).await?;
        let started: JobStarted = serde_json::from_value(response).map_err(malformed)?;
        watch_info!("Backend accepted job: {} ({:?})", started.status, started.job_id);
        Ok(started)
    }
}

#[async_trait::async_trait]
impl JobLauncher for ReqwestJobLauncher {
    async fn trigger_scan(&self, newer_than: Option<&str>) -> Result<JobStarted, FetchError> {
        let url = self
            .api
            .endpoint("scan", &[("newer_than", newer_than.map(ToOwned::to_owned))]);
        self.launch(url, None).await
    }

    async fn trigger_index(&self, older_than: Option<&str>) -> Result<JobStarted, FetchError> {
        let url = self
            .api
            .endpoint("index", &[("older_than", older_than.map(ToOwned::to_owned))]);
        self.launch(url, None).await
    }

    async fn process_documents(&self, document_ids: &[u64]) -> Result<JobStarted, FetchError> {
        validate_document_ids(document_ids)
            .map_err(|err| FetchError::new(FailureKind::Validation, err.to_string()))?;
        let url = self.api.endpoint("process-documents", &[]);
        self.launch(url, Some(json!({ "document_ids": document_ids })))
            .await
    }

    async fn health(&self) -> Result<(), FetchError> {
        let body = self.api.get(self.api.endpoint("health", &[]), None).await?;
        match body.get("status").and_then(|status| status.as_str()) {
            Some("ok") => Ok(()),
            _ => Err(FetchError::new(
                FailureKind::Malformed,
                format!("unexpected health response {body}"),
            )),
        }
    }
}
