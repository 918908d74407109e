use std::time::Duration;

use jobwatch_core::wire::normalize_progress;
use jobwatch_core::ProgressFeed;

use crate::client::{malformed, ApiClient};
use crate::FetchError;

/// One request at a time against the job-progress endpoint.
///
/// `poll` takes `&mut self`, so a transport can never have two requests
/// outstanding.
#[async_trait::async_trait]
pub trait ProgressTransport: Send {
    /// With `wait`, the server holds the request until something changes or
    /// `timeout_secs` pass. A client-side deadline surfaces as a timeout error
    /// (see [`FetchError::is_timeout`]); everything else is a network error.
    async fn poll(
        &mut self,
        job_id: Option<&str>,
        wait: bool,
        timeout_secs: u64,
    ) -> Result<ProgressFeed, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    api: ApiClient,
    timeout_margin: Duration,
}

impl ReqwestTransport {
    pub fn new(api: ApiClient, timeout_margin: Duration) -> Self {
        Self {
            api,
            timeout_margin,
        }
    }
}

#[async_trait::async_trait]
impl ProgressTransport for ReqwestTransport {
    async fn poll(
        &mut self,
        job_id: Option<&str>,
        wait: bool,
        timeout_secs: u64,
    ) -> Result<ProgressFeed, FetchError> {
        let url = self.api.endpoint(
            "progress",
            &[
                ("job_id", job_id.map(ToOwned::to_owned)),
                ("wait", Some(wait.to_string())),
                ("timeout", Some(timeout_secs.to_string())),
            ],
        );
        // The client deadline must outlive the server's hold time.
        let deadline = wait.then(|| Duration::from_secs(timeout_secs) + self.timeout_margin);
        let body = self.api.get(url, deadline).await?;
        normalize_progress(body, job_id).map_err(malformed)
    }
}
