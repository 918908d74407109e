use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;

use crate::{FailureKind, FetchError, SyncSettings};

/// Thin JSON-over-HTTP wrapper around the backend API root.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(settings: &SyncSettings) -> Result<Self, FetchError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as an API root", settings.base_url),
            ));
        }
        // No client-wide timeout: long-polls set their own per request.
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            http,
            base,
            request_timeout: settings.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Builds `{base}/{path}?{query}`; `None` query values are skipped.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, Option<String>)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.split('/'));
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        url
    }

    pub(crate) async fn get(&self, url: Url, timeout: Option<Duration>) -> Result<Value, FetchError> {
        self.send(Method::GET, url, None, timeout).await
    }

    pub(crate) async fn post(&self, url: Url, body: Option<&Value>) -> Result<Value, FetchError> {
        self.send(Method::POST, url, body, None).await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<Value, FetchError> {
        self.send(Method::DELETE, url, None, None).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, FetchError> {
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .timeout(timeout.unwrap_or(self.request_timeout));
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|err| FetchError::new(FailureKind::Malformed, err.to_string()))?;
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                error_detail(&bytes).unwrap_or_else(|| status.to_string()),
            ));
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Malformed, err.to_string()))
    }
}

/// The backend reports failures as `{"detail": "..."}`.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("detail")?.as_str().map(ToOwned::to_owned)
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

pub(crate) fn malformed(err: impl std::fmt::Display) -> FetchError {
    FetchError::new(FailureKind::Malformed, err.to_string())
}
