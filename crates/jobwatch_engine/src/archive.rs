use jobwatch_core::{ArchiveCategory, ArchivePage, PageRequest};
use jobwatch_logging::{watch_debug, watch_warn};
use serde::Deserialize;

use crate::client::{malformed, ApiClient};
use crate::FetchError;

#[async_trait::async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ArchivePage, FetchError>;

    /// Deletes every archived error; returns how many were removed.
    async fn clear_errors(&self) -> Result<u64, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestArchive {
    api: ApiClient,
}

impl ReqwestArchive {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[derive(Debug, Deserialize)]
struct ClearResponse {
    deleted_count: u64,
}

#[async_trait::async_trait]
impl ArchiveSource for ReqwestArchive {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ArchivePage, FetchError> {
        let url = self.api.endpoint(
            "archive",
            &[
                ("type", Some(request.category.as_str().to_string())),
                ("page", Some(request.page.to_string())),
                ("limit", Some(request.limit.to_string())),
                ("start_date", request.range.start_date.clone()),
                ("end_date", request.range.end_date.clone()),
            ],
        );
        watch_debug!("Fetching {} archive page {}", request.category, request.page);
        let body = self.api.get(url, None).await?;
        let page = request.category.decode_page(body).map_err(malformed)?;
        if page.page != request.page {
            watch_warn!(
                "Archive {} answered page {} for request of page {}",
                request.category,
                page.page,
                request.page
            );
        }
        Ok(page)
    }

    async fn clear_errors(&self) -> Result<u64, FetchError> {
        let url = self.api.endpoint(
            "archive",
            &[("type", Some(ArchiveCategory::Error.as_str().to_string()))],
        );
        let body = self.api.delete(url).await?;
        let cleared: ClearResponse = serde_json::from_value(body).map_err(malformed)?;
        Ok(cleared.deleted_count)
    }
}
