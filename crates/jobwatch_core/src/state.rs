use std::time::Duration;

use crate::view_model::{AppViewModel, ArchiveView, JobRowView};
use crate::{
    ArchiveCategory, ArchiveLoader, DisplayStabilizer, JobKind, ProgressFeed,
    DEFAULT_MIN_DISPLAY_TIME, DEFAULT_PAGE_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    JobFailed,
    DocumentErrors,
    ArchiveFetch(ArchiveCategory),
    Validation,
    LaunchFailed,
    Info,
}

/// A dismissible message shown above the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    mounted: bool,
    loading: bool,
    active_tab: ArchiveCategory,
    archive: ArchiveLoader,
    stabilizer: DisplayStabilizer<ProgressFeed>,
    notices: Vec<Notice>,
    next_notice_id: u64,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(DEFAULT_MIN_DISPLAY_TIME, DEFAULT_PAGE_SIZE)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(min_display_time: Duration, page_size: u32) -> Self {
        Self {
            mounted: true,
            loading: true,
            active_tab: ArchiveCategory::Rename,
            archive: ArchiveLoader::new(page_size),
            stabilizer: DisplayStabilizer::new(min_display_time),
            notices: Vec::new(),
            next_notice_id: 1,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let jobs = self
            .stabilizer
            .displayed()
            .map(|feed| {
                feed.iter()
                    .map(|(job_id, job)| JobRowView {
                        job_id: job_id.clone(),
                        kind: JobKind::from_job_id(job_id),
                        status: job.status,
                        processed: job.processed,
                        total: job.total,
                        percent: job.fraction().map(|f| (f * 100.0).round() as u8),
                        error_count: job.errors.len(),
                        error: job.error.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let running_jobs = jobs
            .iter()
            .filter(|job| !job.status.is_terminal())
            .count();
        let category = self.active_tab;

        AppViewModel {
            loading: self.loading,
            running_jobs,
            jobs,
            active_tab: category,
            archive: ArchiveView {
                category,
                rows: self
                    .archive
                    .items(category)
                    .iter()
                    .map(|record| {
                        format!(
                            "{}  {}",
                            record.timestamp().format("%Y-%m-%d %H:%M"),
                            record.summary()
                        )
                    })
                    .collect(),
                total: self.archive.total(category),
                has_more: self.archive.has_more(category),
                loading: self.archive.is_loading(category),
                error: self.archive.last_error(category).map(ToOwned::to_owned),
            },
            notices: self.notices.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn active_tab(&self) -> ArchiveCategory {
        self.active_tab
    }

    pub fn archive(&self) -> &ArchiveLoader {
        &self.archive
    }

    pub fn displayed_feed(&self) -> Option<&ProgressFeed> {
        self.stabilizer.displayed()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn unmount(&mut self) {
        self.mounted = false;
        self.stabilizer.cancel();
    }

    pub(crate) fn finish_loading(&mut self) {
        if self.loading {
            self.loading = false;
            self.dirty = true;
        }
    }

    pub(crate) fn set_active_tab(&mut self, category: ArchiveCategory) {
        self.active_tab = category;
        self.dirty = true;
    }

    pub(crate) fn archive_mut(&mut self) -> &mut ArchiveLoader {
        &mut self.archive
    }

    pub(crate) fn stabilizer_mut(&mut self) -> &mut DisplayStabilizer<ProgressFeed> {
        &mut self.stabilizer
    }

    pub(crate) fn push_notice(&mut self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        let id = self.next_notice_id;
        self.next_notice_id += 1;
        self.notices.push(Notice {
            id,
            kind,
            message: message.into(),
        });
        self.dirty = true;
        id
    }

    /// Replaces an undismissed notice of the same kind instead of stacking.
    pub(crate) fn replace_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        let message = message.into();
        if let Some(existing) = self.notices.iter_mut().find(|notice| notice.kind == kind) {
            existing.message = message;
            self.dirty = true;
        } else {
            self.push_notice(kind, message);
        }
    }

    pub(crate) fn dismiss_notice(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        let removed = self.notices.len() != before;
        self.dirty |= removed;
        removed
    }
}
