use std::time::Instant;

use crate::{ArchiveCategory, ArchivePage, PageRequest, ProgressFeed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// First non-waiting fetch finished; ends the loading phase.
    FeedReady { feed: ProgressFeed, at: Instant },
    /// Store delivery of a later fetch.
    FeedUpdated {
        current: ProgressFeed,
        previous: ProgressFeed,
        at: Instant,
    },
    /// Render tick; flushes deferred display updates.
    Tick(Instant),
    /// User switched the archive tab.
    TabActivated(ArchiveCategory),
    /// The end-of-list sentinel of a category is visible (level-triggered).
    SentinelVisible(ArchiveCategory),
    /// Engine delivered the page claimed by `request`.
    ArchivePageLoaded {
        request: PageRequest,
        page: ArchivePage,
    },
    /// Engine failed to fetch the page claimed by `request`.
    ArchivePageFailed {
        request: PageRequest,
        message: String,
    },
    /// User edited the archive date bounds (raw `YYYY-MM-DD` text, blank clears).
    DateRangeChanged {
        start_date: Option<String>,
        end_date: Option<String>,
    },
    /// User asked for a scan of documents newer than a date.
    ScanRequested { newer_than: Option<String> },
    /// User asked for bulk indexing of documents older than a date.
    IndexRequested { older_than: Option<String> },
    /// User submitted document ids for processing (raw text).
    ProcessRequested(String),
    /// User asked to clear the error archive.
    ClearErrorsRequested,
    /// Backend accepted a job launch.
    JobLaunched {
        action: LaunchAction,
        job_id: Option<String>,
    },
    /// Backend rejected a job launch or could not be reached.
    JobLaunchFailed { action: LaunchAction, message: String },
    ErrorArchiveCleared { deleted: u64 },
    ErrorArchiveClearFailed { message: String },
    NoticeDismissed(u64),
    /// The dashboard is going away; nothing is applied afterwards.
    Unmounted,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchAction {
    Scan,
    Index,
    ProcessDocuments,
}

impl LaunchAction {
    pub fn label(self) -> &'static str {
        match self {
            LaunchAction::Scan => "Scan",
            LaunchAction::Index => "Index",
            LaunchAction::ProcessDocuments => "Document processing",
        }
    }
}
