use std::fmt;

use jobwatch_core::{ArchivePage, LaunchAction, PageRequest, ProgressFeed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The first non-waiting fetch succeeded; the store is no longer loading.
    FeedReady(ProgressFeed),
    ArchivePageLoaded {
        request: PageRequest,
        page: ArchivePage,
    },
    ArchivePageFailed {
        request: PageRequest,
        error: FetchError,
    },
    JobLaunched {
        action: LaunchAction,
        job_id: Option<String>,
    },
    JobLaunchFailed {
        action: LaunchAction,
        error: FetchError,
    },
    ErrorArchiveCleared {
        deleted: u64,
    },
    ErrorArchiveClearFailed {
        error: FetchError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A long-poll that ran out of time: "nothing changed", not a failure.
    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Malformed,
    Network,
    Validation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Malformed => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Validation => write!(f, "invalid input"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
}
