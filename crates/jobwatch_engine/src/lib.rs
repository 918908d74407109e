//! Jobwatch engine: HTTP transport, long-poll loop, and effect execution.
mod archive;
mod client;
mod engine;
mod jobs;
mod poller;
mod settings;
mod transport;
mod types;

pub use archive::{ArchiveSource, ReqwestArchive};
pub use client::ApiClient;
pub use engine::EngineHandle;
pub use jobs::{JobLauncher, JobStarted, ReqwestJobLauncher};
pub use poller::{FeedSink, PollSettings, PollStats, ProgressPoller};
pub use settings::SyncSettings;
pub use transport::{ProgressTransport, ReqwestTransport};
pub use types::{EngineError, EngineEvent, FailureKind, FetchError};
