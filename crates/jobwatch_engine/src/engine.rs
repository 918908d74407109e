use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use jobwatch_core::{LaunchAction, PageRequest, ProgressFeed, ProgressStore};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};
use tokio_util::sync::CancellationToken;

use crate::archive::{ArchiveSource, ReqwestArchive};
use crate::client::ApiClient;
use crate::jobs::{JobLauncher, JobStarted, ReqwestJobLauncher};
use crate::poller::{FeedSink, PollSettings, ProgressPoller};
use crate::transport::ReqwestTransport;
use crate::{EngineError, EngineEvent, FetchError, SyncSettings};

enum EngineCommand {
    FetchArchivePage(PageRequest),
    TriggerScan { newer_than: Option<String> },
    TriggerIndex { older_than: Option<String> },
    ProcessDocuments { document_ids: Vec<u64> },
    ClearErrorArchive,
    Shutdown,
}

struct Services {
    archive: Arc<dyn ArchiveSource>,
    jobs: Arc<dyn JobLauncher>,
}

/// Applies every feed to the store and reports the first one as an event.
struct ReadyAnnouncer {
    store: Arc<ProgressStore>,
    event_tx: mpsc::Sender<EngineEvent>,
    announced: AtomicBool,
}

impl FeedSink for ReadyAnnouncer {
    fn apply(&self, feed: ProgressFeed) {
        let first = !self.announced.swap(true, Ordering::SeqCst);
        if first {
            self.store.apply(feed.clone());
            let _ = self.event_tx.send(EngineEvent::FeedReady(feed));
        } else {
            self.store.apply(feed);
        }
    }
}

/// Owns the background runtime: the progress poller plus one task per command.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    store: Arc<ProgressStore>,
    cancel: CancellationToken,
}

impl EngineHandle {
    pub fn new(settings: SyncSettings) -> Result<Self, EngineError> {
        let api = ApiClient::new(&settings)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("jobwatch-engine")
            .build()?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let store = Arc::new(ProgressStore::new());
        let cancel = CancellationToken::new();

        let services = Arc::new(Services {
            archive: Arc::new(ReqwestArchive::new(api.clone())),
            jobs: Arc::new(ReqwestJobLauncher::new(api.clone())),
        });
        let sink = Arc::new(ReadyAnnouncer {
            store: Arc::clone(&store),
            event_tx: event_tx.clone(),
            announced: AtomicBool::new(false),
        });
        let poller = ProgressPoller::new(
            ReqwestTransport::new(api, settings.timeout_margin),
            sink,
            PollSettings::from(&settings),
            cancel.clone(),
        );

        watch_info!("Starting sync engine against {}", settings.base_url);
        let health_jobs = Arc::clone(&services.jobs);
        thread::spawn(move || {
            runtime.spawn(async move {
                match health_jobs.health().await {
                    Ok(()) => watch_debug!("Backend health check passed"),
                    Err(err) => watch_warn!("Backend health check failed: {err}"),
                }
            });
            runtime.spawn(async move {
                let stats = poller.run().await;
                watch_info!(
                    "Progress poller stopped: {} delivered, {} timeouts, {} failures",
                    stats.delivered,
                    stats.timeouts,
                    stats.failures
                );
            });
            while let Ok(command) = cmd_rx.recv() {
                if matches!(command, EngineCommand::Shutdown) {
                    break;
                }
                let services = Arc::clone(&services);
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&services, command, &event_tx).await;
                });
            }
            runtime.shutdown_timeout(Duration::from_secs(1));
            watch_debug!("Engine runtime shut down");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            store,
            cancel,
        })
    }

    /// The store the poller writes into; subscribe here for feed updates.
    pub fn store(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.store)
    }

    pub fn fetch_archive_page(&self, request: PageRequest) {
        self.send(EngineCommand::FetchArchivePage(request));
    }

    pub fn trigger_scan(&self, newer_than: Option<String>) {
        self.send(EngineCommand::TriggerScan { newer_than });
    }

    pub fn trigger_index(&self, older_than: Option<String>) {
        self.send(EngineCommand::TriggerIndex { older_than });
    }

    pub fn process_documents(&self, document_ids: Vec<u64>) {
        self.send(EngineCommand::ProcessDocuments { document_ids });
    }

    pub fn clear_error_archive(&self) {
        self.send(EngineCommand::ClearErrorArchive);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    /// Stops the poller and the runtime. Results still in flight are dropped.
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.send(EngineCommand::Shutdown);
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            watch_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(
    services: &Services,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::FetchArchivePage(request) => {
            match services.archive.fetch_page(&request).await {
                Ok(page) => EngineEvent::ArchivePageLoaded { request, page },
                Err(error) => EngineEvent::ArchivePageFailed { request, error },
            }
        }
        EngineCommand::TriggerScan { newer_than } => launched(
            LaunchAction::Scan,
            services.jobs.trigger_scan(newer_than.as_deref()).await,
        ),
        EngineCommand::TriggerIndex { older_than } => launched(
            LaunchAction::Index,
            services.jobs.trigger_index(older_than.as_deref()).await,
        ),
        EngineCommand::ProcessDocuments { document_ids } => launched(
            LaunchAction::ProcessDocuments,
            services.jobs.process_documents(&document_ids).await,
        ),
        EngineCommand::ClearErrorArchive => match services.archive.clear_errors().await {
            Ok(deleted) => EngineEvent::ErrorArchiveCleared { deleted },
            Err(error) => EngineEvent::ErrorArchiveClearFailed { error },
        },
        EngineCommand::Shutdown => return,
    };
    let _ = event_tx.send(event);
}

fn launched(action: LaunchAction, result: Result<JobStarted, FetchError>) -> EngineEvent {
    match result {
        Ok(started) => EngineEvent::JobLaunched {
            action,
            job_id: started.job_id,
        },
        Err(error) => {
            watch_warn!("{} request failed: {error}", action.label());
            EngineEvent::JobLaunchFailed { action, error }
        }
    }
}
