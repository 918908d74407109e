use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use jobwatch_core::{Effect, Msg};
use jobwatch_engine::{EngineEvent, EngineHandle};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchArchivePage(request) => {
                    watch_debug!(
                        "FetchArchivePage category={} page={} generation={}",
                        request.category,
                        request.page,
                        request.generation
                    );
                    self.engine.fetch_archive_page(request);
                }
                Effect::TriggerScan { newer_than } => {
                    watch_info!("TriggerScan newer_than={:?}", newer_than);
                    self.engine.trigger_scan(newer_than);
                }
                Effect::TriggerIndex { older_than } => {
                    watch_info!("TriggerIndex older_than={:?}", older_than);
                    self.engine.trigger_index(older_than);
                }
                Effect::ProcessDocuments { document_ids } => {
                    watch_info!("ProcessDocuments count={}", document_ids.len());
                    self.engine.process_documents(document_ids);
                }
                Effect::ClearErrorArchive => self.engine.clear_error_archive(),
                Effect::StopSync => self.engine.shutdown(),
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            match engine.recv_timeout(Duration::from_millis(100)) {
                Some(event) => {
                    let msg = map_event(&engine, event);
                    if msg_tx.send(msg).is_err() {
                        break;
                    }
                }
                None if engine.is_shut_down() => break,
                None => {}
            }
        });
    }
}

fn map_event(engine: &EngineHandle, event: EngineEvent) -> Msg {
    match event {
        // A later feed may already be in the store if this event was slow to arrive.
        EngineEvent::FeedReady(feed) => Msg::FeedReady {
            feed: engine.store().current().unwrap_or(feed),
            at: Instant::now(),
        },
        EngineEvent::ArchivePageLoaded { request, page } => {
            Msg::ArchivePageLoaded { request, page }
        }
        EngineEvent::ArchivePageFailed { request, error } => {
            watch_warn!("Archive {} page {} failed: {}", request.category, request.page, error);
            Msg::ArchivePageFailed {
                request,
                message: error.message,
            }
        }
        EngineEvent::JobLaunched { action, job_id } => Msg::JobLaunched { action, job_id },
        EngineEvent::JobLaunchFailed { action, error } => Msg::JobLaunchFailed {
            action,
            message: error.message,
        },
        EngineEvent::ErrorArchiveCleared { deleted } => Msg::ErrorArchiveCleared { deleted },
        EngineEvent::ErrorArchiveClearFailed { error } => {
            watch_warn!("Clearing the error archive failed: {error}");
            Msg::ErrorArchiveClearFailed {
                message: error.message,
            }
        }
    }
}
