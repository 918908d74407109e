use jobwatch_logging::{watch_debug, watch_info};

use crate::transitions::diff;
use crate::{
    categories_to_refresh, parse_document_ids, validate_date, AppState, ArchiveCategory,
    DateRange, Effect, Msg, NoticeKind, TransitionEvent,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if !state.is_mounted() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::FeedReady { feed, at } => {
            state.finish_loading();
            if state.stabilizer_mut().push(feed, at) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FeedUpdated {
            current,
            previous,
            at,
        } => {
            state.finish_loading();
            let events = diff(&current, &previous);
            for event in &events {
                announce(&mut state, event);
            }
            let mut effects = Vec::new();
            for category in categories_to_refresh(&events) {
                effects.extend(refresh(&mut state, category));
            }
            if state.stabilizer_mut().push(current, at) {
                state.mark_dirty();
            }
            effects
        }
        Msg::Tick(now) => {
            if state.stabilizer_mut().poll(now) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TabActivated(category) => {
            state.set_active_tab(category);
            refresh(&mut state, category)
        }
        Msg::SentinelVisible(category) => fetch_next(&mut state, category),
        Msg::ArchivePageLoaded { request, page } => {
            if let Some(appended) = state.archive_mut().complete(&request, page) {
                watch_debug!(
                    "Archive {} page {} appended {} items",
                    request.category,
                    request.page,
                    appended
                );
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ArchivePageFailed { request, message } => {
            if state.archive_mut().fail(&request, message.clone()) {
                state.replace_notice(
                    NoticeKind::ArchiveFetch(request.category),
                    format!("Could not load {} archive: {message}", request.category),
                );
            }
            Vec::new()
        }
        Msg::DateRangeChanged {
            start_date,
            end_date,
        } => {
            let range = validate_date(start_date.as_deref()).and_then(|start_date| {
                validate_date(end_date.as_deref()).map(|end_date| DateRange {
                    start_date,
                    end_date,
                })
            });
            match range {
                Ok(range) => {
                    state.archive_mut().set_range(range);
                    state.mark_dirty();
                    let active = state.active_tab();
                    fetch_next(&mut state, active)
                }
                Err(err) => {
                    state.push_notice(NoticeKind::Validation, err.to_string());
                    Vec::new()
                }
            }
        }
        Msg::ScanRequested { newer_than } => match validate_date(newer_than.as_deref()) {
            Ok(newer_than) => vec![Effect::TriggerScan { newer_than }],
            Err(err) => {
                state.push_notice(NoticeKind::Validation, err.to_string());
                Vec::new()
            }
        },
        Msg::IndexRequested { older_than } => match validate_date(older_than.as_deref()) {
            Ok(older_than) => vec![Effect::TriggerIndex { older_than }],
            Err(err) => {
                state.push_notice(NoticeKind::Validation, err.to_string());
                Vec::new()
            }
        },
        Msg::ProcessRequested(raw) => match parse_document_ids(&raw) {
            Ok(document_ids) => vec![Effect::ProcessDocuments { document_ids }],
            Err(err) => {
                state.push_notice(NoticeKind::Validation, err.to_string());
                Vec::new()
            }
        },
        Msg::ClearErrorsRequested => vec![Effect::ClearErrorArchive],
        Msg::JobLaunched { action, job_id } => {
            let message = match job_id {
                Some(job_id) => format!("{} started (job {job_id})", action.label()),
                None => format!("{} started", action.label()),
            };
            state.push_notice(NoticeKind::Info, message);
            Vec::new()
        }
        Msg::JobLaunchFailed { action, message } => {
            state.push_notice(
                NoticeKind::LaunchFailed,
                format!("{} could not be started: {message}", action.label()),
            );
            Vec::new()
        }
        Msg::ErrorArchiveCleared { deleted } => {
            state.push_notice(NoticeKind::Info, format!("Cleared {deleted} archived errors"));
            refresh(&mut state, ArchiveCategory::Error)
        }
        Msg::ErrorArchiveClearFailed { message } => {
            state.push_notice(
                NoticeKind::LaunchFailed,
                format!("Error archive could not be cleared: {message}"),
            );
            Vec::new()
        }
        Msg::NoticeDismissed(id) => {
            state.dismiss_notice(id);
            Vec::new()
        }
        Msg::Unmounted => {
            state.unmount();
            vec![Effect::StopSync]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn announce(state: &mut AppState, event: &TransitionEvent) {
    match event {
        TransitionEvent::JobFailed { job_id, error } => {
            let reason = error.as_deref().unwrap_or("unknown error");
            state.push_notice(NoticeKind::JobFailed, format!("Job {job_id} failed: {reason}"));
        }
        TransitionEvent::NewDocumentErrors { job_id, errors } => {
            let details = errors
                .iter()
                .map(|e| format!("doc {}: {}", e.document_id, e.error))
                .collect::<Vec<_>>()
                .join("; ");
            state.push_notice(
                NoticeKind::DocumentErrors,
                format!("Job {job_id} reported {} new error(s): {details}", errors.len()),
            );
        }
        TransitionEvent::JobFinished {
            job_id,
            kind,
            status,
        } => {
            watch_info!("{} job {} finished as {}", kind.label(), job_id, status);
        }
    }
}

fn refresh(state: &mut AppState, category: ArchiveCategory) -> Vec<Effect> {
    state.archive_mut().reset(category);
    state.mark_dirty();
    fetch_next(state, category)
}

fn fetch_next(state: &mut AppState, category: ArchiveCategory) -> Vec<Effect> {
    match state.archive_mut().fetch_next(category) {
        Some(request) => {
            state.mark_dirty();
            vec![Effect::FetchArchivePage(request)]
        }
        None => Vec::new(),
    }
}
