use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use jobwatch_core::{JobSnapshot, ProgressFeed};
use jobwatch_engine::{
    FailureKind, FeedSink, FetchError, PollSettings, ProgressPoller, ProgressTransport,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

enum Step {
    Reply(Result<ProgressFeed, FetchError>),
    Delayed(Duration, Result<ProgressFeed, FetchError>),
}

#[derive(Clone, Default)]
struct Script {
    steps: Arc<Mutex<VecDeque<Step>>>,
    waits: Arc<Mutex<Vec<bool>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Script {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            ..Self::default()
        }
    }

    fn waits(&self) -> Vec<bool> {
        self.waits.lock().unwrap().clone()
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ScriptedTransport(Script);

#[async_trait::async_trait]
impl ProgressTransport for ScriptedTransport {
    async fn poll(
        &mut self,
        _job_id: Option<&str>,
        wait: bool,
        _timeout_secs: u64,
    ) -> Result<ProgressFeed, FetchError> {
        let script = &self.0;
        let now = script.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        script.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&script.in_flight));
        script.waits.lock().unwrap().push(wait);

        let step = script.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(result)) => result,
            Some(Step::Delayed(delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            // Script exhausted: behave like a long-poll that never returns.
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    feeds: Mutex<Vec<ProgressFeed>>,
}

impl RecordingSink {
    fn feeds(&self) -> Vec<ProgressFeed> {
        self.feeds.lock().unwrap().clone()
    }
}

impl FeedSink for RecordingSink {
    fn apply(&self, feed: ProgressFeed) {
        self.feeds.lock().unwrap().push(feed);
    }
}

fn feed(processed: u64) -> ProgressFeed {
    ProgressFeed::new().with_job("index", JobSnapshot::running(processed, 10))
}

fn failure(kind: FailureKind) -> FetchError {
    FetchError {
        kind,
        message: "scripted".to_string(),
    }
}

fn fast_settings() -> PollSettings {
    PollSettings {
        long_poll_timeout_secs: 30,
        poll_retry_delay: Duration::from_millis(60),
        resync_retry_delay: Duration::from_millis(20),
    }
}

async fn wait_for_calls(script: &Script, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while script.waits().len() < count {
        assert!(Instant::now() < deadline, "poller stalled at {:?}", script.waits());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn start(
    script: &Script,
    sink: &Arc<RecordingSink>,
    settings: PollSettings,
) -> (CancellationToken, tokio::task::JoinHandle<jobwatch_engine::PollStats>) {
    let cancel = CancellationToken::new();
    let poller = ProgressPoller::new(
        ScriptedTransport(script.clone()),
        Arc::clone(sink) as Arc<dyn FeedSink>,
        settings,
        cancel.clone(),
    );
    (cancel, tokio::spawn(poller.run()))
}

#[tokio::test]
async fn first_request_does_not_wait_then_long_polls() {
    let script = Script::new(vec![Step::Reply(Ok(feed(1))), Step::Reply(Ok(feed(2)))]);
    let sink = Arc::new(RecordingSink::default());
    let (cancel, handle) = start(&script, &sink, fast_settings());

    wait_for_calls(&script, 3).await;
    cancel.cancel();
    let stats = handle.await.expect("poller task");

    assert_eq!(script.waits(), vec![false, true, true]);
    assert_eq!(sink.feeds(), vec![feed(1), feed(2)]);
    assert_eq!(stats.delivered, 2);
    assert_eq!(script.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn timeout_triggers_immediate_resync() {
    let script = Script::new(vec![
        Step::Reply(Ok(feed(1))),
        Step::Reply(Err(failure(FailureKind::Timeout))),
        Step::Reply(Ok(feed(4))),
    ]);
    let sink = Arc::new(RecordingSink::default());
    let (cancel, handle) = start(&script, &sink, fast_settings());

    wait_for_calls(&script, 4).await;
    cancel.cancel();
    let stats = handle.await.expect("poller task");

    assert_eq!(script.waits(), vec![false, true, false, true]);
    assert_eq!(sink.feeds(), vec![feed(1), feed(4)]);
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.failures, 0);
}

#[tokio::test]
async fn failed_resync_backs_off_before_long_polling_again() {
    let script = Script::new(vec![
        Step::Reply(Ok(feed(1))),
        Step::Reply(Err(failure(FailureKind::Timeout))),
        Step::Reply(Err(failure(FailureKind::Network))),
    ]);
    let sink = Arc::new(RecordingSink::default());
    let (cancel, handle) = start(&script, &sink, fast_settings());

    wait_for_calls(&script, 4).await;
    cancel.cancel();
    let stats = handle.await.expect("poller task");

    assert_eq!(script.waits(), vec![false, true, false, true]);
    assert_eq!(stats.failures, 1);
    assert_eq!(sink.feeds(), vec![feed(1)]);
}

#[tokio::test]
async fn network_failure_waits_retry_delay() {
    let script = Script::new(vec![
        Step::Reply(Err(failure(FailureKind::Network))),
        Step::Reply(Ok(feed(3))),
    ]);
    let sink = Arc::new(RecordingSink::default());
    let started = Instant::now();
    let (cancel, handle) = start(&script, &sink, fast_settings());

    wait_for_calls(&script, 3).await;
    let elapsed = started.elapsed();
    cancel.cancel();
    handle.await.expect("poller task");

    assert!(elapsed >= Duration::from_millis(60), "retried after {elapsed:?}");
    assert_eq!(script.waits(), vec![false, false, true]);
    assert_eq!(sink.feeds(), vec![feed(3)]);
}

#[tokio::test]
async fn response_after_cancel_is_discarded() {
    let script = Script::new(vec![Step::Delayed(Duration::from_millis(150), Ok(feed(9)))]);
    let sink = Arc::new(RecordingSink::default());
    let (cancel, handle) = start(&script, &sink, fast_settings());

    wait_for_calls(&script, 1).await;
    cancel.cancel();
    let stats = handle.await.expect("poller task");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(sink.feeds().is_empty());
    assert_eq!(stats.delivered, 0);
    assert_eq!(script.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_during_backoff_stops_promptly() {
    let script = Script::new(vec![Step::Reply(Err(failure(FailureKind::Network)))]);
    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings {
        poll_retry_delay: Duration::from_secs(30),
        ..fast_settings()
    };
    let (cancel, handle) = start(&script, &sink, settings);

    wait_for_calls(&script, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();
    let stats = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("stopped within backoff")
        .expect("poller task");

    assert_eq!(stats.failures, 1);
    assert_eq!(script.waits(), vec![false]);
}
