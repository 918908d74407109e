use std::sync::{Arc, Mutex};

use jobwatch_core::{JobSnapshot, JobStatus, ProgressFeed, ProgressStore, Subscription};

fn init_logging() {
    jobwatch_logging::initialize_for_tests();
}

fn feed(processed: u64) -> ProgressFeed {
    ProgressFeed::new().with_job("scan-1", JobSnapshot::running(processed, 10))
}

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(store: &ProgressStore, name: &'static str, log: &Log) -> Subscription {
    let log = log.clone();
    store.subscribe(move |current, previous| {
        let now = current.get("scan-1").and_then(|job| job.processed);
        let before = previous.get("scan-1").and_then(|job| job.processed);
        log.lock()
            .unwrap()
            .push(format!("{name}:{before:?}->{now:?}"));
    })
}

#[test]
fn first_feed_only_ends_loading() {
    init_logging();
    let store = ProgressStore::new();
    let log = Log::default();
    let _sub = recorder(&store, "a", &log);

    assert!(store.is_loading());
    assert_eq!(store.apply(feed(0)), 0);
    assert!(!store.is_loading());
    assert_eq!(store.current(), Some(feed(0)));
    assert!(store.previous().is_none());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn later_feeds_reach_subscribers_in_registration_order() {
    init_logging();
    let store = ProgressStore::new();
    let log = Log::default();
    let _a = recorder(&store, "a", &log);
    let _b = recorder(&store, "b", &log);

    store.apply(feed(0));
    assert_eq!(store.apply(feed(4)), 2);
    store.apply(feed(7));

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "a:Some(0)->Some(4)",
            "b:Some(0)->Some(4)",
            "a:Some(4)->Some(7)",
            "b:Some(4)->Some(7)",
        ]
    );
    assert_eq!(store.previous(), Some(feed(4)));
}

#[test]
fn panicking_subscriber_does_not_block_others() {
    init_logging();
    let store = ProgressStore::new();
    let log = Log::default();
    let _bad = store.subscribe(|_, _| panic!("subscriber bug"));
    let _good = recorder(&store, "good", &log);

    store.apply(feed(0));
    assert_eq!(store.apply(feed(1)), 1);
    assert_eq!(store.apply(feed(2)), 1);
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn unsubscribe_during_delivery_keeps_remaining_rounds_exact() {
    init_logging();
    let store = ProgressStore::new();
    let log = Log::default();

    let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
    let slot = victim_slot.clone();
    let killer_log = log.clone();
    let _killer = store.subscribe(move |_, _| {
        killer_log.lock().unwrap().push("killer".to_string());
        if let Some(victim) = slot.lock().unwrap().take() {
            victim.unsubscribe();
        }
    });
    let victim = recorder(&store, "victim", &log);
    let _tail = recorder(&store, "tail", &log);
    *victim_slot.lock().unwrap() = Some(victim);

    store.apply(feed(0));
    store.apply(feed(1));
    store.apply(feed(2));

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "killer",
            "tail:Some(0)->Some(1)",
            "killer",
            "tail:Some(1)->Some(2)",
        ]
    );
    assert_eq!(store.subscriber_count(), 2);
}

#[test]
fn unsubscribed_handle_reports_inactive() {
    init_logging();
    let store = ProgressStore::new();
    let sub = store.subscribe(|_, _| {});
    assert!(sub.is_active());
    sub.unsubscribe();
    assert!(!sub.is_active());
    // Unsubscribing twice is harmless.
    sub.unsubscribe();
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn subscribers_may_read_the_store_while_being_notified() {
    init_logging();
    let store = Arc::new(ProgressStore::new());
    let seen = Arc::new(Mutex::new(None));
    let inner_store = store.clone();
    let inner_seen = seen.clone();
    let _sub = store.subscribe(move |_, _| {
        *inner_seen.lock().unwrap() = inner_store.current();
    });

    store.apply(feed(0));
    let done = ProgressFeed::new().with_job("scan-1", JobSnapshot::with_status(JobStatus::Completed));
    store.apply(done.clone());

    assert_eq!(*seen.lock().unwrap(), Some(done));
}
