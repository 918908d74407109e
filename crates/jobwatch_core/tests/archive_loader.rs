use chrono::{NaiveDate, NaiveDateTime};
use jobwatch_core::{
    ArchiveCategory, ArchiveLoader, ArchivePage, ArchiveRecord, DateRange, ErrorRecord,
    RenameRecord,
};
use pretty_assertions::assert_eq;

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .unwrap()
}

fn rename(id: i64) -> ArchiveRecord {
    ArchiveRecord::Rename(RenameRecord {
        id,
        timestamp: at(10),
        document_id: id as u64,
        old_title: format!("Scan_{id}"),
        new_title: format!("Invoice {id}"),
    })
}

fn error(id: i64) -> ArchiveRecord {
    ArchiveRecord::Error(ErrorRecord {
        id,
        timestamp: at(11),
        job_type: Some("process".to_string()),
        job_id: None,
        document_id: Some(id as u64),
        error_message: "vision model timeout".to_string(),
    })
}

fn page(items: Vec<ArchiveRecord>, page: u32, has_more: bool) -> ArchivePage {
    ArchivePage {
        total: 100,
        page,
        page_size: 2,
        has_more,
        items,
    }
}

#[test]
fn pages_are_requested_in_order_until_exhausted() {
    let mut loader = ArchiveLoader::new(2);
    let mut requested = Vec::new();

    for number in 1..=3u32 {
        let request = loader.fetch_next(ArchiveCategory::Rename).expect("page request");
        requested.push(request.page);
        let has_more = number < 3;
        let id = i64::from(number);
        loader.complete(&request, page(vec![rename(id * 2 - 1), rename(id * 2)], number, has_more));
    }

    assert_eq!(requested, vec![1, 2, 3]);
    assert_eq!(loader.items(ArchiveCategory::Rename).len(), 6);
    assert!(!loader.has_more(ArchiveCategory::Rename));
    assert!(loader.fetch_next(ArchiveCategory::Rename).is_none());
}

#[test]
fn second_trigger_while_in_flight_is_a_no_op() {
    let mut loader = ArchiveLoader::new(2);
    let first = loader.fetch_next(ArchiveCategory::Index);
    let second = loader.fetch_next(ArchiveCategory::Index);

    assert!(first.is_some());
    assert!(second.is_none());
    assert!(loader.is_loading(ArchiveCategory::Index));
    // Other categories are independent.
    assert!(loader.fetch_next(ArchiveCategory::Scan).is_some());
}

#[test]
fn exhausted_error_list_needs_reset_before_fetching_again() {
    let mut loader = ArchiveLoader::new(50);
    let request = loader.fetch_next(ArchiveCategory::Error).unwrap();
    assert_eq!(request.page, 1);
    loader.complete(&request, page(vec![error(1), error(2), error(3)], 1, false));

    assert_eq!(loader.items(ArchiveCategory::Error).len(), 3);
    assert!(loader.fetch_next(ArchiveCategory::Error).is_none());

    loader.reset(ArchiveCategory::Error);
    assert!(loader.items(ArchiveCategory::Error).is_empty());
    let again = loader.fetch_next(ArchiveCategory::Error).unwrap();
    assert_eq!(again.page, 1);
}

#[test]
fn failure_keeps_page_counter_for_retry() {
    let mut loader = ArchiveLoader::new(2);
    let first = loader.fetch_next(ArchiveCategory::Rename).unwrap();
    loader.complete(&first, page(vec![rename(1), rename(2)], 1, true));

    let second = loader.fetch_next(ArchiveCategory::Rename).unwrap();
    assert!(loader.fail(&second, "503 Service Unavailable"));
    assert_eq!(
        loader.last_error(ArchiveCategory::Rename),
        Some("503 Service Unavailable")
    );
    assert!(loader.has_more(ArchiveCategory::Rename));

    let retry = loader.fetch_next(ArchiveCategory::Rename).unwrap();
    assert_eq!(retry.page, 2);
    loader.complete(&retry, page(vec![rename(3)], 2, false));
    assert_eq!(loader.last_error(ArchiveCategory::Rename), None);
}

#[test]
fn response_for_a_reset_category_is_discarded() {
    let mut loader = ArchiveLoader::new(2);
    let stale = loader.fetch_next(ArchiveCategory::Scan).unwrap();
    loader.reset(ArchiveCategory::Scan);
    let fresh = loader.fetch_next(ArchiveCategory::Scan).unwrap();

    assert_eq!(fresh.page, 1);
    assert_ne!(stale.generation, fresh.generation);
    assert_eq!(loader.complete(&stale, page(vec![rename(1)], 1, true)), None);
    assert!(!loader.fail(&stale, "late failure"));
    assert!(loader.is_loading(ArchiveCategory::Scan));
    assert_eq!(loader.complete(&fresh, page(vec![rename(2)], 1, true)), Some(1));
}

#[test]
fn empty_page_ends_the_list() {
    let mut loader = ArchiveLoader::new(2);
    let request = loader.fetch_next(ArchiveCategory::Rename).unwrap();
    loader.complete(&request, page(Vec::new(), 1, true));
    assert!(!loader.has_more(ArchiveCategory::Rename));
}

#[test]
fn date_range_is_carried_and_resets_everything() {
    let mut loader = ArchiveLoader::new(2);
    let request = loader.fetch_next(ArchiveCategory::Rename).unwrap();
    loader.complete(&request, page(vec![rename(1)], 1, true));

    let range = DateRange {
        start_date: Some("2024-01-01".to_string()),
        end_date: None,
    };
    loader.set_range(range.clone());

    assert!(loader.items(ArchiveCategory::Rename).is_empty());
    let next = loader.fetch_next(ArchiveCategory::Rename).unwrap();
    assert_eq!(next.page, 1);
    assert_eq!(next.range, range);
}
