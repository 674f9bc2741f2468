mod common;

use std::path::PathBuf;
use std::rc::Rc;

use aster_harness::gallery::DEFAULT_VOTE_FLAG_KEY;
use aster_harness::store::{FileKv, JsonRecordStore, MemoryKv, MemoryRecordStore};
use aster_harness::traits::{KeyValueStore, Notifier, RecordStore};
use aster_harness::types::{SubmissionRecord, SUBMISSIONS_TABLE};
use aster_harness::{Gallery, HarnessError};
use pollster::block_on;

use common::RecordingNotifier;

fn record(user: &str) -> SubmissionRecord {
    SubmissionRecord {
        user: user.to_string(),
        code: "rotating-cube".to_string(),
        video_url: format!("https://cdn.example/{user}.mjpeg"),
    }
}

fn gallery(records: Rc<dyn RecordStore>, flags: Rc<dyn KeyValueStore>, notifier: Rc<dyn Notifier>) -> Gallery {
    Gallery::new(records, flags, notifier, SUBMISSIONS_TABLE, DEFAULT_VOTE_FLAG_KEY)
}

#[test]
fn test_single_vote_per_client() {
    let records = Rc::new(MemoryRecordStore::new());
    records.seed(SUBMISSIONS_TABLE, record("ada"), 4);
    records.seed(SUBMISSIONS_TABLE, record("grace"), 7);
    let flags = Rc::new(MemoryKv::new());
    let notifier = Rc::new(RecordingNotifier::default());
    let mut gallery = gallery(records.clone(), flags.clone(), notifier.clone());

    block_on(gallery.refresh()).unwrap();
    block_on(gallery.vote("ada")).unwrap();

    let ada = |rows: &[aster_harness::SubmissionRow]| rows.iter().find(|r| r.user == "ada").map(|r| r.vote);
    assert_eq!(ada(gallery.rows()), Some(5));
    assert_eq!(records.rows(SUBMISSIONS_TABLE)[0].vote, 5);
    assert!(gallery.has_voted());
    assert_eq!(flags.get(DEFAULT_VOTE_FLAG_KEY).as_deref(), Some("true"));

    let calls = records.calls();
    let err = block_on(gallery.vote("grace")).unwrap_err();
    assert!(matches!(err, HarnessError::AlreadyVoted));
    assert_eq!(records.calls(), calls);
    assert_eq!(records.rows(SUBMISSIONS_TABLE)[1].vote, 7);
    assert_eq!(*notifier.alerts.borrow(), vec!["You have already cast your vote!".to_string()]);
}

#[test]
fn test_failed_vote_leaves_flag_unset() {
    let records = Rc::new(MemoryRecordStore::new());
    records.seed(SUBMISSIONS_TABLE, record("ada"), 0);
    records.set_fail_votes(true);
    let flags = Rc::new(MemoryKv::new());
    let notifier = Rc::new(RecordingNotifier::default());
    let mut gallery = gallery(records.clone(), flags, notifier.clone());

    let err = block_on(gallery.vote("ada")).unwrap_err();
    assert!(matches!(err, HarnessError::Vote(_)));
    assert!(!gallery.has_voted());
    assert_eq!(
        *notifier.alerts.borrow(),
        vec!["An error occurred while casting your vote.".to_string()]
    );

    // the client may retry once the store recovers
    records.set_fail_votes(false);
    block_on(gallery.vote("ada")).unwrap();
    assert_eq!(records.rows(SUBMISSIONS_TABLE)[0].vote, 1);
}

#[test]
fn test_failed_refresh_keeps_rows() {
    let records = Rc::new(MemoryRecordStore::new());
    records.seed(SUBMISSIONS_TABLE, record("ada"), 1);
    let mut gallery = gallery(records.clone(), Rc::new(MemoryKv::new()), Rc::new(RecordingNotifier::default()));

    block_on(gallery.refresh()).unwrap();
    records.set_fail_selects(true);
    assert!(matches!(block_on(gallery.refresh()), Err(HarnessError::Fetch(_))));
    assert_eq!(gallery.rows().len(), 1);
}

fn scratch() -> PathBuf {
    std::env::temp_dir().join(format!("aster-gallery-{}", uuid::Uuid::new_v4()))
}

#[test]
fn test_vote_flag_survives_restart() {
    let dir = scratch();
    let submissions = dir.join("submissions.json");
    let flags = dir.join("flags.json");

    let records = Rc::new(JsonRecordStore::new(&submissions));
    block_on(records.insert(SUBMISSIONS_TABLE, &record("ada"))).unwrap();
    block_on(records.insert(SUBMISSIONS_TABLE, &record("grace"))).unwrap();

    let mut first = gallery(records, Rc::new(FileKv::new(&flags)), Rc::new(RecordingNotifier::default()));
    block_on(first.vote("grace")).unwrap();

    let mut second = gallery(
        Rc::new(JsonRecordStore::new(&submissions)),
        Rc::new(FileKv::new(&flags)),
        Rc::new(RecordingNotifier::default()),
    );
    block_on(second.refresh()).unwrap();
    let ranked: Vec<_> = second.ranked().into_iter().map(|r| (r.user.clone(), r.vote)).collect();
    assert_eq!(ranked, vec![("grace".to_string(), 1), ("ada".to_string(), 0)]);
    assert!(second.has_voted());
    assert!(matches!(block_on(second.vote("ada")), Err(HarnessError::AlreadyVoted)));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_vote_uses_configured_table() {
    let records = Rc::new(MemoryRecordStore::new());
    records.seed("entries", record("ada"), 2);
    let mut gallery = Gallery::new(
        records.clone(),
        Rc::new(MemoryKv::new()),
        Rc::new(RecordingNotifier::default()),
        "entries",
        DEFAULT_VOTE_FLAG_KEY,
    );

    block_on(gallery.refresh()).unwrap();
    block_on(gallery.vote("ada")).unwrap();

    assert_eq!(records.rows("entries")[0].vote, 3);
    assert!(records.rows(SUBMISSIONS_TABLE).is_empty());
    assert_eq!(gallery.rows()[0].vote, 3);
}

#[test]
fn test_file_store_votes_in_configured_table() {
    let dir = scratch();
    let records = Rc::new(JsonRecordStore::new(dir.join("submissions.json")));
    block_on(records.insert("entries", &record("grace"))).unwrap();
    let mut gallery = Gallery::new(
        records.clone(),
        Rc::new(MemoryKv::new()),
        Rc::new(RecordingNotifier::default()),
        "entries",
        DEFAULT_VOTE_FLAG_KEY,
    );

    block_on(gallery.vote("grace")).unwrap();

    let rows = block_on(records.select("entries")).unwrap();
    assert_eq!(rows[0].vote, 1);
    assert!(block_on(records.select(SUBMISSIONS_TABLE)).unwrap().is_empty());

    let _ = std::fs::remove_dir_all(dir);
}
