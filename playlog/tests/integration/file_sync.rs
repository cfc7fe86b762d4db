use std::fs;

use playlog::error::{ErrorClass, ErrorKind};
use playlog::oplog::csv_file::CsvOperationalLog;
use playlog::source::memory::MemoryEventSource;
use playlog::store::EventStore;
use playlog::store::csv_file::CsvEventStore;
use playlog::store::memory::MemoryEventStore;
use playlog::sync::{SyncOptions, Syncer};
use playlog::test_utils::event::{normalized_event, raw_event, store_from_events, store_ids};
use playlog::test_utils::faulty::ReadOnlyEventStore;
use playlog_telemetry::tracing::init_test_tracing;
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    store: CsvEventStore,
    log: CsvOperationalLog,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = CsvEventStore::new(dir.path().join("dat.csv"));
        let log = CsvOperationalLog::new(dir.path().join("log.csv"));

        Self {
            _dir: dir,
            store,
            log,
        }
    }

    fn syncer(
        &self,
        source: MemoryEventSource,
    ) -> Syncer<MemoryEventSource, CsvEventStore, CsvOperationalLog> {
        Syncer::new(
            source,
            self.store.clone(),
            self.log.clone(),
            SyncOptions::default(),
        )
    }

    fn log_messages(&self) -> Vec<String> {
        fs::read_to_string(self.log.path())
            .unwrap()
            .lines()
            .skip(1)
            .map(|line| line.splitn(3, ',').nth(2).unwrap().to_string())
            .collect()
    }
}

#[test]
fn successive_runs_close_the_gap_between_windows_test() {
    init_test_tracing();
    let workspace = Workspace::new();
    let source = MemoryEventSource::new(vec![
        raw_event("t2", "2024-01-01T00:00:02Z"),
        raw_event("t1", "2024-01-01T00:00:01Z"),
        raw_event("t3", "2024-01-01T00:00:03Z"),
    ]);
    let syncer = workspace.syncer(source.clone());

    let first = syncer.run().unwrap();
    assert_eq!(first.total_rows, 3);

    source.set_window(vec![
        raw_event("t5", "2024-01-01T00:00:05Z"),
        raw_event("t4", "2024-01-01T00:00:04Z"),
        raw_event("t3", "2024-01-01T00:00:03Z"),
    ]);
    let second = syncer.run().unwrap();

    assert_eq!(second.accepted, 2);
    assert_eq!(second.total_rows, 5);
    let stored = workspace.store.read().unwrap().unwrap();
    assert_eq!(store_ids(&stored), vec!["t5", "t4", "t3", "t2", "t1"]);
    assert_eq!(
        workspace.log_messages(),
        vec!["SUCCESS: 3 rows", "SUCCESS: 5 rows"]
    );
}

#[test]
fn rerunning_the_same_window_changes_nothing_test() {
    init_test_tracing();
    let workspace = Workspace::new();
    let source = MemoryEventSource::new(vec![
        raw_event("t1", "2024-01-01T00:00:01Z"),
        raw_event("t2", "2024-01-01T00:00:02Z"),
    ]);
    let syncer = workspace.syncer(source);

    syncer.run().unwrap();
    let after_first = fs::read(workspace.store.path()).unwrap();
    let summary = syncer.run().unwrap();
    let after_second = fs::read(workspace.store.path()).unwrap();

    assert_eq!(summary.accepted, 0);
    assert_eq!(after_first, after_second);
    assert_eq!(workspace.log_messages().len(), 2);
}

#[test]
fn corrupt_store_fails_the_run_without_overwriting_it_test() {
    init_test_tracing();
    let workspace = Workspace::new();
    let corrupt = ",id,played_at\n0,t1\n";
    fs::write(workspace.store.path(), corrupt).unwrap();
    let syncer = workspace.syncer(MemoryEventSource::new(vec![raw_event(
        "t2",
        "2024-01-01T00:00:02Z",
    )]));

    let err = syncer.run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StoreCorrupted);
    assert_eq!(err.class(), ErrorClass::Merge);
    assert_eq!(fs::read_to_string(workspace.store.path()).unwrap(), corrupt);
    let messages = workspace.log_messages();
    assert_eq!(messages.len(), 1);
    assert!(
        messages[0]
            .trim_start_matches('"')
            .starts_with("ERROR: merge error:")
    );
}

#[test]
fn malformed_window_fails_the_run_as_a_schema_error_test() {
    init_test_tracing();
    let workspace = Workspace::new();
    let mut broken = raw_event("t2", "2024-01-01T00:00:02Z");
    broken.played_at = None;
    let syncer = workspace.syncer(MemoryEventSource::new(vec![
        raw_event("t1", "2024-01-01T00:00:01Z"),
        broken,
    ]));

    let err = syncer.run().unwrap_err();

    assert_eq!(err.class(), ErrorClass::Schema);
    assert!(!workspace.store.path().exists());
}

#[test]
fn failed_write_keeps_the_previous_store_test() {
    init_test_tracing();
    let existing = store_from_events(&[normalized_event("t1", "2024-01-01T00:00:01Z")]);
    let memory = MemoryEventStore::with_store(existing.clone());
    let store = ReadOnlyEventStore::new(memory.clone());
    let syncer = Syncer::new(
        MemoryEventSource::new(vec![raw_event("t2", "2024-01-01T00:00:02Z")]),
        store.clone(),
        playlog::oplog::memory::MemoryOperationalLog::new(),
        SyncOptions::default(),
    );

    let err = syncer.run().unwrap_err();

    assert_eq!(err.class(), ErrorClass::Persist);
    assert_eq!(store.rejected_writes(), 1);
    assert_eq!(memory.current(), Some(existing));
}

#[test]
fn store_from_an_earlier_version_keeps_its_extra_columns_test() {
    init_test_tracing();
    let workspace = Workspace::new();
    fs::write(
        workspace.store.path(),
        ",id,name,played_at,mood\n0,t1,Old Song,2024-01-01T00:00:01.000Z,calm\n",
    )
    .unwrap();
    let syncer = workspace.syncer(MemoryEventSource::new(vec![raw_event(
        "t2",
        "2024-01-01T00:00:02.500Z",
    )]));

    syncer.run().unwrap();

    let stored = workspace.store.read().unwrap().unwrap();
    assert_eq!(&stored.columns()[..4], &["id", "name", "played_at", "mood"]);
    assert_eq!(stored.value(0, "id"), Some("t2"));
    assert_eq!(stored.value(0, "mood"), None);
    assert_eq!(stored.value(1, "mood"), Some("calm"));
    assert_eq!(stored.value(1, "played_at"), Some("2024-01-01T00:00:01.000Z"));
}

#[test]
fn empty_first_window_creates_an_empty_store_test() {
    init_test_tracing();
    let workspace = Workspace::new();
    let source = MemoryEventSource::new(vec![]);
    let syncer = workspace.syncer(source.clone());

    let summary = syncer.run().unwrap();
    assert_eq!(summary.total_rows, 0);

    source.set_window(vec![raw_event("t1", "2024-01-01T00:00:01Z")]);
    let summary = syncer.run().unwrap();

    assert_eq!(summary.total_rows, 1);
    assert_eq!(
        workspace.log_messages(),
        vec!["SUCCESS: 0 rows", "SUCCESS: 1 rows"]
    );
}
