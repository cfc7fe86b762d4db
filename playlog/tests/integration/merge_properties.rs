use playlog::error::ErrorClass;
use playlog::merge::merge;
use playlog::test_utils::event::{normalized_event, store_from_events, store_ids};
use playlog::types::{NormalizedEvent, PlayedAt, Store};
use playlog_telemetry::tracing::init_test_tracing;

fn batch(events: &[(&str, &str)]) -> Vec<NormalizedEvent> {
    events
        .iter()
        .map(|(id, played_at)| normalized_event(id, played_at))
        .collect()
}

fn played_at(raw: &str) -> PlayedAt {
    PlayedAt::parse(raw).unwrap()
}

#[test]
fn merging_the_same_batch_twice_is_idempotent_test() {
    init_test_tracing();

    let window = batch(&[
        ("t2", "2024-01-01T00:00:02Z"),
        ("t1", "2024-01-01T00:00:01Z"),
    ]);

    let first = merge(None, &window).unwrap().store;
    let second = merge(Some(first.clone()), &window).unwrap().store;
    let third = merge(Some(second.clone()), &window).unwrap().store;

    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn watermark_never_decreases_across_merges_test() {
    init_test_tracing();

    let windows = [
        batch(&[
            ("t1", "2024-01-01T00:00:10Z"),
            ("t2", "2024-01-01T00:00:20Z"),
        ]),
        // Entirely older than the watermark.
        batch(&[("t0", "2024-01-01T00:00:05Z")]),
        batch(&[
            ("t3", "2024-01-01T00:00:30Z"),
            ("t2", "2024-01-01T00:00:20Z"),
        ]),
        batch(&[]),
    ];

    let mut store: Option<Store> = None;
    let mut last_watermark: Option<PlayedAt> = None;
    for window in &windows {
        let outcome = merge(store.take(), window).unwrap();

        assert!(outcome.watermark >= last_watermark);
        assert_eq!(outcome.watermark, outcome.store.watermark().unwrap());

        last_watermark = outcome.watermark.clone();
        store = Some(outcome.store);
    }

    assert_eq!(last_watermark, Some(played_at("2024-01-01T00:00:30Z")));
}

#[test]
fn every_event_newer_than_the_watermark_appears_exactly_once_test() {
    init_test_tracing();

    let existing = store_from_events(&batch(&[
        ("a", "2024-01-01T00:00:10Z"),
        ("b", "2024-01-01T00:00:05Z"),
    ]));
    let window = batch(&[
        ("d", "2024-01-01T00:00:40Z"),
        ("c", "2024-01-01T00:00:20Z"),
        ("a", "2024-01-01T00:00:10Z"),
        ("e", "2024-01-01T00:00:30Z"),
    ]);

    let outcome = merge(Some(existing), &window).unwrap();
    let ids = store_ids(&outcome.store);

    for newer in ["d", "c", "e"] {
        assert_eq!(ids.iter().filter(|id| *id == newer).count(), 1, "{newer}");
    }
    assert_eq!(ids, vec!["d", "c", "e", "a", "b"]);
}

#[test]
fn columns_only_grow_and_recorded_values_survive_test() {
    init_test_tracing();

    let legacy = Store::from_parts(
        vec![
            "id".to_string(),
            "played_at".to_string(),
            "mood".to_string(),
        ],
        vec![vec![
            Some("old".to_string()),
            Some("2024-01-01T00:00:00Z".to_string()),
            Some("calm".to_string()),
        ]],
    )
    .unwrap();

    // The new event has no popularity, so that column only appears with the next batch.
    let mut sparse = normalized_event("new1", "2024-01-02T00:00:00Z");
    sparse.popularity = None;

    let first = merge(Some(legacy.clone()), &[sparse]).unwrap().store;
    let second = merge(
        Some(first.clone()),
        &batch(&[("new2", "2024-01-03T00:00:00Z")]),
    )
    .unwrap()
    .store;

    for (before, after) in [(&legacy, &first), (&first, &second)] {
        assert_eq!(&after.columns()[..before.columns().len()], before.columns());
    }
    assert!(first.column_index("popularity").is_none());
    assert!(second.column_index("popularity").is_some());

    let old_row = second.len() - 1;
    assert_eq!(second.value(old_row, "mood"), Some("calm"));
    assert_eq!(second.value(old_row, "popularity"), None);
    assert_eq!(second.value(1, "popularity"), None);
    assert_eq!(second.value(0, "popularity"), Some("42"));
}

#[test]
fn initial_merge_orders_newest_first_test() {
    init_test_tracing();

    let window = batch(&[
        ("t1", "2024-01-01T00:00:01Z"),
        ("t2", "2024-01-01T00:00:02Z"),
        ("t3", "2024-01-01T00:00:03Z"),
    ]);

    let outcome = merge(None, &window).unwrap();

    assert_eq!(store_ids(&outcome.store), vec!["t3", "t2", "t1"]);
}

#[test]
fn only_events_strictly_after_the_watermark_are_added_test() {
    init_test_tracing();

    let existing = store_from_events(&batch(&[("w", "2024-01-01T00:00:00Z")]));
    let window = batch(&[
        ("at", "2024-01-01T00:00:00Z"),
        ("after", "2024-01-01T00:00:01Z"),
    ]);

    let outcome = merge(Some(existing), &window).unwrap();

    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.accepted[0].id, "after");
    assert_eq!(outcome.store.len(), 2);
}

#[test]
fn window_at_or_below_the_watermark_leaves_rows_unchanged_test() {
    init_test_tracing();

    // 100 seconds after the epoch is the watermark.
    let existing = store_from_events(&batch(&[
        ("w", "1970-01-01T00:01:40Z"),
        ("v", "1970-01-01T00:01:00Z"),
    ]));
    let window = batch(&[
        ("w", "1970-01-01T00:01:40Z"),
        ("x", "1970-01-01T00:01:39Z"),
        ("y", "1970-01-01T00:00:01Z"),
    ]);

    let outcome = merge(Some(existing.clone()), &window).unwrap();

    assert!(outcome.is_noop());
    assert_eq!(outcome.store.rows(), existing.rows());
}

#[test]
fn unreadable_existing_store_is_a_merge_error_test() {
    init_test_tracing();

    let broken = Store::from_parts(
        vec!["id".to_string(), "played_at".to_string()],
        vec![vec![Some("t1".to_string()), None]],
    )
    .unwrap();

    let err = merge(Some(broken), &batch(&[("t2", "2024-01-01T00:00:00Z")])).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Merge);
}
