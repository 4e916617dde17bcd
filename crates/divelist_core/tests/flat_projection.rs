use divelist_core::filter::oracle::VisibilityOracle;
use divelist_core::{
    ChangedData, Column, Dive, DiveId, DiveProjection, FlatProjection, MemoryDiveRepository,
    ModelEvent, ProjectionContext, RowIndex, ShowAll,
};
use std::cell::Cell;

fn insert(store: &mut MemoryDiveRepository, when: i64) -> DiveId {
    store.insert_dive(Dive::new(when)).unwrap()
}

fn populated(store: &MemoryDiveRepository, oracle: &dyn VisibilityOracle) -> FlatProjection {
    let mut projection = FlatProjection::new();
    let mut events = Vec::new();
    projection.populate(&ProjectionContext::new(store, oracle), &mut events);
    projection
}

fn whens(projection: &FlatProjection) -> Vec<i64> {
    projection.dive_keys().iter().map(|key| key.when).collect()
}

#[test]
fn adding_three_dives_to_empty_list_is_one_insert() {
    let mut store = MemoryDiveRepository::new();
    let mut projection = populated(&store, &ShowAll);

    let t3 = insert(&mut store, 300);
    let t1 = insert(&mut store, 100);
    let t2 = insert(&mut store, 200);

    let mut events = Vec::new();
    projection.dives_added(
        &ProjectionContext::new(&store, &ShowAll),
        None,
        false,
        &[t3, t1, t2],
        &mut events,
    );

    assert_eq!(whens(&projection), vec![100, 200, 300]);
    assert_eq!(
        events,
        vec![
            ModelEvent::RowsInserted {
                parent: None,
                first: 0,
                last: 3,
            },
            ModelEvent::CountVisibleChanged,
        ]
    );
}

#[test]
fn adding_between_rows_inserts_once_per_slot() {
    let mut store = MemoryDiveRepository::new();
    insert(&mut store, 100);
    insert(&mut store, 400);
    let mut projection = populated(&store, &ShowAll);

    let added: Vec<DiveId> = [50, 60, 200, 500]
        .into_iter()
        .map(|when| insert(&mut store, when))
        .collect();
    let mut events = Vec::new();
    projection.dives_added(
        &ProjectionContext::new(&store, &ShowAll),
        None,
        false,
        &added,
        &mut events,
    );

    assert_eq!(whens(&projection), vec![50, 60, 100, 200, 400, 500]);
    let inserts: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|event| match event {
            ModelEvent::RowsInserted { first, last, .. } => Some((*first, *last)),
            _ => None,
        })
        .collect();
    assert_eq!(inserts, vec![(0, 2), (3, 4), (5, 6)]);
}

#[test]
fn deleting_detached_dives_removes_contiguous_runs() {
    let mut store = MemoryDiveRepository::new();
    let ids: Vec<DiveId> = (1..=6).map(|i| insert(&mut store, i * 100)).collect();
    let mut projection = populated(&store, &ShowAll);

    let doomed = [ids[4], ids[1], ids[2]];
    for id in doomed {
        store.remove_dive(id).unwrap();
    }
    let mut events = Vec::new();
    projection.dives_deleted(
        &ProjectionContext::new(&store, &ShowAll),
        None,
        false,
        &doomed,
        &mut events,
    );

    assert_eq!(whens(&projection), vec![100, 400, 600]);
    assert_eq!(
        events,
        vec![
            ModelEvent::RowsRemoved {
                parent: None,
                first: 1,
                last: 3,
            },
            ModelEvent::RowsRemoved {
                parent: None,
                first: 2,
                last: 3,
            },
            ModelEvent::CountVisibleChanged,
        ]
    );
}

#[test]
fn changed_dives_refresh_runs_and_report_visibility_flips() {
    let mut store = MemoryDiveRepository::new();
    let ids: Vec<DiveId> = (1..=3)
        .map(|i| {
            let mut dive = Dive::new(i * 100);
            dive.rating = 3;
            store.insert_dive(dive).unwrap()
        })
        .collect();
    let rated = |dive: &Dive| dive.rating > 0;
    let mut projection = populated(&store, &rated);

    let mut events = Vec::new();
    store.dive_mut(ids[2]).unwrap().buddy = "Ann".to_string();
    projection.dives_changed(
        &ProjectionContext::new(&store, &rated),
        &[ids[2]],
        &mut events,
    );
    assert_eq!(
        events,
        vec![ModelEvent::DataChanged {
            parent: None,
            first: 2,
            last: 3,
            columns: ChangedData::All,
        }]
    );

    events.clear();
    store.dive_mut(ids[0]).unwrap().rating = 0;
    store.dive_mut(ids[1]).unwrap().rating = 0;
    projection.dives_changed(
        &ProjectionContext::new(&store, &rated),
        &[ids[1], ids[0]],
        &mut events,
    );
    assert_eq!(
        events,
        vec![
            ModelEvent::DataChanged {
                parent: None,
                first: 0,
                last: 2,
                columns: ChangedData::All,
            },
            ModelEvent::CountVisibleChanged,
        ]
    );
    assert!(!projection.is_shown(RowIndex::top(0)));
    assert_eq!(projection.shown_count(), 1);
}

#[test]
fn renumbering_resorts_dives_sharing_a_start_time() {
    let mut store = MemoryDiveRepository::new();
    let first = insert(&mut store, 100);
    let second = insert(&mut store, 100);
    store.dive_mut(first).unwrap().number = 1;
    store.dive_mut(second).unwrap().number = 2;
    let mut projection = populated(&store, &ShowAll);

    store.dive_mut(first).unwrap().number = 3;
    let mut events = Vec::new();
    projection.dives_changed(
        &ProjectionContext::new(&store, &ShowAll),
        &[first],
        &mut events,
    );

    assert_eq!(
        events,
        vec![
            ModelEvent::RowsRemoved {
                parent: None,
                first: 0,
                last: 1,
            },
            ModelEvent::RowsInserted {
                parent: None,
                first: 1,
                last: 2,
            },
        ]
    );
    assert_eq!(projection.row_of(first), Some(RowIndex::top(1)));
    assert_eq!(projection.dive_keys(), populated(&store, &ShowAll).dive_keys());
}

#[test]
fn filter_recompute_reports_flipped_runs_and_is_idempotent() {
    let mut store = MemoryDiveRepository::new();
    for (i, rating) in [1u8, 3, 3, 1, 3].into_iter().enumerate() {
        let mut dive = Dive::new(i as i64 * 100);
        dive.rating = rating;
        store.insert_dive(dive).unwrap();
    }
    let threshold = Cell::new(0u8);
    let oracle = |dive: &Dive| dive.rating >= threshold.get();
    let mut projection = populated(&store, &oracle);
    assert_eq!(projection.shown_count(), 5);

    threshold.set(2);
    let mut events = Vec::new();
    projection.filter_recompute(&ProjectionContext::new(&store, &oracle), &mut events);
    assert_eq!(
        events,
        vec![
            ModelEvent::DataChanged {
                parent: None,
                first: 0,
                last: 1,
                columns: ChangedData::Visibility,
            },
            ModelEvent::DataChanged {
                parent: None,
                first: 3,
                last: 4,
                columns: ChangedData::Visibility,
            },
            ModelEvent::CountVisibleChanged,
        ]
    );
    assert_eq!(projection.shown_count(), 3);

    events.clear();
    projection.filter_recompute(&ProjectionContext::new(&store, &oracle), &mut events);
    assert_eq!(events, vec![ModelEvent::CountVisibleChanged]);
}

#[test]
fn moves_between_trips_leave_the_list_alone() {
    let mut store = MemoryDiveRepository::new();
    let id = insert(&mut store, 100);
    let mut projection = populated(&store, &ShowAll);

    let mut events = Vec::new();
    projection.dives_moved(
        &ProjectionContext::new(&store, &ShowAll),
        None,
        Some(uuid::Uuid::new_v4()),
        false,
        true,
        &[id],
        &mut events,
    );
    assert!(events.is_empty());
}

#[test]
fn time_shift_moves_dive_to_its_new_slot() {
    let mut store = MemoryDiveRepository::new();
    let first = insert(&mut store, 100);
    insert(&mut store, 200);
    insert(&mut store, 300);
    let mut projection = populated(&store, &ShowAll);

    store.shift_times(&[first], 250).unwrap();
    let mut events = Vec::new();
    projection.dives_time_shifted(
        &ProjectionContext::new(&store, &ShowAll),
        250,
        &[first],
        &mut events,
    );

    assert_eq!(whens(&projection), vec![200, 300, 350]);
    assert_eq!(projection.row_of(first), Some(RowIndex::top(2)));
    assert_eq!(
        events,
        vec![
            ModelEvent::RowsRemoved {
                parent: None,
                first: 0,
                last: 1,
            },
            ModelEvent::RowsInserted {
                parent: None,
                first: 2,
                last: 3,
            },
            ModelEvent::CountVisibleChanged,
        ]
    );
}

#[test]
fn column_sort_breaks_ties_by_later_row_first() {
    let mut store = MemoryDiveRepository::new();
    for (when, depth) in [(100, 10_000), (200, 30_000), (300, 10_000)] {
        let mut dive = Dive::new(when);
        dive.max_depth_mm = depth;
        store.insert_dive(dive).unwrap();
    }
    let projection = populated(&store, &ShowAll);

    assert_eq!(projection.sorted_rows(&store, Column::Depth), vec![2, 0, 1]);
    assert_eq!(projection.sorted_rows(&store, Column::Date), vec![0, 1, 2]);
}

#[test]
fn events_before_populate_are_ignored() {
    let mut store = MemoryDiveRepository::new();
    let id = insert(&mut store, 100);
    let mut projection = FlatProjection::new();
    let mut events = Vec::new();
    projection.dives_added(
        &ProjectionContext::new(&store, &ShowAll),
        None,
        false,
        &[id],
        &mut events,
    );
    assert!(events.is_empty());
    assert_eq!(projection.row_count(None), 0);
}

#[test]
fn two_list_projections_keep_separate_visibility() {
    let mut store = MemoryDiveRepository::new();
    let mut deep = Dive::new(100);
    deep.max_depth_mm = 40_000;
    store.insert_dive(deep).unwrap();
    insert(&mut store, 200);

    let deep_only = |dive: &Dive| dive.max_depth_mm > 30_000;
    let all = populated(&store, &ShowAll);
    let filtered = populated(&store, &deep_only);

    assert_eq!(all.shown_count(), 2);
    assert_eq!(filtered.shown_count(), 1);
    assert!(!filtered.is_shown(RowIndex::top(1)));
    assert!(all.is_shown(RowIndex::top(1)));
}
