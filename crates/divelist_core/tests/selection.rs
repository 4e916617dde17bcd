use divelist_core::{
    ChangedData, Dive, DiveId, DiveListService, DiveSite, MemoryDiveRepository, ModelEvent,
    ProjectionKind, RowIndex, RowRange, SiteField, StoreEvent, TextFilter, TextQuery, Trip,
    TripId,
};
use uuid::Uuid;

struct Fixture {
    service: DiveListService<MemoryDiveRepository>,
    a: TripId,
    b: TripId,
    moved: DiveId,
    bare: DiveId,
}

/// Trip A holds 500 and 600, 800 has no trip, trip B holds 1000.
fn fixture(kind: ProjectionKind) -> Fixture {
    let mut store = MemoryDiveRepository::new();
    let mut a_trip = Trip::new("A");
    a_trip.id = Uuid::from_u128(1);
    let a = store.insert_trip(a_trip).unwrap();
    let mut b_trip = Trip::new("B");
    b_trip.id = Uuid::from_u128(2);
    let b = store.insert_trip(b_trip).unwrap();

    let mut insert = |when: i64, trip: Option<TripId>| {
        let mut dive = Dive::new(when);
        dive.trip = trip;
        store.insert_dive(dive).unwrap()
    };
    let moved = insert(500, Some(a));
    insert(600, Some(a));
    let bare = insert(800, None);
    insert(1000, Some(b));

    let mut service = DiveListService::new(store, kind);
    service.populate();
    Fixture {
        service,
        a,
        b,
        moved,
        bare,
    }
}

fn selection_events(events: &[ModelEvent]) -> Vec<&ModelEvent> {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                ModelEvent::SelectionChanged { .. } | ModelEvent::CurrentChanged { .. }
            )
        })
        .collect()
}

#[test]
fn selecting_dives_emits_ranges_and_current_row() {
    let mut fx = fixture(ProjectionKind::Tree);
    let events = fx.service.handle(StoreEvent::DivesSelected {
        dives: vec![fx.bare],
        current: Some(fx.moved),
    });
    assert_eq!(
        events,
        vec![
            ModelEvent::SelectionChanged {
                ranges: vec![
                    RowRange {
                        parent: Some(0),
                        first: 0,
                        last: 1,
                    },
                    RowRange {
                        parent: None,
                        first: 1,
                        last: 2,
                    },
                ],
            },
            ModelEvent::CurrentChanged {
                row: Some(RowIndex::child(0, 0)),
            },
        ]
    );
}

#[test]
fn selection_follows_dive_moved_into_other_trip() {
    let mut fx = fixture(ProjectionKind::Tree);
    fx.service.handle(StoreEvent::DivesSelected {
        dives: vec![fx.moved],
        current: Some(fx.moved),
    });

    fx.service
        .repo_mut()
        .assign_trip(&[fx.moved], Some(fx.b))
        .unwrap();
    let events = fx.service.handle(StoreEvent::DivesMovedBetweenTrips {
        from: Some(fx.a),
        to: Some(fx.b),
        delete_from: false,
        create_to: false,
        dives: vec![fx.moved],
    });

    let last_structural = events
        .iter()
        .rposition(ModelEvent::is_structural)
        .unwrap();
    let first_selection = events
        .iter()
        .position(|event| matches!(event, ModelEvent::SelectionChanged { .. }))
        .unwrap();
    assert!(first_selection > last_structural);

    let b_row = fx.service.projection().row_of(fx.moved).unwrap();
    assert_eq!(b_row, RowIndex::child(0, 0));
    assert_eq!(fx.service.projection().trip_at(0), Some(fx.b));
    assert_eq!(
        selection_events(&events),
        vec![
            &ModelEvent::SelectionChanged {
                ranges: vec![RowRange {
                    parent: Some(0),
                    first: 0,
                    last: 1,
                }],
            },
            &ModelEvent::CurrentChanged { row: Some(b_row) },
        ]
    );
}

#[test]
fn time_shift_of_unselected_dives_only_tracks_current() {
    let mut fx = fixture(ProjectionKind::List);
    fx.service.handle(StoreEvent::DivesSelected {
        dives: vec![],
        current: Some(fx.bare),
    });
    assert_eq!(
        fx.service.projection().row_of(fx.bare),
        Some(RowIndex::top(2))
    );

    fx.service.repo_mut().shift_times(&[fx.moved], 400).unwrap();
    let events = fx.service.handle(StoreEvent::DivesTimeShifted {
        delta: 400,
        dives: vec![fx.moved],
    });

    assert_eq!(
        selection_events(&events),
        vec![&ModelEvent::CurrentChanged {
            row: Some(RowIndex::top(1)),
        }]
    );
}

#[test]
fn redating_a_selected_dive_re_emits_its_new_row() {
    let mut fx = fixture(ProjectionKind::List);
    fx.service.handle(StoreEvent::DivesSelected {
        dives: vec![fx.bare],
        current: Some(fx.bare),
    });

    fx.service.repo_mut().dive_mut(fx.bare).unwrap().when = 550;
    let events = fx.service.handle(StoreEvent::DivesChanged {
        dives: vec![fx.bare],
    });

    assert_eq!(
        selection_events(&events),
        vec![
            &ModelEvent::SelectionChanged {
                ranges: vec![RowRange {
                    parent: None,
                    first: 1,
                    last: 2,
                }],
            },
            &ModelEvent::CurrentChanged {
                row: Some(RowIndex::top(1)),
            },
        ]
    );
}

#[test]
fn deleting_current_dive_clears_current_row() {
    let mut fx = fixture(ProjectionKind::List);
    fx.service.handle(StoreEvent::DivesSelected {
        dives: vec![fx.bare],
        current: Some(fx.bare),
    });

    fx.service.repo_mut().remove_dive(fx.bare).unwrap();
    let events = fx.service.handle(StoreEvent::DivesDeleted {
        trip: None,
        delete_trip: false,
        dives: vec![fx.bare],
    });

    assert!(events.contains(&ModelEvent::CurrentChanged { row: None }));
    assert!(fx.service.selection().selected().is_empty());
}

#[test]
fn switching_layout_re_emits_selection_in_new_rows() {
    let mut fx = fixture(ProjectionKind::List);
    fx.service.handle(StoreEvent::DivesSelected {
        dives: vec![fx.bare],
        current: Some(fx.bare),
    });

    let events = fx.service.set_layout(ProjectionKind::Tree);
    assert_eq!(events[0], ModelEvent::Reset);
    assert_eq!(
        selection_events(&events),
        vec![
            &ModelEvent::SelectionChanged {
                ranges: vec![RowRange {
                    parent: None,
                    first: 1,
                    last: 2,
                }],
            },
            &ModelEvent::CurrentChanged {
                row: Some(RowIndex::top(1)),
            },
        ]
    );

    assert!(fx.service.set_layout(ProjectionKind::Tree).is_empty());
}

#[test]
fn site_rename_refreshes_dives_at_that_site() {
    let mut fx = fixture(ProjectionKind::List);
    let site = fx.service.repo_mut().upsert_site(DiveSite::new("Blue Hole"));
    fx.service.repo_mut().dive_mut(fx.bare).unwrap().site = Some(site);

    let events = fx.service.handle(StoreEvent::DiveSiteChanged {
        site,
        field: SiteField::Name,
    });
    assert_eq!(
        events,
        vec![ModelEvent::DataChanged {
            parent: None,
            first: 2,
            last: 3,
            columns: ChangedData::All,
        }]
    );

    let ignored = fx.service.handle(StoreEvent::DiveSiteChanged {
        site,
        field: SiteField::Notes,
    });
    assert!(ignored.is_empty());
}

#[test]
fn text_filter_hides_non_matching_dives() {
    let mut fx = fixture(ProjectionKind::List);
    fx.service.repo_mut().dive_mut(fx.bare).unwrap().buddy = "Marta".to_string();

    let filter = TextFilter::new(&TextQuery::new("marta")).unwrap();
    let events = fx.service.set_oracle(Box::new(filter));

    assert_eq!(fx.service.projection().shown_count(), 1);
    assert!(fx.service.projection().is_shown(RowIndex::top(2)));
    assert_eq!(events.last(), Some(&ModelEvent::CountVisibleChanged));
}
