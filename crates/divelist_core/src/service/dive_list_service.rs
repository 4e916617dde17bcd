//! Dive list use-case service.
//!
//! # Responsibility
//! - Own the record store, the active projection, the visibility oracle and
//!   the selection.
//! - Route store events to the projection and keep the selection in sync.
//!
//! # Invariants
//! - One event is processed to completion before the next.
//! - Compound events (move, time shift) re-emit the selection once, after
//!   both halves ran, when they touch selected dives.
//! - Edits are validated here but applied by the command layer.

use crate::config::DisplayPrefs;
use crate::filter::oracle::{ShowAll, VisibilityOracle};
use crate::notify::{ModelEvent, RowIndex};
use crate::presentation::cell_text;
use crate::presentation::columns::Column;
use crate::presentation::edit::{validate_number_edit, EditError, RenumberRequest};
use crate::projection::{new_projection, DiveProjection, ProjectionContext, ProjectionKind};
use crate::repo::dive_repo::DiveRepository;
use crate::selection::Selection;
use crate::service::events::StoreEvent;
use log::{debug, info};

/// Dive list service facade.
pub struct DiveListService<R: DiveRepository> {
    repo: R,
    oracle: Box<dyn VisibilityOracle>,
    projection: Box<dyn DiveProjection>,
    selection: Selection,
    prefs: DisplayPrefs,
}

impl<R: DiveRepository> DiveListService<R> {
    /// Creates an unpopulated service showing every dive.
    pub fn new(repo: R, kind: ProjectionKind) -> Self {
        Self::with_oracle(repo, kind, Box::new(ShowAll))
    }

    pub fn with_oracle(repo: R, kind: ProjectionKind, oracle: Box<dyn VisibilityOracle>) -> Self {
        Self {
            repo,
            oracle,
            projection: new_projection(kind),
            selection: Selection::new(),
            prefs: DisplayPrefs::default(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Store access for the command layer. Report changes via [`Self::handle`].
    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn projection(&self) -> &dyn DiveProjection {
        self.projection.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn prefs(&self) -> &DisplayPrefs {
        &self.prefs
    }

    pub fn set_prefs(&mut self, prefs: DisplayPrefs) {
        self.prefs = prefs;
    }

    /// Builds the active projection from the store.
    pub fn populate(&mut self) -> Vec<ModelEvent> {
        let mut events = Vec::new();
        let ctx = ProjectionContext::new(&self.repo, self.oracle.as_ref());
        self.projection.populate(&ctx, &mut events);
        info!(
            "event=dive_list_populated module=service status=ok kind={:?} rows={} shown={}",
            self.projection.kind(),
            self.projection.row_count(None),
            self.projection.shown_count()
        );
        if !self.selection.selected().is_empty() || self.selection.current().is_some() {
            self.selection.emit(self.projection.as_ref(), &mut events);
        }
        events
    }

    /// Replaces the store and rebuilds from it. The selection is dropped.
    pub fn load(&mut self, repo: R) -> Vec<ModelEvent> {
        self.repo = repo;
        self.selection = Selection::new();
        self.populate()
    }

    /// Drops all rows; the projection ignores events until repopulated.
    pub fn clear(&mut self) -> Vec<ModelEvent> {
        let mut events = Vec::new();
        self.projection.clear(&mut events);
        info!("event=dive_list_cleared module=service status=ok");
        events
    }

    /// Clears and repopulates.
    pub fn reset(&mut self) -> Vec<ModelEvent> {
        let mut events = self.clear();
        events.extend(self.populate());
        events
    }

    /// Switches between list and tree layout and re-emits the selection.
    pub fn set_layout(&mut self, kind: ProjectionKind) -> Vec<ModelEvent> {
        let mut events = Vec::new();
        if self.projection.kind() == kind {
            return events;
        }
        info!("event=layout_switch module=service status=ok kind={kind:?}");
        self.projection = new_projection(kind);
        let ctx = ProjectionContext::new(&self.repo, self.oracle.as_ref());
        self.projection.populate(&ctx, &mut events);
        self.selection.emit(self.projection.as_ref(), &mut events);
        events
    }

    /// Replaces the oracle and re-filters.
    pub fn set_oracle(&mut self, oracle: Box<dyn VisibilityOracle>) -> Vec<ModelEvent> {
        self.oracle = oracle;
        self.handle(StoreEvent::FilterInvalidated)
    }

    /// Applies one store event and returns the notifications it produced.
    pub fn handle(&mut self, event: StoreEvent) -> Vec<ModelEvent> {
        let mut events = Vec::new();
        let name = event.name();
        let Self {
            repo,
            oracle,
            projection,
            selection,
            ..
        } = self;
        let ctx = ProjectionContext::new(&*repo, oracle.as_ref());

        match event {
            StoreEvent::DivesAdded {
                trip,
                create_trip,
                dives,
            } => {
                projection.dives_added(&ctx, trip, create_trip, &dives, &mut events);
                selection.track_current(projection.as_ref(), &mut events);
            }
            StoreEvent::DivesDeleted {
                trip,
                delete_trip,
                dives,
            } => {
                projection.dives_deleted(&ctx, trip, delete_trip, &dives, &mut events);
                selection.forget(&dives);
                selection.track_current(projection.as_ref(), &mut events);
            }
            StoreEvent::DivesChanged { dives } => {
                let marker = selection.enter_command();
                projection.dives_changed(&ctx, &dives, &mut events);
                // A new number or start time re-sorts the dive into another row.
                let resorted = events
                    .iter()
                    .any(|event| matches!(event, ModelEvent::RowsRemoved { .. }));
                if resorted && selection.touches(&dives) {
                    selection.request_reload(projection.as_ref(), &mut events);
                }
                drop(marker);
                selection.flush(projection.as_ref(), &mut events);
                selection.track_current(projection.as_ref(), &mut events);
            }
            StoreEvent::DivesMovedBetweenTrips {
                from,
                to,
                delete_from,
                create_to,
                dives,
            } => {
                let marker = selection.enter_command();
                projection.dives_moved(&ctx, from, to, delete_from, create_to, &dives, &mut events);
                if selection.touches(&dives) {
                    selection.request_reload(projection.as_ref(), &mut events);
                }
                drop(marker);
                selection.flush(projection.as_ref(), &mut events);
                selection.track_current(projection.as_ref(), &mut events);
            }
            StoreEvent::DivesTimeShifted { delta, dives } => {
                let marker = selection.enter_command();
                projection.dives_time_shifted(&ctx, delta, &dives, &mut events);
                if selection.touches(&dives) {
                    selection.request_reload(projection.as_ref(), &mut events);
                }
                drop(marker);
                selection.flush(projection.as_ref(), &mut events);
                selection.track_current(projection.as_ref(), &mut events);
            }
            StoreEvent::TripChanged { trip } => {
                projection.trip_changed(trip, &mut events);
            }
            StoreEvent::DiveSiteChanged { site, field } => {
                if field.is_shown_in_list() {
                    let dives = ctx.store.dives_at_site(site);
                    if !dives.is_empty() {
                        projection.dives_changed(&ctx, &dives, &mut events);
                        selection.track_current(projection.as_ref(), &mut events);
                    }
                } else {
                    debug!("event=site_change_ignored module=service status=skipped field={field:?}");
                }
            }
            StoreEvent::FilterInvalidated => {
                let marker = selection.enter_command();
                projection.filter_recompute(&ctx, &mut events);
                drop(marker);
                selection.flush(projection.as_ref(), &mut events);
                selection.track_current(projection.as_ref(), &mut events);
            }
            StoreEvent::DivesSelected { dives, current } => {
                selection.select(&dives, current);
                selection.request_reload(projection.as_ref(), &mut events);
            }
        }

        debug!(
            "event=store_event module=service status=ok kind={name} emitted={}",
            events.len()
        );
        events
    }

    /// Validates a number edit; the caller applies the returned request.
    ///
    /// # Errors
    /// See [`validate_number_edit`].
    pub fn set_number(
        &self,
        index: RowIndex,
        column: Column,
        number: i32,
    ) -> Result<RenumberRequest, EditError> {
        validate_number_edit(self.projection.as_ref(), &self.repo, index, column, number).map_err(
            |err| {
                debug!("event=edit_rejected module=service status=error reason={err}");
                err
            },
        )
    }

    /// Cell text of the active projection, formatted with the current prefs.
    pub fn cell_text(&self, index: RowIndex, column: Column) -> Option<String> {
        cell_text(
            self.projection.as_ref(),
            &self.repo,
            index,
            column,
            &self.prefs,
        )
    }

    /// Display-side row order under `column`, when the layout sorts.
    pub fn column_order(&self, column: Column) -> Option<Vec<usize>> {
        self.projection.column_order(&self.repo, column)
    }
}
