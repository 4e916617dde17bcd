//! Flat list projection.
//!
//! # Responsibility
//! - Keep every dive in one chronologically sorted sequence.
//! - Provide per-column row orderings for display-side sorting.
//!
//! # Invariants
//! - `items` is sorted by `DiveKey` at quiescent points.
//! - Trip membership is ignored: moves between trips do not touch rows.

use crate::filter::visibility::VisibilityCache;
use crate::model::dive::{DiveId, DiveKey};
use crate::model::trip::TripId;
use crate::notify::{ChangedData, ModelEvent, ModelObserver, RowIndex};
use crate::presentation::columns::{column_less_than, Column};
use crate::projection::batch::{changed_runs, insert_batches, zip_process_runs};
use crate::projection::{
    order_by_position, sorted_keys, stale_ids, DiveProjection, ProjectionContext, ProjectionKind,
    ProjectionState,
};
use crate::repo::dive_repo::DiveRepository;
use log::debug;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Chronological list of all dives.
#[derive(Debug, Clone)]
pub struct FlatProjection {
    state: ProjectionState,
    items: Vec<DiveKey>,
    visibility: VisibilityCache,
}

impl Default for FlatProjection {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatProjection {
    pub fn new() -> Self {
        Self {
            state: ProjectionState::Uninitialized,
            items: Vec::new(),
            visibility: VisibilityCache::new(),
        }
    }

    /// Row permutation under `column`'s comparator.
    ///
    /// Date and number keep chronological order; other columns sort by value
    /// and put later rows first on ties.
    pub fn sorted_rows(&self, store: &dyn DiveRepository, column: Column) -> Vec<usize> {
        let dives: Vec<_> = self.items.iter().map(|key| store.dive(key.id)).collect();
        let mut rows: Vec<usize> = (0..self.items.len()).collect();
        rows.sort_by(|&a, &b| match (dives[a], dives[b]) {
            (Some(left), Some(right)) => {
                if column_less_than(column, store, (a, left), (b, right)) {
                    Ordering::Less
                } else if column_less_than(column, store, (b, right), (a, left)) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            }
            _ => a.cmp(&b),
        });
        rows
    }

    fn populated(&self, operation: &str) -> bool {
        if self.state == ProjectionState::Uninitialized {
            debug!("event=projection_event_ignored module=flat status=uninitialized op={operation}");
            return false;
        }
        true
    }

    fn insert_keys(
        &mut self,
        ctx: &ProjectionContext<'_>,
        keys: &[DiveKey],
        sink: &mut dyn ModelObserver,
    ) {
        let mut any_shown = false;
        for key in keys {
            let (shown, _) = self.visibility.evaluate(key.id, ctx.store, ctx.oracle);
            any_shown |= shown;
        }
        self.insert_sorted(keys, sink);
        if any_shown {
            sink.notify(ModelEvent::CountVisibleChanged);
        }
    }

    fn insert_sorted(&mut self, keys: &[DiveKey], sink: &mut dyn ModelObserver) {
        insert_batches(
            &mut self.items,
            keys,
            |new, existing| new < existing,
            |items, index, batch| {
                items.splice(index..index, batch.iter().copied());
                sink.notify(ModelEvent::RowsInserted {
                    parent: None,
                    first: index,
                    last: index + batch.len(),
                });
            },
        );
    }

    fn remove_ids(&mut self, ordered: &[DiveId], sink: &mut dyn ModelObserver) {
        zip_process_runs(
            &mut self.items,
            ordered,
            |key, id| key.id == *id,
            |items, run, _| {
                sink.notify(ModelEvent::RowsRemoved {
                    parent: None,
                    first: run.start,
                    last: run.end,
                });
                let removed = run.len() as isize;
                items.drain(run);
                -removed
            },
        );
    }

    fn ordered(&self, dives: &[DiveId]) -> Vec<DiveId> {
        order_by_position(self.items.iter().map(|key| key.id), dives)
    }
}

impl DiveProjection for FlatProjection {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::List
    }

    fn state(&self) -> ProjectionState {
        self.state
    }

    fn populate(&mut self, ctx: &ProjectionContext<'_>, sink: &mut dyn ModelObserver) {
        self.items.clear();
        self.visibility.clear();
        for dive in ctx.store.dives() {
            self.visibility.evaluate(dive.id, ctx.store, ctx.oracle);
            self.items.push(dive.key());
        }
        self.state = ProjectionState::Populated;
        debug!(
            "event=projection_populated module=flat status=ok rows={}",
            self.items.len()
        );
        sink.notify(ModelEvent::Reset);
        sink.notify(ModelEvent::CountVisibleChanged);
    }

    fn clear(&mut self, sink: &mut dyn ModelObserver) {
        self.items.clear();
        self.visibility.clear();
        self.state = ProjectionState::Uninitialized;
        sink.notify(ModelEvent::Reset);
    }

    fn dives_added(
        &mut self,
        ctx: &ProjectionContext<'_>,
        _trip: Option<TripId>,
        _create_trip: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) {
        if !self.populated("dives_added") {
            return;
        }
        let keys = sorted_keys(ctx, dives);
        self.insert_keys(ctx, &keys, sink);
    }

    fn dives_deleted(
        &mut self,
        _ctx: &ProjectionContext<'_>,
        _trip: Option<TripId>,
        _delete_trip: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) {
        if !self.populated("dives_deleted") {
            return;
        }
        let ordered = self.ordered(dives);
        let any_shown = ordered.iter().any(|id| self.visibility.is_shown(*id));
        self.remove_ids(&ordered, sink);
        for id in &ordered {
            self.visibility.forget(*id);
        }
        if any_shown {
            sink.notify(ModelEvent::CountVisibleChanged);
        }
    }

    fn dives_changed(
        &mut self,
        ctx: &ProjectionContext<'_>,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) {
        if !self.populated("dives_changed") {
            return;
        }
        let stale = stale_ids(ctx, self.items.iter().copied(), dives);
        let (rekeyed, ordered): (Vec<DiveId>, Vec<DiveId>) = self
            .ordered(dives)
            .into_iter()
            .partition(|id| stale.contains(id));
        let mut visibility_changed = false;
        for id in ordered.iter().chain(&rekeyed) {
            let (_, changed) = self.visibility.evaluate(*id, ctx.store, ctx.oracle);
            visibility_changed |= changed;
        }

        zip_process_runs(
            &mut self.items,
            &ordered,
            |key, id| key.id == *id,
            |_, run, _| {
                sink.notify(ModelEvent::DataChanged {
                    parent: None,
                    first: run.start,
                    last: run.end,
                    columns: ChangedData::All,
                });
                0
            },
        );

        if !rekeyed.is_empty() {
            debug!(
                "event=dives_rekeyed module=flat status=ok count={}",
                rekeyed.len()
            );
            self.remove_ids(&rekeyed, sink);
            let keys = sorted_keys(ctx, &rekeyed);
            self.insert_sorted(&keys, sink);
        }

        if visibility_changed {
            sink.notify(ModelEvent::CountVisibleChanged);
        }
    }

    fn dives_moved(
        &mut self,
        _ctx: &ProjectionContext<'_>,
        _from: Option<TripId>,
        _to: Option<TripId>,
        _delete_from: bool,
        _create_to: bool,
        dives: &[DiveId],
        _sink: &mut dyn ModelObserver,
    ) {
        debug!(
            "event=dives_moved module=flat status=noop count={}",
            dives.len()
        );
    }

    fn dives_time_shifted(
        &mut self,
        ctx: &ProjectionContext<'_>,
        delta: i64,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) {
        if !self.populated("dives_time_shifted") {
            return;
        }
        // Remove-then-add relies on a uniform delta keeping the shifted dives
        // in the same relative order.
        let ordered = self.ordered(dives);
        debug!(
            "event=dives_time_shifted module=flat status=ok count={} delta={delta}",
            ordered.len()
        );
        self.remove_ids(&ordered, sink);
        let keys = sorted_keys(ctx, &ordered);
        self.insert_keys(ctx, &keys, sink);
    }

    fn trip_changed(&mut self, _trip: TripId, _sink: &mut dyn ModelObserver) {}

    fn filter_recompute(&mut self, ctx: &ProjectionContext<'_>, sink: &mut dyn ModelObserver) {
        if !self.populated("filter_recompute") {
            return;
        }
        let mut changed = Vec::with_capacity(self.items.len());
        for key in &self.items {
            let (_, flipped) = self.visibility.evaluate(key.id, ctx.store, ctx.oracle);
            changed.push(flipped);
        }

        for run in changed_runs(&changed) {
            sink.notify(ModelEvent::DataChanged {
                parent: None,
                first: run.start,
                last: run.end,
                columns: ChangedData::Visibility,
            });
        }
        sink.notify(ModelEvent::CountVisibleChanged);
    }

    fn row_count(&self, parent: Option<usize>) -> usize {
        match parent {
            None => self.items.len(),
            Some(_) => 0,
        }
    }

    fn dive_at(&self, index: RowIndex) -> Option<DiveId> {
        match index.parent {
            None => self.items.get(index.row).map(|key| key.id),
            Some(_) => None,
        }
    }

    fn trip_at(&self, _row: usize) -> Option<TripId> {
        None
    }

    fn row_of(&self, id: DiveId) -> Option<RowIndex> {
        self.items
            .iter()
            .position(|key| key.id == id)
            .map(RowIndex::top)
    }

    fn rows_of(&self, ids: &HashSet<DiveId>) -> Vec<RowIndex> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, key)| ids.contains(&key.id))
            .map(|(row, _)| RowIndex::top(row))
            .collect()
    }

    fn is_shown(&self, index: RowIndex) -> bool {
        self.dive_at(index)
            .map(|id| self.visibility.is_shown(id))
            .unwrap_or(false)
    }

    fn shown_count(&self) -> usize {
        self.visibility
            .count_shown(self.items.iter().map(|key| key.id))
    }

    fn dive_keys(&self) -> Vec<DiveKey> {
        self.items.clone()
    }

    fn column_order(&self, store: &dyn DiveRepository, column: Column) -> Option<Vec<usize>> {
        Some(self.sorted_rows(store, column))
    }
}
