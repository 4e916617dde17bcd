//! Trip tree projection.
//!
//! # Responsibility
//! - Group dives under their trips; dives without a trip stay at top level.
//! - Keep every trip row at the position of its earliest member.
//!
//! # Invariants
//! - Top-level items are sorted by `ItemKey`; trip members by `DiveKey`.
//! - A trip item's key and shown flag are recomputed after each membership
//!   change, never lazily.
//! - A trip whose members are all hidden hides them implicitly: member
//!   visibility notifications are only sent for shown trips.
//!
//! # See also
//! - `projection::batch` for the run algorithms used here.

use crate::filter::visibility::VisibilityCache;
use crate::model::dive::{DiveId, DiveKey};
use crate::model::trip::TripId;
use crate::notify::{ChangedData, ModelEvent, ModelObserver, RowIndex};
use crate::projection::batch::{changed_runs, group_by, insert_batches, zip_process_runs};
use crate::projection::{
    order_by_position, sorted_keys, stale_ids, DiveProjection, ProjectionContext, ProjectionKind,
    ProjectionState, TripSummary,
};
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Ordering key of one top-level item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Dive(DiveKey),
    /// A trip, keyed by the start of its earliest member.
    Trip { when: i64, id: TripId },
}

impl ItemKey {
    pub fn when(&self) -> i64 {
        match self {
            Self::Dive(key) => key.when,
            Self::Trip { when, .. } => *when,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Dive(_) => 0,
            Self::Trip { .. } => 1,
        }
    }
}

impl Ord for ItemKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.when()
            .cmp(&other.when())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| match (self, other) {
                (Self::Dive(a), Self::Dive(b)) => a.cmp(b),
                (Self::Trip { id: a, .. }, Self::Trip { id: b, .. }) => a.cmp(b),
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for ItemKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Strict "sorts before" between two top-level items.
///
/// A dive sorts before a trip whose earliest member starts at the same time.
pub(crate) fn item_less_than(a: &ItemKey, b: &ItemKey) -> bool {
    a < b
}

#[derive(Debug, Clone)]
struct Item {
    key: ItemKey,
    shown: bool,
    /// Members of a trip item; always empty for dive items.
    dives: Vec<DiveKey>,
}

impl Item {
    fn dive(key: DiveKey, shown: bool) -> Self {
        Self {
            key: ItemKey::Dive(key),
            shown,
            dives: Vec::new(),
        }
    }

    fn trip(id: TripId, dives: Vec<DiveKey>, shown: bool) -> Self {
        let when = dives.first().map(|key| key.when).unwrap_or_default();
        Self {
            key: ItemKey::Trip { when, id },
            shown,
            dives,
        }
    }

    fn dive_id(&self) -> Option<DiveId> {
        match self.key {
            ItemKey::Dive(key) => Some(key.id),
            ItemKey::Trip { .. } => None,
        }
    }

    fn trip_id(&self) -> Option<TripId> {
        match self.key {
            ItemKey::Trip { id, .. } => Some(id),
            ItemKey::Dive(_) => None,
        }
    }
}

/// Dives grouped into trips.
#[derive(Debug, Clone)]
pub struct GroupedProjection {
    state: ProjectionState,
    items: Vec<Item>,
    visibility: VisibilityCache,
}

impl Default for GroupedProjection {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupedProjection {
    pub fn new() -> Self {
        Self {
            state: ProjectionState::Uninitialized,
            items: Vec::new(),
            visibility: VisibilityCache::new(),
        }
    }

    /// Top-level keys in row order.
    pub fn item_keys(&self) -> Vec<ItemKey> {
        self.items.iter().map(|item| item.key).collect()
    }

    /// Member keys of the trip at `row`, `None` for dive rows.
    pub fn members(&self, row: usize) -> Option<&[DiveKey]> {
        self.items
            .get(row)
            .filter(|item| item.trip_id().is_some())
            .map(|item| item.dives.as_slice())
    }

    /// Row of a trip item.
    pub fn trip_row(&self, trip: TripId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.trip_id() == Some(trip))
    }

    fn populated(&self, operation: &str) -> bool {
        if self.state == ProjectionState::Uninitialized {
            debug!("event=projection_event_ignored module=grouped status=uninitialized op={operation}");
            return false;
        }
        true
    }

    /// Evaluates the oracle for `keys`; reports whether any is shown.
    fn evaluate_keys(&mut self, ctx: &ProjectionContext<'_>, keys: &[DiveKey]) -> bool {
        let mut any_shown = false;
        for key in keys {
            let (shown, _) = self.visibility.evaluate(key.id, ctx.store, ctx.oracle);
            any_shown |= shown;
        }
        any_shown
    }

    /// Evaluates the oracle for `dives`; reports whether any flipped.
    fn evaluate_flips(&mut self, ctx: &ProjectionContext<'_>, dives: &[DiveId]) -> bool {
        let mut flipped = false;
        for id in dives {
            let (_, changed) = self.visibility.evaluate(*id, ctx.store, ctx.oracle);
            flipped |= changed;
        }
        flipped
    }

    /// Inserts pre-sorted keys. Returns false when the event was skipped.
    fn add(
        &mut self,
        trip: Option<TripId>,
        create_trip: bool,
        keys: &[DiveKey],
        sink: &mut dyn ModelObserver,
    ) -> bool {
        if keys.is_empty() {
            return true;
        }
        let Some(trip) = trip else {
            self.add_top_level(keys, sink);
            return true;
        };
        match self.trip_row(trip) {
            Some(row) => {
                if create_trip {
                    warn!("event=trip_already_present module=grouped status=fallback trip={trip}");
                }
                self.add_to_trip(row, keys, sink);
                true
            }
            None if create_trip => {
                self.add_trip(trip, keys, sink);
                true
            }
            None => {
                warn!("event=trip_unknown module=grouped status=skipped op=add trip={trip}");
                false
            }
        }
    }

    fn add_top_level(&mut self, keys: &[DiveKey], sink: &mut dyn ModelObserver) {
        let incoming: Vec<Item> = keys
            .iter()
            .map(|key| Item::dive(*key, self.visibility.is_shown(key.id)))
            .collect();
        insert_batches(
            &mut self.items,
            &incoming,
            |new, existing| item_less_than(&new.key, &existing.key),
            |items, index, batch| {
                items.splice(index..index, batch.iter().cloned());
                sink.notify(ModelEvent::RowsInserted {
                    parent: None,
                    first: index,
                    last: index + batch.len(),
                });
            },
        );
    }

    fn add_trip(&mut self, trip: TripId, keys: &[DiveKey], sink: &mut dyn ModelObserver) {
        let shown = keys.iter().any(|key| self.visibility.is_shown(key.id));
        let item = Item::trip(trip, keys.to_vec(), shown);
        let row = self
            .items
            .partition_point(|existing| item_less_than(&existing.key, &item.key));
        self.items.insert(row, item);
        sink.notify(ModelEvent::RowsInserted {
            parent: None,
            first: row,
            last: row + 1,
        });
    }

    fn add_to_trip(&mut self, row: usize, keys: &[DiveKey], sink: &mut dyn ModelObserver) {
        insert_batches(
            &mut self.items[row].dives,
            keys,
            |new, existing| new < existing,
            |dives, index, batch| {
                dives.splice(index..index, batch.iter().copied());
                sink.notify(ModelEvent::RowsInserted {
                    parent: Some(row),
                    first: index,
                    last: index + batch.len(),
                });
            },
        );
        self.refresh_trip(row);
        self.reposition(row, sink);
    }

    /// Removes dives by identity. Returns the IDs that left the projection.
    ///
    /// The visibility cache is left alone: a move re-adds the same dives.
    fn remove(
        &mut self,
        trip: Option<TripId>,
        delete_trip: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) -> Vec<DiveId> {
        let Some(trip) = trip else {
            return self.remove_top_level(dives, sink);
        };
        match self.trip_row(trip) {
            Some(row) if delete_trip => {
                sink.notify(ModelEvent::RowsRemoved {
                    parent: None,
                    first: row,
                    last: row + 1,
                });
                let item = self.items.remove(row);
                item.dives.iter().map(|key| key.id).collect()
            }
            Some(row) => self.remove_from_trip(row, dives, sink),
            None => {
                warn!("event=trip_unknown module=grouped status=skipped op=remove trip={trip}");
                Vec::new()
            }
        }
    }

    fn remove_top_level(&mut self, dives: &[DiveId], sink: &mut dyn ModelObserver) -> Vec<DiveId> {
        let ordered = order_by_position(self.items.iter().filter_map(Item::dive_id), dives);
        zip_process_runs(
            &mut self.items,
            &ordered,
            |item, id| item.dive_id() == Some(*id),
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
        ordered
    }

    fn remove_from_trip(
        &mut self,
        row: usize,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) -> Vec<DiveId> {
        let ordered = order_by_position(self.items[row].dives.iter().map(|key| key.id), dives);
        zip_process_runs(
            &mut self.items[row].dives,
            &ordered,
            |key, id| key.id == *id,
            |members, run, _| {
                sink.notify(ModelEvent::RowsRemoved {
                    parent: Some(row),
                    first: run.start,
                    last: run.end,
                });
                let removed = run.len() as isize;
                members.drain(run);
                -removed
            },
        );
        self.refresh_trip(row);
        self.reposition(row, sink);
        ordered
    }

    fn change_top_level(
        &mut self,
        ctx: &ProjectionContext<'_>,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) -> bool {
        let ordered = order_by_position(self.items.iter().filter_map(Item::dive_id), dives);
        let flipped = self.evaluate_flips(ctx, &ordered);

        let visibility = &self.visibility;
        zip_process_runs(
            &mut self.items,
            &ordered,
            |item, id| item.dive_id() == Some(*id),
            |items, run, _| {
                for item in &mut items[run.clone()] {
                    if let Some(id) = item.dive_id() {
                        item.shown = visibility.is_shown(id);
                    }
                }
                sink.notify(ModelEvent::DataChanged {
                    parent: None,
                    first: run.start,
                    last: run.end,
                    columns: ChangedData::All,
                });
                0
            },
        );
        flipped
    }

    fn change_in_trip(
        &mut self,
        ctx: &ProjectionContext<'_>,
        row: usize,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) -> bool {
        let ordered = order_by_position(self.items[row].dives.iter().map(|key| key.id), dives);
        let flipped = self.evaluate_flips(ctx, &ordered);

        zip_process_runs(
            &mut self.items[row].dives,
            &ordered,
            |key, id| key.id == *id,
            |_, run, _| {
                sink.notify(ModelEvent::DataChanged {
                    parent: Some(row),
                    first: run.start,
                    last: run.end,
                    columns: ChangedData::All,
                });
                0
            },
        );

        if flipped {
            self.refresh_trip(row);
            self.reposition(row, sink);
        }
        flipped
    }

    /// Recomputes a trip's key and aggregate shown flag from its members.
    fn refresh_trip(&mut self, row: usize) {
        let visibility = &self.visibility;
        let Some(item) = self.items.get_mut(row) else {
            return;
        };
        if let ItemKey::Trip { when, .. } = &mut item.key {
            if let Some(first) = item.dives.first() {
                *when = first.when;
            }
        }
        item.shown = item.dives.iter().any(|key| visibility.is_shown(key.id));
    }

    /// Moves the item at `row` to its sorted slot and refreshes its row.
    ///
    /// Returns the row the item ends up on.
    fn reposition(&mut self, row: usize, sink: &mut dyn ModelObserver) -> usize {
        if row >= self.items.len() {
            return row;
        }
        let key = self.items[row].key;

        let mut target = row;
        while target > 0 && item_less_than(&key, &self.items[target - 1].key) {
            target -= 1;
        }
        if target == row {
            target += 1;
            while target < self.items.len() && !item_less_than(&key, &self.items[target].key) {
                target += 1;
            }
        }

        // `target` is a slot in pre-move coordinates; `row + 1` is the slot
        // right after the item, i.e. no move.
        if target != row && target != row + 1 {
            sink.notify(ModelEvent::RowsMoved {
                parent: None,
                first: row,
                last: row + 1,
                to_parent: None,
                to_row: target,
            });
            let item = self.items.remove(row);
            let dest = if target > row { target - 1 } else { target };
            self.items.insert(dest, item);
        }

        let final_row = if target > row { target - 1 } else { target };
        sink.notify(ModelEvent::DataChanged {
            parent: None,
            first: final_row,
            last: final_row + 1,
            columns: ChangedData::All,
        });
        final_row
    }

    /// Splits `dives` by the trip the store currently puts them in.
    ///
    /// Dives missing from the store are dropped with a warning.
    fn by_trip(
        ctx: &ProjectionContext<'_>,
        dives: &[DiveId],
    ) -> Vec<(Option<TripId>, Vec<DiveId>)> {
        group_by(dives, |id| ctx.dive(*id).map(|dive| dive.trip))
            .into_iter()
            .filter_map(|(trip, ids)| match trip {
                Some(trip) => Some((trip, ids)),
                None => {
                    warn!(
                        "event=dive_unresolved module=grouped status=skipped count={}",
                        ids.len()
                    );
                    None
                }
            })
            .collect()
    }
}

impl DiveProjection for GroupedProjection {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Tree
    }

    fn state(&self) -> ProjectionState {
        self.state
    }

    fn populate(&mut self, ctx: &ProjectionContext<'_>, sink: &mut dyn ModelObserver) {
        self.items.clear();
        self.visibility.clear();
        for dive in ctx.store.dives() {
            let (shown, _) = self.visibility.evaluate(dive.id, ctx.store, ctx.oracle);
            let Some(trip) = dive.trip else {
                self.items.push(Item::dive(dive.key(), shown));
                continue;
            };
            match self.items.iter_mut().find(|item| item.trip_id() == Some(trip)) {
                Some(item) => {
                    item.dives.push(dive.key());
                    item.shown |= shown;
                }
                None => self.items.push(Item::trip(trip, vec![dive.key()], shown)),
            }
        }
        // Dives sharing a start time with a trip's first member belong in
        // front of the trip.
        self.items.sort_by(|a, b| a.key.cmp(&b.key));
        self.state = ProjectionState::Populated;
        debug!(
            "event=projection_populated module=grouped status=ok items={} shown={}",
            self.items.len(),
            self.visibility.count_shown(self.dive_keys().iter().map(|key| key.id))
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
        trip: Option<TripId>,
        create_trip: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) {
        if !self.populated("dives_added") {
            return;
        }
        let keys = sorted_keys(ctx, dives);
        let any_shown = self.evaluate_keys(ctx, &keys);
        if !self.add(trip, create_trip, &keys, sink) {
            for key in &keys {
                self.visibility.forget(key.id);
            }
            return;
        }
        debug!(
            "event=dives_added module=grouped status=ok count={}",
            keys.len()
        );
        if any_shown {
            sink.notify(ModelEvent::CountVisibleChanged);
        }
    }

    fn dives_deleted(
        &mut self,
        _ctx: &ProjectionContext<'_>,
        trip: Option<TripId>,
        delete_trip: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) {
        if !self.populated("dives_deleted") {
            return;
        }
        let removed = self.remove(trip, delete_trip, dives, sink);
        let any_shown = removed.iter().any(|id| self.visibility.is_shown(*id));
        for id in &removed {
            self.visibility.forget(*id);
        }
        debug!(
            "event=dives_deleted module=grouped status=ok count={}",
            removed.len()
        );
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
        let stale = stale_ids(ctx, self.dive_keys(), dives);
        let mut flipped = false;
        for (trip, ids) in Self::by_trip(ctx, dives) {
            if let Some(trip) = trip {
                if self.trip_row(trip).is_none() {
                    warn!("event=trip_unknown module=grouped status=skipped op=changed trip={trip}");
                    continue;
                }
            }
            let (rekeyed, ids): (Vec<DiveId>, Vec<DiveId>) =
                ids.into_iter().partition(|id| stale.contains(id));
            if !rekeyed.is_empty() {
                debug!(
                    "event=dives_rekeyed module=grouped status=ok count={}",
                    rekeyed.len()
                );
                flipped |= self.evaluate_flips(ctx, &rekeyed);
                let removed = self.remove(trip, false, &rekeyed, sink);
                let keys = sorted_keys(ctx, &removed);
                self.add(trip, false, &keys, sink);
            }
            if ids.is_empty() {
                continue;
            }
            flipped |= match trip.and_then(|trip| self.trip_row(trip)) {
                Some(row) => self.change_in_trip(ctx, row, &ids, sink),
                None if trip.is_none() => self.change_top_level(ctx, &ids, sink),
                None => false,
            };
        }
        if flipped {
            sink.notify(ModelEvent::CountVisibleChanged);
        }
    }

    fn dives_moved(
        &mut self,
        ctx: &ProjectionContext<'_>,
        from: Option<TripId>,
        to: Option<TripId>,
        delete_from: bool,
        create_to: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    ) {
        if !self.populated("dives_moved") {
            return;
        }
        if from == to {
            debug!("event=dives_moved module=grouped status=noop reason=same_trip");
            return;
        }
        let to_known = to.map_or(true, |trip| create_to || self.trip_row(trip).is_some());
        let from_known = from.map_or(true, |trip| self.trip_row(trip).is_some());
        if !to_known || !from_known {
            warn!(
                "event=trip_unknown module=grouped status=skipped op=move from={from:?} to={to:?}"
            );
            return;
        }
        // Add first: between the two steps a dive is present at both ends.
        let keys = sorted_keys(ctx, dives);
        self.evaluate_keys(ctx, &keys);
        self.add(to, create_to, &keys, sink);
        let removed = self.remove(from, delete_from, dives, sink);
        debug!(
            "event=dives_moved module=grouped status=ok added={} removed={}",
            keys.len(),
            removed.len()
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
        for (trip, ids) in Self::by_trip(ctx, dives) {
            self.remove(trip, false, &ids, sink);
            let keys = sorted_keys(ctx, &ids);
            self.evaluate_keys(ctx, &keys);
            self.add(trip, false, &keys, sink);
        }
        debug!(
            "event=dives_time_shifted module=grouped status=ok count={} delta={delta}",
            dives.len()
        );
    }

    fn trip_changed(&mut self, trip: TripId, sink: &mut dyn ModelObserver) {
        if !self.populated("trip_changed") {
            return;
        }
        match self.trip_row(trip) {
            Some(row) => sink.notify(ModelEvent::DataChanged {
                parent: None,
                first: row,
                last: row + 1,
                columns: ChangedData::All,
            }),
            None => warn!("event=trip_unknown module=grouped status=skipped op=trip_changed trip={trip}"),
        }
    }

    fn filter_recompute(&mut self, ctx: &ProjectionContext<'_>, sink: &mut dyn ModelObserver) {
        if !self.populated("filter_recompute") {
            return;
        }
        let mut top_changed = Vec::with_capacity(self.items.len());
        for (row, item) in self.items.iter_mut().enumerate() {
            match item.key {
                ItemKey::Dive(key) => {
                    let (shown, flipped) = self.visibility.evaluate(key.id, ctx.store, ctx.oracle);
                    item.shown = shown;
                    top_changed.push(flipped);
                }
                ItemKey::Trip { .. } => {
                    let mut member_changed = Vec::with_capacity(item.dives.len());
                    let mut any_shown = false;
                    for key in &item.dives {
                        let (shown, flipped) =
                            self.visibility.evaluate(key.id, ctx.store, ctx.oracle);
                        member_changed.push(flipped);
                        any_shown |= shown;
                    }
                    if any_shown {
                        for run in changed_runs(&member_changed) {
                            sink.notify(ModelEvent::DataChanged {
                                parent: Some(row),
                                first: run.start,
                                last: run.end,
                                columns: ChangedData::Visibility,
                            });
                        }
                    }
                    item.shown = any_shown;
                    // The trip row is refreshed in full below.
                    top_changed.push(false);
                }
            }
        }

        for run in changed_runs(&top_changed) {
            sink.notify(ModelEvent::DataChanged {
                parent: None,
                first: run.start,
                last: run.end,
                columns: ChangedData::Visibility,
            });
        }
        for (row, item) in self.items.iter().enumerate() {
            if item.trip_id().is_some() {
                sink.notify(ModelEvent::DataChanged {
                    parent: None,
                    first: row,
                    last: row + 1,
                    columns: ChangedData::All,
                });
            }
        }
        sink.notify(ModelEvent::CountVisibleChanged);
    }

    fn row_count(&self, parent: Option<usize>) -> usize {
        match parent {
            None => self.items.len(),
            Some(row) => self.members(row).map(<[DiveKey]>::len).unwrap_or(0),
        }
    }

    fn dive_at(&self, index: RowIndex) -> Option<DiveId> {
        match index.parent {
            None => self.items.get(index.row).and_then(Item::dive_id),
            Some(parent) => self
                .members(parent)
                .and_then(|members| members.get(index.row))
                .map(|key| key.id),
        }
    }

    fn trip_at(&self, row: usize) -> Option<TripId> {
        self.items.get(row).and_then(Item::trip_id)
    }

    fn trip_summary(&self, row: usize) -> Option<TripSummary> {
        let item = self.items.get(row)?;
        let trip = item.trip_id()?;
        Some(TripSummary {
            trip,
            first_when: item.dives.first().map(|key| key.when).unwrap_or(item.key.when()),
            last_when: item.dives.last().map(|key| key.when).unwrap_or(item.key.when()),
            total: item.dives.len(),
            shown: self
                .visibility
                .count_shown(item.dives.iter().map(|key| key.id)),
        })
    }

    fn row_of(&self, id: DiveId) -> Option<RowIndex> {
        for (row, item) in self.items.iter().enumerate() {
            if item.dive_id() == Some(id) {
                return Some(RowIndex::top(row));
            }
            if let Some(member) = item.dives.iter().position(|key| key.id == id) {
                return Some(RowIndex::child(row, member));
            }
        }
        None
    }

    fn rows_of(&self, ids: &HashSet<DiveId>) -> Vec<RowIndex> {
        let mut rows = Vec::new();
        for (row, item) in self.items.iter().enumerate() {
            match item.dive_id() {
                Some(id) if ids.contains(&id) => rows.push(RowIndex::top(row)),
                Some(_) => {}
                None => rows.extend(
                    item.dives
                        .iter()
                        .enumerate()
                        .filter(|(_, key)| ids.contains(&key.id))
                        .map(|(member, _)| RowIndex::child(row, member)),
                ),
            }
        }
        rows
    }

    fn is_shown(&self, index: RowIndex) -> bool {
        match index.parent {
            None => self.items.get(index.row).map(|item| item.shown).unwrap_or(false),
            Some(_) => self
                .dive_at(index)
                .map(|id| self.visibility.is_shown(id))
                .unwrap_or(false),
        }
    }

    fn shown_count(&self) -> usize {
        self.visibility
            .count_shown(self.dive_keys().into_iter().map(|key| key.id))
    }

    fn dive_keys(&self) -> Vec<DiveKey> {
        let mut keys = Vec::new();
        for item in &self.items {
            match item.key {
                ItemKey::Dive(key) => keys.push(key),
                ItemKey::Trip { .. } => keys.extend(item.dives.iter().copied()),
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::{item_less_than, GroupedProjection, ItemKey};
    use crate::filter::oracle::ShowAll;
    use crate::model::dive::{Dive, DiveKey};
    use crate::model::trip::Trip;
    use crate::notify::{ModelEvent, RowIndex};
    use crate::projection::{DiveProjection, ProjectionContext};
    use crate::repo::dive_repo::MemoryDiveRepository;
    use uuid::Uuid;

    fn dive_key(when: i64) -> DiveKey {
        DiveKey {
            when,
            number: 0,
            id: Uuid::from_u128(when as u128),
        }
    }

    #[test]
    fn dive_sorts_before_trip_starting_at_same_time() {
        let dive = ItemKey::Dive(dive_key(100));
        let trip = ItemKey::Trip {
            when: 100,
            id: Uuid::from_u128(1),
        };
        assert!(item_less_than(&dive, &trip));
        assert!(!item_less_than(&trip, &dive));
        let later_dive = ItemKey::Dive(dive_key(101));
        assert!(item_less_than(&trip, &later_dive));
    }

    #[test]
    fn populate_groups_members_under_their_trip() {
        let mut store = MemoryDiveRepository::new();
        let trip = store.insert_trip(Trip::new("Red Sea")).unwrap();
        let mut first = Dive::new(100);
        first.trip = Some(trip);
        let mut second = Dive::new(300);
        second.trip = Some(trip);
        let bare = Dive::new(200);
        let first_id = store.insert_dive(first).unwrap();
        store.insert_dive(second).unwrap();
        store.insert_dive(bare).unwrap();

        let mut projection = GroupedProjection::new();
        let mut events = Vec::new();
        projection.populate(&ProjectionContext::new(&store, &ShowAll), &mut events);

        assert_eq!(projection.row_count(None), 2);
        assert_eq!(projection.trip_at(0), Some(trip));
        assert_eq!(projection.row_count(Some(0)), 2);
        assert_eq!(projection.row_of(first_id), Some(RowIndex::child(0, 0)));
        assert_eq!(events, vec![ModelEvent::Reset, ModelEvent::CountVisibleChanged]);
    }

    #[test]
    fn growing_trip_earlier_moves_it_up() {
        let mut store = MemoryDiveRepository::new();
        let trip = store.insert_trip(Trip::new("Lake")).unwrap();
        store.insert_dive(Dive::new(100)).unwrap();
        let mut member = Dive::new(500);
        member.trip = Some(trip);
        store.insert_dive(member).unwrap();

        let mut projection = GroupedProjection::new();
        let mut events = Vec::new();
        projection.populate(&ProjectionContext::new(&store, &ShowAll), &mut events);
        assert_eq!(projection.trip_at(1), Some(trip));

        let mut early = Dive::new(50);
        early.trip = Some(trip);
        let early_id = store.insert_dive(early).unwrap();
        events.clear();
        projection.dives_added(
            &ProjectionContext::new(&store, &ShowAll),
            Some(trip),
            false,
            &[early_id],
            &mut events,
        );

        assert_eq!(projection.trip_at(0), Some(trip));
        assert!(events.contains(&ModelEvent::RowsMoved {
            parent: None,
            first: 1,
            last: 2,
            to_parent: None,
            to_row: 0,
        }));
    }

    #[test]
    fn mutations_before_populate_are_ignored() {
        let mut store = MemoryDiveRepository::new();
        let id = store.insert_dive(Dive::new(10)).unwrap();
        let mut projection = GroupedProjection::new();
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
}
