//! Live projections over the dive table.
//!
//! # Responsibility
//! - Keep an ordered list view and a trip tree view of the same dives.
//! - Turn store mutation events into minimal, contiguous change notifications.
//!
//! # Invariants
//! - Every dive appears exactly once per projection at quiescent points.
//! - Top-level and member sequences are sorted by the projection's order.
//! - A trip's cached key is its earliest member; its shown state is the OR
//!   of its members' shown states.
//! - Projections hold keys into the store, never copies of dive state.

pub mod batch;
pub mod flat;
pub mod grouped;

use crate::filter::oracle::VisibilityOracle;
use crate::model::dive::{Dive, DiveId, DiveKey};
use crate::model::trip::TripId;
use crate::notify::{ModelObserver, RowIndex};
use crate::presentation::columns::Column;
use crate::repo::dive_repo::DiveRepository;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Projection layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Flat chronological list.
    List,
    /// Dives grouped into trips.
    Tree,
}

/// Lifecycle of one projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionState {
    Uninitialized,
    Populated,
}

/// Aggregate state of one trip row, used to label it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripSummary {
    pub trip: TripId,
    /// Start of the earliest member.
    pub first_when: i64,
    /// Start of the latest member.
    pub last_when: i64,
    pub total: usize,
    pub shown: usize,
}

/// Collaborators a projection reads during one event.
#[derive(Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub store: &'a dyn DiveRepository,
    pub oracle: &'a dyn VisibilityOracle,
}

impl<'a> ProjectionContext<'a> {
    pub fn new(store: &'a dyn DiveRepository, oracle: &'a dyn VisibilityOracle) -> Self {
        Self { store, oracle }
    }

    pub fn dive(&self, id: DiveId) -> Option<&'a Dive> {
        self.store.dive(id)
    }
}

/// Common surface of the list and tree projections.
///
/// Every mutation takes dive IDs in any order; implementations sort them
/// into their own order before batching.
pub trait DiveProjection {
    fn kind(&self) -> ProjectionKind;
    fn state(&self) -> ProjectionState;

    /// Builds the projection from a full store snapshot.
    fn populate(&mut self, ctx: &ProjectionContext<'_>, sink: &mut dyn ModelObserver);
    /// Drops all rows and returns to `Uninitialized`.
    fn clear(&mut self, sink: &mut dyn ModelObserver);

    fn dives_added(
        &mut self,
        ctx: &ProjectionContext<'_>,
        trip: Option<TripId>,
        create_trip: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    );
    fn dives_deleted(
        &mut self,
        ctx: &ProjectionContext<'_>,
        trip: Option<TripId>,
        delete_trip: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    );
    fn dives_changed(
        &mut self,
        ctx: &ProjectionContext<'_>,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    );
    #[allow(clippy::too_many_arguments)]
    fn dives_moved(
        &mut self,
        ctx: &ProjectionContext<'_>,
        from: Option<TripId>,
        to: Option<TripId>,
        delete_from: bool,
        create_to: bool,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    );
    fn dives_time_shifted(
        &mut self,
        ctx: &ProjectionContext<'_>,
        delta: i64,
        dives: &[DiveId],
        sink: &mut dyn ModelObserver,
    );
    fn trip_changed(&mut self, trip: TripId, sink: &mut dyn ModelObserver);
    /// Re-asks the oracle about every dive and notifies visibility changes.
    fn filter_recompute(&mut self, ctx: &ProjectionContext<'_>, sink: &mut dyn ModelObserver);

    /// Rows under `parent` (`None` = top level).
    fn row_count(&self, parent: Option<usize>) -> usize;
    /// Dive shown at `index`, `None` for trip rows and out-of-range indexes.
    fn dive_at(&self, index: RowIndex) -> Option<DiveId>;
    /// Trip shown at a top-level row.
    fn trip_at(&self, row: usize) -> Option<TripId>;
    /// Member counts of the trip at a top-level row.
    fn trip_summary(&self, _row: usize) -> Option<TripSummary> {
        None
    }
    /// Current row of one dive.
    fn row_of(&self, id: DiveId) -> Option<RowIndex>;
    /// Rows of the requested dives, in projection order. Unknown IDs are absent.
    fn rows_of(&self, ids: &HashSet<DiveId>) -> Vec<RowIndex>;
    /// Cached shown state of the row.
    fn is_shown(&self, index: RowIndex) -> bool;
    /// Number of shown dives.
    fn shown_count(&self) -> usize;
    /// All dive keys in projection order (depth first).
    fn dive_keys(&self) -> Vec<DiveKey>;
    /// Row permutation under a column comparator, for layouts that sort.
    fn column_order(&self, _store: &dyn DiveRepository, _column: Column) -> Option<Vec<usize>> {
        None
    }
}

/// Creates an empty projection of the requested kind.
pub fn new_projection(kind: ProjectionKind) -> Box<dyn DiveProjection> {
    match kind {
        ProjectionKind::List => Box::new(flat::FlatProjection::new()),
        ProjectionKind::Tree => Box::new(grouped::GroupedProjection::new()),
    }
}

/// Resolves dives in the store and sorts their keys chronologically.
///
/// Dives missing from the store are dropped with a warning.
pub(crate) fn sorted_keys(ctx: &ProjectionContext<'_>, dives: &[DiveId]) -> Vec<DiveKey> {
    let mut keys: Vec<DiveKey> = dives
        .iter()
        .filter_map(|id| match ctx.dive(*id) {
            Some(dive) => Some(dive.key()),
            None => {
                warn!("event=dive_unresolved module=projection status=skipped dive={id}");
                None
            }
        })
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// IDs among `dives` whose cached key no longer matches the store.
///
/// A renumber or a new start time leaves the cached copy behind; such dives
/// have to be re-sorted, not just refreshed in place.
pub(crate) fn stale_ids<I>(
    ctx: &ProjectionContext<'_>,
    cached: I,
    dives: &[DiveId],
) -> HashSet<DiveId>
where
    I: IntoIterator<Item = DiveKey>,
{
    let wanted: HashSet<DiveId> = dives.iter().copied().collect();
    cached
        .into_iter()
        .filter(|key| wanted.contains(&key.id))
        .filter(|key| ctx.dive(key.id).is_some_and(|dive| dive.key() != *key))
        .map(|key| key.id)
        .collect()
}

/// Orders `ids` by their position in `sequence`, dropping IDs not present.
///
/// Matching is by identity only, so dives already detached from the store
/// can still be located.
pub(crate) fn order_by_position<I>(sequence: I, ids: &[DiveId]) -> Vec<DiveId>
where
    I: IntoIterator<Item = DiveId>,
{
    let wanted: HashSet<DiveId> = ids.iter().copied().collect();
    let positions: HashMap<DiveId, usize> = sequence
        .into_iter()
        .enumerate()
        .filter(|(_, id)| wanted.contains(id))
        .map(|(position, id)| (id, position))
        .collect();

    let requested = wanted.len();
    let mut ordered: Vec<DiveId> = wanted
        .into_iter()
        .filter(|id| positions.contains_key(id))
        .collect();
    ordered.sort_by_key(|id| positions[id]);
    if ordered.len() < requested {
        warn!(
            "event=dive_not_in_projection module=projection status=skipped requested={} found={}",
            requested,
            ordered.len()
        );
    }
    ordered
}
