//! Dive record store contract and in-memory arena implementation.
//!
//! # Responsibility
//! - Give projections read access to the one shared record table.
//! - Let the command layer, tests and tools mutate that table directly.
//!
//! # Invariants
//! - Each dive/trip/site ID is present at most once.
//! - `dives()` is ordered by `Dive::key()`.
//! - The store never emits events; the command layer reports what it changed.

use crate::model::dive::{Dive, DiveId};
use crate::model::trip::{DiveSite, SiteId, Trip, TripId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by record store mutations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from record store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// A dive with this ID is already stored.
    DuplicateDive(DiveId),
    /// A trip with this ID is already stored.
    DuplicateTrip(TripId),
    /// Target dive does not exist.
    DiveNotFound(DiveId),
    /// Target trip does not exist.
    TripNotFound(TripId),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateDive(id) => write!(f, "dive already exists: {id}"),
            Self::DuplicateTrip(id) => write!(f, "trip already exists: {id}"),
            Self::DiveNotFound(id) => write!(f, "dive not found: {id}"),
            Self::TripNotFound(id) => write!(f, "trip not found: {id}"),
        }
    }
}

impl Error for RepoError {}

/// Errors from loading a JSON store snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    /// Input is not a valid snapshot document.
    Parse(String),
    /// Snapshot content violates store invariants.
    Invalid(RepoError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid snapshot: {message}"),
            Self::Invalid(err) => write!(f, "inconsistent snapshot: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Parse(_) => None,
        }
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Invalid(value)
    }
}

/// Read interface projections use to resolve record state.
pub trait DiveRepository {
    /// Loads one dive by id.
    fn dive(&self, id: DiveId) -> Option<&Dive>;
    /// Loads one trip by id.
    fn trip(&self, id: TripId) -> Option<&Trip>;
    /// Loads one dive site by id.
    fn site(&self, id: SiteId) -> Option<&DiveSite>;
    /// Returns all dives in chronological order.
    fn dives(&self) -> Vec<&Dive>;
    /// Returns the dives located at one site.
    fn dives_at_site(&self, id: SiteId) -> Vec<DiveId>;
    /// Whether any dive already carries this number.
    fn number_in_use(&self, number: i32) -> bool;
}

/// Serializable snapshot of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub sites: Vec<DiveSite>,
    pub trips: Vec<Trip>,
    pub dives: Vec<Dive>,
}

/// Arena-owned in-memory record table.
#[derive(Debug, Clone, Default)]
pub struct MemoryDiveRepository {
    dives: HashMap<DiveId, Dive>,
    trips: HashMap<TripId, Trip>,
    sites: HashMap<SiteId, DiveSite>,
}

impl MemoryDiveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a snapshot, rejecting duplicate IDs.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> RepoResult<Self> {
        let mut repo = Self::new();
        for site in snapshot.sites {
            repo.sites.insert(site.id, site);
        }
        for trip in snapshot.trips {
            repo.insert_trip(trip)?;
        }
        for dive in snapshot.dives {
            repo.insert_dive(dive)?;
        }
        Ok(repo)
    }

    /// Parses a JSON snapshot document.
    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        let snapshot: StoreSnapshot =
            serde_json::from_str(input).map_err(|err| SnapshotError::Parse(err.to_string()))?;
        Ok(Self::from_snapshot(snapshot)?)
    }

    /// Returns a snapshot with dives in chronological order.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut trips: Vec<Trip> = self.trips.values().cloned().collect();
        trips.sort_by_key(|trip| trip.id);
        let mut sites: Vec<DiveSite> = self.sites.values().cloned().collect();
        sites.sort_by_key(|site| site.id);
        StoreSnapshot {
            sites,
            trips,
            dives: self.dives().into_iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dives.is_empty()
    }

    /// Adds one dive.
    pub fn insert_dive(&mut self, dive: Dive) -> RepoResult<DiveId> {
        if self.dives.contains_key(&dive.id) {
            return Err(RepoError::DuplicateDive(dive.id));
        }
        let id = dive.id;
        self.dives.insert(id, dive);
        Ok(id)
    }

    /// Detaches one dive, returning it to the caller (e.g. an undo stack).
    pub fn remove_dive(&mut self, id: DiveId) -> RepoResult<Dive> {
        self.dives.remove(&id).ok_or(RepoError::DiveNotFound(id))
    }

    pub fn dive_mut(&mut self, id: DiveId) -> Option<&mut Dive> {
        self.dives.get_mut(&id)
    }

    /// Adds one trip.
    pub fn insert_trip(&mut self, trip: Trip) -> RepoResult<TripId> {
        if self.trips.contains_key(&trip.id) {
            return Err(RepoError::DuplicateTrip(trip.id));
        }
        let id = trip.id;
        self.trips.insert(id, trip);
        Ok(id)
    }

    pub fn remove_trip(&mut self, id: TripId) -> RepoResult<Trip> {
        self.trips.remove(&id).ok_or(RepoError::TripNotFound(id))
    }

    pub fn trip_mut(&mut self, id: TripId) -> Option<&mut Trip> {
        self.trips.get_mut(&id)
    }

    /// Adds or replaces one dive site.
    pub fn upsert_site(&mut self, site: DiveSite) -> SiteId {
        let id = site.id;
        self.sites.insert(id, site);
        id
    }

    pub fn site_mut(&mut self, id: SiteId) -> Option<&mut DiveSite> {
        self.sites.get_mut(&id)
    }

    /// Re-parents dives to `trip` (or to no trip).
    ///
    /// Validated before any dive is touched.
    pub fn assign_trip(&mut self, dives: &[DiveId], trip: Option<TripId>) -> RepoResult<()> {
        if let Some(trip_id) = trip {
            if !self.trips.contains_key(&trip_id) {
                return Err(RepoError::TripNotFound(trip_id));
            }
        }
        if let Some(missing) = dives.iter().find(|id| !self.dives.contains_key(id)) {
            return Err(RepoError::DiveNotFound(*missing));
        }
        for id in dives {
            if let Some(dive) = self.dives.get_mut(id) {
                dive.trip = trip;
            }
        }
        Ok(())
    }

    /// Shifts start times of dives by the same delta.
    pub fn shift_times(&mut self, dives: &[DiveId], delta: i64) -> RepoResult<()> {
        if let Some(missing) = dives.iter().find(|id| !self.dives.contains_key(id)) {
            return Err(RepoError::DiveNotFound(*missing));
        }
        for id in dives {
            if let Some(dive) = self.dives.get_mut(id) {
                dive.when += delta;
            }
        }
        Ok(())
    }

    /// Members of a trip in chronological order.
    pub fn trip_dives(&self, trip: TripId) -> Vec<DiveId> {
        self.dives()
            .into_iter()
            .filter(|dive| dive.trip == Some(trip))
            .map(|dive| dive.id)
            .collect()
    }
}

impl DiveRepository for MemoryDiveRepository {
    fn dive(&self, id: DiveId) -> Option<&Dive> {
        self.dives.get(&id)
    }

    fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trips.get(&id)
    }

    fn site(&self, id: SiteId) -> Option<&DiveSite> {
        self.sites.get(&id)
    }

    fn dives(&self) -> Vec<&Dive> {
        let mut dives: Vec<&Dive> = self.dives.values().collect();
        dives.sort_by_key(|dive| dive.key());
        dives
    }

    fn dives_at_site(&self, id: SiteId) -> Vec<DiveId> {
        self.dives()
            .into_iter()
            .filter(|dive| dive.site == Some(id))
            .map(|dive| dive.id)
            .collect()
    }

    fn number_in_use(&self, number: i32) -> bool {
        self.dives.values().any(|dive| dive.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::{DiveRepository, MemoryDiveRepository, RepoError, SnapshotError};
    use crate::model::dive::Dive;
    use crate::model::trip::{DiveSite, Trip};
    use uuid::Uuid;

    #[test]
    fn dives_come_back_in_chronological_order() {
        let mut repo = MemoryDiveRepository::new();
        repo.insert_dive(Dive::new(300)).unwrap();
        repo.insert_dive(Dive::new(100)).unwrap();
        repo.insert_dive(Dive::new(200)).unwrap();
        let whens: Vec<i64> = repo.dives().iter().map(|dive| dive.when).collect();
        assert_eq!(whens, vec![100, 200, 300]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut repo = MemoryDiveRepository::new();
        let dive = Dive::new(10);
        repo.insert_dive(dive.clone()).unwrap();
        assert_eq!(
            repo.insert_dive(dive.clone()),
            Err(RepoError::DuplicateDive(dive.id))
        );
    }

    #[test]
    fn assign_trip_validates_before_mutating() {
        let mut repo = MemoryDiveRepository::new();
        let id = repo.insert_dive(Dive::new(10)).unwrap();
        let missing = Uuid::new_v4();
        assert_eq!(
            repo.assign_trip(&[id, missing], None),
            Err(RepoError::DiveNotFound(missing))
        );

        let trip = repo.insert_trip(Trip::new("Bonaire")).unwrap();
        assert!(matches!(
            repo.assign_trip(&[id], Some(Uuid::new_v4())),
            Err(RepoError::TripNotFound(_))
        ));
        repo.assign_trip(&[id], Some(trip)).unwrap();
        assert_eq!(repo.trip_dives(trip), vec![id]);
    }

    #[test]
    fn site_lookup_and_numbers() {
        let mut repo = MemoryDiveRepository::new();
        let site = repo.upsert_site(DiveSite::new("Salt Pier"));
        let mut dive = Dive::new(10);
        dive.site = Some(site);
        dive.number = 42;
        let id = repo.insert_dive(dive).unwrap();

        assert_eq!(repo.dives_at_site(site), vec![id]);
        assert!(repo.number_in_use(42));
        assert!(!repo.number_in_use(43));
    }

    #[test]
    fn json_snapshot_loads_and_rejects_garbage() {
        let mut repo = MemoryDiveRepository::new();
        let trip = repo.insert_trip(Trip::new("Lake")).unwrap();
        let mut dive = Dive::new(500);
        dive.trip = Some(trip);
        repo.insert_dive(dive).unwrap();

        let json = serde_json::to_string(&repo.snapshot()).unwrap();
        let loaded = MemoryDiveRepository::from_json(&json).unwrap();
        assert_eq!(loaded.snapshot(), repo.snapshot());

        assert!(matches!(
            MemoryDiveRepository::from_json("{\"dives\": 3}"),
            Err(SnapshotError::Parse(_))
        ));
    }
}
