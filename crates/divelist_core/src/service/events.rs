//! Inbound mutation events reported by the command layer.
//!
//! Events describe what already happened to the store; projections never
//! re-validate them. They are serde-tagged so sessions can be replayed from
//! JSON.

use crate::model::dive::DiveId;
use crate::model::trip::{SiteField, SiteId, TripId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    DivesAdded {
        #[serde(default)]
        trip: Option<TripId>,
        #[serde(default)]
        create_trip: bool,
        dives: Vec<DiveId>,
    },
    DivesDeleted {
        #[serde(default)]
        trip: Option<TripId>,
        #[serde(default)]
        delete_trip: bool,
        dives: Vec<DiveId>,
    },
    DivesChanged {
        dives: Vec<DiveId>,
    },
    DivesMovedBetweenTrips {
        #[serde(default)]
        from: Option<TripId>,
        #[serde(default)]
        to: Option<TripId>,
        #[serde(default)]
        delete_from: bool,
        #[serde(default)]
        create_to: bool,
        dives: Vec<DiveId>,
    },
    /// Start times moved by `delta` seconds.
    DivesTimeShifted {
        delta: i64,
        dives: Vec<DiveId>,
    },
    TripChanged {
        trip: TripId,
    },
    DiveSiteChanged {
        site: SiteId,
        field: SiteField,
    },
    FilterInvalidated,
    DivesSelected {
        dives: Vec<DiveId>,
        #[serde(default)]
        current: Option<DiveId>,
    },
}

impl StoreEvent {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DivesAdded { .. } => "dives_added",
            Self::DivesDeleted { .. } => "dives_deleted",
            Self::DivesChanged { .. } => "dives_changed",
            Self::DivesMovedBetweenTrips { .. } => "dives_moved_between_trips",
            Self::DivesTimeShifted { .. } => "dives_time_shifted",
            Self::TripChanged { .. } => "trip_changed",
            Self::DiveSiteChanged { .. } => "dive_site_changed",
            Self::FilterInvalidated => "filter_invalidated",
            Self::DivesSelected { .. } => "dives_selected",
        }
    }
}
