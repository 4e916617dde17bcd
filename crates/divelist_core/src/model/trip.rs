//! Trip and dive-site models.
//!
//! A trip carries no ordering key of its own: its position is derived from
//! its member dives by the tree projection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one trip.
pub type TripId = Uuid;

/// Stable identifier of one dive site.
pub type SiteId = Uuid;

/// Named cluster of temporally related dives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trip {
    pub id: TripId,
    pub location: String,
    pub notes: String,
}

impl Trip {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            location: location.into(),
            notes: String::new(),
        }
    }
}

/// GPS position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Dive site as shown in the location/country columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiveSite {
    pub id: SiteId,
    pub name: String,
    /// Country taxonomy entry, empty when unknown.
    pub country: String,
    pub coordinates: Option<Coordinates>,
}

impl DiveSite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            country: String::new(),
            coordinates: None,
        }
    }

    pub fn has_gps(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Dive-site fields an editor may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteField {
    Name,
    Description,
    Notes,
    /// Country and region taxonomy.
    Taxonomy,
    /// GPS coordinates.
    Location,
}

impl SiteField {
    /// Whether a change of this field affects what the dive list shows.
    ///
    /// The name and country are columns; coordinates drive the globe icon.
    pub fn is_shown_in_list(self) -> bool {
        matches!(self, Self::Name | Self::Taxonomy | Self::Location)
    }
}
