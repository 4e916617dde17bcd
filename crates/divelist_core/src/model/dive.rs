//! Dive record model.
//!
//! # Responsibility
//! - Define the canonical dive record shared by the list and tree projections.
//! - Provide the chronological ordering key used by every projection.
//!
//! # Invariants
//! - `id` is stable and never reused for another dive.
//! - `when` is seconds since the epoch; ordering ties break on `number`, then `id`.
//! - Unset measurements are stored as `0` (temperature, SAC) and render empty.

use crate::model::trip::{SiteId, TripId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Stable identifier of one dive.
pub type DiveId = Uuid;

/// Breathing mode recorded by the dive computer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiveMode {
    #[default]
    OpenCircuit,
    ClosedCircuit,
    Freedive,
}

/// Gas mixture in permille of oxygen and helium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMix {
    pub o2_permille: u16,
    pub he_permille: u16,
}

impl GasMix {
    /// Air is either unset oxygen or the 20.9% default with no helium.
    pub fn is_air(&self) -> bool {
        self.he_permille == 0 && (self.o2_permille == 0 || self.o2_permille == 209)
    }

    /// Effective oxygen fraction in permille, treating unset as air.
    pub fn o2(&self) -> u16 {
        if self.o2_permille == 0 {
            209
        } else {
            self.o2_permille
        }
    }
}

/// One cylinder as far as the list columns care.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cylinder {
    pub description: String,
    #[serde(default)]
    pub gas: GasMix,
}

/// Media attached to a dive, positioned relative to the dive start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub filename: String,
    /// Seconds after dive start; negative for pictures taken before entry.
    pub offset_seconds: i64,
}

/// Canonical dive record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dive {
    pub id: DiveId,
    /// User-visible dive number. `0` means unnumbered.
    pub number: i32,
    pub when: i64,
    pub duration_seconds: u32,
    pub max_depth_mm: u32,
    /// Star rating, 0..=5.
    pub rating: u8,
    /// Water temperature in millikelvin, `0` when unknown.
    pub water_temp_mkelvin: u32,
    pub weights_grams: Vec<u32>,
    pub suit: String,
    pub cylinders: Vec<Cylinder>,
    /// Surface air consumption in ml/min, `0` when unknown.
    pub sac_ml_per_min: u32,
    pub otu: u32,
    /// Maximum CNS loading in percent.
    pub max_cns: u32,
    pub tags: Vec<String>,
    pub pictures: Vec<Picture>,
    pub buddy: String,
    pub notes: String,
    pub mode: DiveMode,
    pub site: Option<SiteId>,
    pub trip: Option<TripId>,
}

impl Default for Dive {
    fn default() -> Self {
        Self::with_id(Uuid::nil(), 0)
    }
}

impl Dive {
    /// Creates a dive with a generated stable ID starting at `when`.
    pub fn new(when: i64) -> Self {
        Self::with_id(Uuid::new_v4(), when)
    }

    /// Creates a dive with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: DiveId, when: i64) -> Self {
        Self {
            id,
            number: 0,
            when,
            duration_seconds: 0,
            max_depth_mm: 0,
            rating: 0,
            water_temp_mkelvin: 0,
            weights_grams: Vec::new(),
            suit: String::new(),
            cylinders: Vec::new(),
            sac_ml_per_min: 0,
            otu: 0,
            max_cns: 0,
            tags: Vec::new(),
            pictures: Vec::new(),
            buddy: String::new(),
            notes: String::new(),
            mode: DiveMode::OpenCircuit,
            site: None,
            trip: None,
        }
    }

    /// Ordering key of this dive.
    pub fn key(&self) -> DiveKey {
        DiveKey {
            when: self.when,
            number: self.number,
            id: self.id,
        }
    }

    pub fn end_time(&self) -> i64 {
        self.when + i64::from(self.duration_seconds)
    }

    pub fn total_weight_grams(&self) -> u32 {
        self.weights_grams.iter().sum()
    }

    /// Gas of the first cylinder, if any.
    pub fn primary_gas(&self) -> Option<GasMix> {
        self.cylinders.first().map(|cylinder| cylinder.gas)
    }

    pub fn tag_string(&self) -> String {
        self.tags.join(", ")
    }
}

/// Chronological ordering key of a dive.
///
/// Field order matters: the derived `Ord` compares `when`, then `number`, then `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiveKey {
    pub when: i64,
    pub number: i32,
    pub id: DiveId,
}

/// Strict "sorts before" between two dives.
pub fn dive_less_than(a: &DiveKey, b: &DiveKey) -> bool {
    a.cmp(b) == Ordering::Less
}
