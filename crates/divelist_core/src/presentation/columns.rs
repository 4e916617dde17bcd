//! Dive list columns: identity, headers, alignment and sort comparators.
//!
//! # Invariants
//! - Column ordinals are stable; hosts may persist them.
//! - Comparators are strict: ties on the column value fall back to the row,
//!   later rows first, so every column yields a total order.

use crate::config::{DisplayPrefs, LengthUnit, TemperatureUnit, VolumeUnit, WeightUnit};
use crate::model::dive::Dive;
use crate::repo::dive_repo::DiveRepository;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Number of columns in the dive list.
pub const COLUMN_COUNT: usize = 18;

/// Pictures taken within this many seconds of the dive count as "during".
const PICTURE_BUFFER_SECONDS: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Nr = 0,
    Date = 1,
    Rating = 2,
    Depth = 3,
    Duration = 4,
    Temperature = 5,
    TotalWeight = 6,
    Suit = 7,
    Cylinder = 8,
    Gas = 9,
    Sac = 10,
    Otu = 11,
    MaxCns = 12,
    Tags = 13,
    Photos = 14,
    Country = 15,
    Buddies = 16,
    Location = 17,
}

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Nr,
        Column::Date,
        Column::Rating,
        Column::Depth,
        Column::Duration,
        Column::Temperature,
        Column::TotalWeight,
        Column::Suit,
        Column::Cylinder,
        Column::Gas,
        Column::Sac,
        Column::Otu,
        Column::MaxCns,
        Column::Tags,
        Column::Photos,
        Column::Country,
        Column::Buddies,
        Column::Location,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Nr => "#",
            Self::Date => "Date",
            Self::Rating => "Rating",
            Self::Depth => "Depth",
            Self::Duration => "Duration",
            Self::Temperature => "Temp.",
            Self::TotalWeight => "Weight",
            Self::Suit => "Suit",
            Self::Cylinder => "Cylinder",
            Self::Gas => "Gas",
            Self::Sac => "SAC",
            Self::Otu => "OTU",
            Self::MaxCns => "Max CNS",
            Self::Tags => "Tags",
            Self::Photos => "Media",
            Self::Country => "Country",
            Self::Buddies => "Buddy",
            Self::Location => "Location",
        }
    }

    /// Header tooltip, naming the unit where the column has one.
    pub fn tooltip(self, prefs: &DisplayPrefs) -> String {
        let units = prefs.units;
        match self {
            Self::Depth => match units.length {
                LengthUnit::Meters => "Depth(m)".to_string(),
                LengthUnit::Feet => "Depth(ft)".to_string(),
            },
            Self::Temperature => match units.temperature {
                TemperatureUnit::Celsius => "Temp.(°C)".to_string(),
                TemperatureUnit::Fahrenheit => "Temp.(°F)".to_string(),
            },
            Self::TotalWeight => match units.weight {
                WeightUnit::Kilograms => "Weight(kg)".to_string(),
                WeightUnit::Pounds => "Weight(lbs)".to_string(),
            },
            Self::Sac => match units.volume {
                VolumeUnit::Liters => "SAC(l/min)".to_string(),
                VolumeUnit::CubicFeet => "SAC(cuft/min)".to_string(),
            },
            Self::Photos => "Media before/during/after dive".to_string(),
            Self::MaxCns => "Max CNS".to_string(),
            other => other.header().to_string(),
        }
    }

    /// Numeric columns are right aligned. `Nr` stays left: it doubles as the
    /// indent marker of trip rows.
    pub fn alignment(self) -> Alignment {
        match self {
            Self::Depth
            | Self::Duration
            | Self::Temperature
            | Self::TotalWeight
            | Self::Sac
            | Self::Otu
            | Self::MaxCns => Alignment::Right,
            _ => Alignment::Left,
        }
    }

    pub fn initial_sort_order(self) -> SortOrder {
        match self {
            Self::Nr | Self::Date => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    /// Only the number of a dive row can be edited in place.
    pub fn is_editable(self, is_dive_row: bool) -> bool {
        is_dive_row && self == Self::Nr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Where a dive's pictures were taken relative to the dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhotoIcon {
    None = 0,
    DuringDive = 1,
    OutsideDive = 2,
    Both = 3,
}

pub fn photo_icon(dive: &Dive) -> PhotoIcon {
    let total = i64::from(dive.duration_seconds);
    let mut bits = 0u8;
    for picture in &dive.pictures {
        let offset = picture.offset_seconds;
        if offset < -PICTURE_BUFFER_SECONDS || offset > total + PICTURE_BUFFER_SECONDS {
            bits |= 0b10;
        } else {
            bits |= 0b01;
        }
    }
    match bits {
        0b01 => PhotoIcon::DuringDive,
        0b10 => PhotoIcon::OutsideDive,
        0b11 => PhotoIcon::Both,
        _ => PhotoIcon::None,
    }
}

/// Sort value of the primary gas: helium dominates, then oxygen.
pub fn gas_sort_value(dive: &Dive) -> u32 {
    dive.primary_gas()
        .map(|gas| u32::from(gas.he_permille) * 1000 + u32::from(gas.o2()))
        .unwrap_or(0)
}

/// Case-insensitive text order with a byte-wise tiebreak.
fn text_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn site_text<'a>(store: &'a dyn DiveRepository, dive: &Dive, country: bool) -> &'a str {
    dive.site
        .and_then(|id| store.site(id))
        .map(|site| {
            if country {
                site.country.as_str()
            } else {
                site.name.as_str()
            }
        })
        .unwrap_or("")
}

/// Less-than on the column value, later row first on ties.
fn less_or_later(primary: Ordering, row1: usize, row2: usize) -> bool {
    primary == Ordering::Less || (primary == Ordering::Equal && row1 > row2)
}

/// Strict "sorts before" of two list rows under `column`.
pub fn column_less_than(
    column: Column,
    store: &dyn DiveRepository,
    (row1, d1): (usize, &Dive),
    (row2, d2): (usize, &Dive),
) -> bool {
    let primary = match column {
        Column::Nr | Column::Date => return row1 < row2,
        Column::Rating => d1.rating.cmp(&d2.rating),
        Column::Depth => d1.max_depth_mm.cmp(&d2.max_depth_mm),
        Column::Duration => d1.duration_seconds.cmp(&d2.duration_seconds),
        Column::Temperature => d1.water_temp_mkelvin.cmp(&d2.water_temp_mkelvin),
        Column::TotalWeight => d1.total_weight_grams().cmp(&d2.total_weight_grams()),
        Column::Suit => text_cmp(&d1.suit, &d2.suit),
        Column::Cylinder => match (d1.cylinders.first(), d2.cylinders.first()) {
            (Some(c1), Some(c2)) => text_cmp(&c1.description, &c2.description),
            _ => d1.cylinders.len().cmp(&d2.cylinders.len()),
        },
        Column::Gas => gas_sort_value(d1).cmp(&gas_sort_value(d2)),
        Column::Sac => d1.sac_ml_per_min.cmp(&d2.sac_ml_per_min),
        Column::Otu => d1.otu.cmp(&d2.otu),
        Column::MaxCns => d1.max_cns.cmp(&d2.max_cns),
        Column::Tags => text_cmp(&d1.tag_string(), &d2.tag_string()),
        Column::Photos => photo_icon(d1).cmp(&photo_icon(d2)),
        Column::Country => text_cmp(site_text(store, d1, true), site_text(store, d2, true)),
        Column::Buddies => text_cmp(&d1.buddy, &d2.buddy),
        Column::Location => text_cmp(site_text(store, d1, false), site_text(store, d2, false)),
    };
    less_or_later(primary, row1, row2)
}
