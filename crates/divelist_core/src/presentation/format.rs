//! Cell text for dive and trip rows.
//!
//! # Invariants
//! - Unset measurements (`0` temperature, SAC, depth) render as empty text.
//! - Unit suffixes are appended only when `show_units_table` is set.

use crate::config::{DisplayPrefs, LengthUnit, TemperatureUnit, VolumeUnit, WeightUnit};
use crate::model::dive::{Dive, DiveMode, GasMix};
use crate::presentation::columns::Column;
use crate::repo::dive_repo::DiveRepository;
use chrono::{DateTime, Datelike, Utc};

const MM_PER_FOOT: f64 = 304.8;
const GRAMS_PER_POUND: f64 = 453.592_37;
const ML_PER_CUFT: f64 = 28_316.846_6;
const ZERO_CELSIUS_MKELVIN: f64 = 273_150.0;

fn timestamp(when: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(when, 0)
}

fn with_unit(value: String, unit: &str, prefs: &DisplayPrefs) -> String {
    if prefs.show_units_table {
        format!("{value}{unit}")
    } else {
        value
    }
}

/// Dive start as shown in the date column.
pub fn date_text(when: i64) -> String {
    timestamp(when)
        .map(|at| at.format("%a, %b %-d, %Y %H:%M").to_string())
        .unwrap_or_default()
}

pub fn depth_text(depth_mm: u32, prefs: &DisplayPrefs) -> String {
    if depth_mm == 0 {
        return String::new();
    }
    match prefs.units.length {
        LengthUnit::Meters => with_unit(
            format!("{:.1}", f64::from(depth_mm) / 1000.0),
            "m",
            prefs,
        ),
        LengthUnit::Feet => with_unit(
            format!("{:.0}", f64::from(depth_mm) / MM_PER_FOOT),
            "ft",
            prefs,
        ),
    }
}

/// Duration in minutes; freedives keep their seconds.
pub fn duration_text(seconds: u32, mode: DiveMode, prefs: &DisplayPrefs) -> String {
    if mode == DiveMode::Freedive {
        let text = format!("{}:{:02}", seconds / 60, seconds % 60);
        return with_unit(text, "min", prefs);
    }
    let minutes = (seconds + 30) / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, prefs.show_units_table) {
        (0, true) => format!("{minutes}min"),
        (0, false) => minutes.to_string(),
        (h, true) => format!("{h}h {minutes:02}min"),
        (h, false) => format!("{h}:{minutes:02}"),
    }
}

pub fn temperature_text(mkelvin: u32, prefs: &DisplayPrefs) -> String {
    if mkelvin == 0 {
        return String::new();
    }
    let celsius = (f64::from(mkelvin) - ZERO_CELSIUS_MKELVIN) / 1000.0;
    match prefs.units.temperature {
        TemperatureUnit::Celsius => with_unit(format!("{celsius:.1}"), "°C", prefs),
        TemperatureUnit::Fahrenheit => {
            with_unit(format!("{:.1}", celsius * 1.8 + 32.0), "°F", prefs)
        }
    }
}

pub fn weight_text(grams: u32, prefs: &DisplayPrefs) -> String {
    if grams == 0 {
        return String::new();
    }
    match prefs.units.weight {
        WeightUnit::Kilograms => with_unit(format!("{:.1}", f64::from(grams) / 1000.0), "kg", prefs),
        WeightUnit::Pounds => with_unit(
            format!("{:.0}", f64::from(grams) / GRAMS_PER_POUND),
            "lbs",
            prefs,
        ),
    }
}

pub fn sac_text(ml_per_min: u32, prefs: &DisplayPrefs) -> String {
    if ml_per_min == 0 {
        return String::new();
    }
    match prefs.units.volume {
        VolumeUnit::Liters => with_unit(
            format!("{:.1}", f64::from(ml_per_min) / 1000.0),
            "l/min",
            prefs,
        ),
        VolumeUnit::CubicFeet => with_unit(
            format!("{:.2}", f64::from(ml_per_min) / ML_PER_CUFT),
            "cuft/min",
            prefs,
        ),
    }
}

pub fn gas_name(gas: GasMix) -> String {
    if gas.he_permille > 0 {
        format!("{}/{}", (gas.o2() + 5) / 10, (gas.he_permille + 5) / 10)
    } else if gas.is_air() {
        "air".to_string()
    } else {
        format!("EAN{}", (gas.o2() + 5) / 10)
    }
}

/// Distinct gases of all cylinders, in cylinder order.
pub fn gas_text(dive: &Dive) -> String {
    let mut names: Vec<String> = Vec::new();
    for cylinder in &dive.cylinders {
        let name = gas_name(cylinder.gas);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(", ")
}

fn site_field(store: &dyn DiveRepository, dive: &Dive, country: bool) -> String {
    dive.site
        .and_then(|id| store.site(id))
        .map(|site| {
            if country {
                site.country.clone()
            } else {
                site.name.clone()
            }
        })
        .unwrap_or_default()
}

/// Display text of one dive cell.
pub fn dive_cell_text(
    store: &dyn DiveRepository,
    dive: &Dive,
    column: Column,
    prefs: &DisplayPrefs,
) -> String {
    match column {
        Column::Nr => dive.number.to_string(),
        Column::Date => date_text(dive.when),
        Column::Rating => "*".repeat(usize::from(dive.rating.min(5))),
        Column::Depth => depth_text(dive.max_depth_mm, prefs),
        Column::Duration => duration_text(dive.duration_seconds, dive.mode, prefs),
        Column::Temperature => temperature_text(dive.water_temp_mkelvin, prefs),
        Column::TotalWeight => weight_text(dive.total_weight_grams(), prefs),
        Column::Suit => dive.suit.clone(),
        Column::Cylinder => dive
            .cylinders
            .first()
            .map(|cylinder| cylinder.description.clone())
            .unwrap_or_default(),
        Column::Gas => gas_text(dive),
        Column::Sac => sac_text(dive.sac_ml_per_min, prefs),
        Column::Otu => dive.otu.to_string(),
        Column::MaxCns => {
            if prefs.show_units_table {
                format!("{}%", dive.max_cns)
            } else {
                dive.max_cns.to_string()
            }
        }
        Column::Tags => dive.tag_string(),
        // Rendered as an icon by the display layer.
        Column::Photos => String::new(),
        Column::Country => site_field(store, dive, true),
        Column::Buddies => dive.buddy.clone(),
        Column::Location => site_field(store, dive, false),
    }
}

/// Whether two timestamps fall on the same calendar day.
pub fn same_day(a: i64, b: i64) -> bool {
    match (timestamp(a), timestamp(b)) {
        (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
        _ => false,
    }
}

/// Date part of a trip label.
///
/// Single-day trips show the full day; longer trips show the month span.
pub fn trip_date_text(first_when: i64, last_when: i64, dive_count: usize) -> String {
    let count = if dive_count == 1 {
        "(1 dive)".to_string()
    } else {
        format!("({dive_count} dives)")
    };
    let (Some(first), Some(last)) = (timestamp(first_when), timestamp(last_when)) else {
        return count;
    };
    let span = if same_day(first_when, last_when) {
        first.format("%a, %b %-d, %Y").to_string()
    } else if first.year() == last.year() && first.month() == last.month() {
        first.format("%b %Y").to_string()
    } else {
        format!("{} - {}", first.format("%b %Y"), last.format("%b %Y"))
    };
    format!("{span} {count}")
}

/// Trip row label: location, date and, when filtered, the shown count.
pub fn trip_label(location: &str, date: &str, shown: usize, total: usize) -> String {
    let mut label = if location.is_empty() {
        date.to_string()
    } else {
        format!("{location}, {date}")
    };
    if shown < total {
        label.push_str(&format!(" ({shown} shown)"));
    }
    label
}
