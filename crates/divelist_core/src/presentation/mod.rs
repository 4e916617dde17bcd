//! Presentation accessors shared by both projections.
//!
//! # Responsibility
//! - Column metadata, sort comparators and cell text.
//! - Trip row labels and number edit validation.
//!
//! # See also
//! - `projection` for the row structure these accessors read.

pub mod columns;
pub mod edit;
pub mod format;

use crate::config::DisplayPrefs;
use crate::notify::RowIndex;
use crate::presentation::columns::Column;
use crate::presentation::format::{dive_cell_text, trip_date_text, trip_label};
use crate::projection::DiveProjection;
use crate::repo::dive_repo::DiveRepository;

/// Text of one cell of the active projection.
///
/// Trip rows carry their label in the `Nr` column and nothing elsewhere.
/// Returns `None` for rows that do not exist.
pub fn cell_text(
    projection: &dyn DiveProjection,
    store: &dyn DiveRepository,
    index: RowIndex,
    column: Column,
    prefs: &DisplayPrefs,
) -> Option<String> {
    if let Some(id) = projection.dive_at(index) {
        let dive = store.dive(id)?;
        return Some(dive_cell_text(store, dive, column, prefs));
    }
    if index.parent.is_some() {
        return None;
    }
    let summary = projection.trip_summary(index.row)?;
    if column != Column::Nr {
        return Some(String::new());
    }
    let location = store
        .trip(summary.trip)
        .map(|trip| trip.location.as_str())
        .unwrap_or("");
    let date = trip_date_text(summary.first_when, summary.last_when, summary.total);
    Some(trip_label(location, &date, summary.shown, summary.total))
}
