//! In-place edits from the dive list.
//!
//! Edits never touch the store: a validated edit becomes a request the
//! command layer applies, after which the store reports `DivesChanged`.

use crate::model::dive::DiveId;
use crate::notify::RowIndex;
use crate::presentation::columns::Column;
use crate::projection::DiveProjection;
use crate::repo::dive_repo::DiveRepository;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Row does not exist in the active projection.
    RowOutOfRange(RowIndex),
    /// Row is a trip, not a dive.
    NotADive(RowIndex),
    /// Column cannot be edited.
    NotEditable(Column),
    /// Dive numbers start at 1.
    ZeroNumber,
    /// Another dive already carries this number.
    NumberInUse(i32),
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowOutOfRange(index) => write!(f, "row out of range: {index:?}"),
            Self::NotADive(index) => write!(f, "row is not a dive: {index:?}"),
            Self::NotEditable(column) => write!(f, "column is not editable: {}", column.header()),
            Self::ZeroNumber => write!(f, "dive number must not be zero"),
            Self::NumberInUse(number) => write!(f, "dive number already in use: {number}"),
        }
    }
}

impl Error for EditError {}

/// Validated renumbering of one dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenumberRequest {
    pub dive: DiveId,
    pub number: i32,
}

/// Validates a number edit at `index`.
///
/// # Errors
/// - [`EditError::RowOutOfRange`] / [`EditError::NotADive`] for rows that
///   do not hold a dive.
/// - [`EditError::NotEditable`] for any column other than `Nr`.
/// - [`EditError::ZeroNumber`] / [`EditError::NumberInUse`] for invalid values.
pub fn validate_number_edit(
    projection: &dyn DiveProjection,
    store: &dyn DiveRepository,
    index: RowIndex,
    column: Column,
    number: i32,
) -> Result<RenumberRequest, EditError> {
    let in_range = index.row < projection.row_count(index.parent)
        && index
            .parent
            .map_or(true, |parent| parent < projection.row_count(None));
    if !in_range {
        return Err(EditError::RowOutOfRange(index));
    }
    let dive = projection
        .dive_at(index)
        .ok_or(EditError::NotADive(index))?;
    if !column.is_editable(true) {
        return Err(EditError::NotEditable(column));
    }
    if number == 0 {
        return Err(EditError::ZeroNumber);
    }
    if store.number_in_use(number) {
        return Err(EditError::NumberInUse(number));
    }
    Ok(RenumberRequest { dive, number })
}
