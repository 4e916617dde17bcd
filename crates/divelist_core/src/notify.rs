//! Outbound change notifications toward the display layer.
//!
//! # Invariants
//! - Row ranges are 0-based and end-exclusive.
//! - `parent == None` addresses the top level; `Some(row)` a trip row.
//! - Events are emitted in the order the display layer must apply them.

use log::trace;
use serde::Serialize;

/// Position of one row: parent row (if any) plus row within that parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RowIndex {
    pub parent: Option<usize>,
    pub row: usize,
}

impl RowIndex {
    pub fn top(row: usize) -> Self {
        Self { parent: None, row }
    }

    pub fn child(parent: usize, row: usize) -> Self {
        Self {
            parent: Some(parent),
            row,
        }
    }
}

/// Contiguous rows under one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowRange {
    pub parent: Option<usize>,
    pub first: usize,
    pub last: usize,
}

/// Which cells of a row range need redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedData {
    /// Every column, including the shown state.
    All,
    /// Only the shown/hidden state.
    Visibility,
}

/// One change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ModelEvent {
    RowsInserted {
        parent: Option<usize>,
        first: usize,
        last: usize,
    },
    RowsRemoved {
        parent: Option<usize>,
        first: usize,
        last: usize,
    },
    /// Rows `first..last` of `parent` move in front of `to_row` of `to_parent`.
    ///
    /// `to_row` is given in coordinates before the move.
    RowsMoved {
        parent: Option<usize>,
        first: usize,
        last: usize,
        to_parent: Option<usize>,
        to_row: usize,
    },
    DataChanged {
        parent: Option<usize>,
        first: usize,
        last: usize,
        columns: ChangedData,
    },
    SelectionChanged {
        ranges: Vec<RowRange>,
    },
    CurrentChanged {
        row: Option<RowIndex>,
    },
    CountVisibleChanged,
    /// The whole projection was rebuilt or cleared.
    Reset,
}

impl ModelEvent {
    /// Whether the event changes row structure (insert/remove/move/reset).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::RowsInserted { .. } | Self::RowsRemoved { .. } | Self::RowsMoved { .. } | Self::Reset
        )
    }
}

/// Receiver of change notifications.
pub trait ModelObserver {
    fn notify(&mut self, event: ModelEvent);
}

impl ModelObserver for Vec<ModelEvent> {
    fn notify(&mut self, event: ModelEvent) {
        trace!("event=model_notify module=notify event={event:?}");
        self.push(event);
    }
}

/// Coalesces ordered row positions into contiguous ranges per parent.
///
/// Input must be ordered by parent, then row (projection order).
pub fn coalesce_rows(rows: &[RowIndex]) -> Vec<RowRange> {
    let mut ranges: Vec<RowRange> = Vec::new();
    for index in rows {
        match ranges.last_mut() {
            Some(range) if range.parent == index.parent && range.last == index.row => {
                range.last += 1;
            }
            _ => ranges.push(RowRange {
                parent: index.parent,
                first: index.row,
                last: index.row + 1,
            }),
        }
    }
    ranges
}
