//! Selection and current-dive tracking.
//!
//! # Responsibility
//! - Hold the selected dive identities and the current dive.
//! - Map them onto rows of whichever projection is active.
//! - Defer selection reloads while a compound command runs.
//!
//! # Invariants
//! - Only identities are stored; rows are recomputed on every emission.
//! - `CurrentChanged` is sent only when the current dive's row moved.
//! - While a command marker is held, reloads are queued and sent once on
//!   `flush`.

use crate::model::dive::DiveId;
use crate::notify::{coalesce_rows, ModelEvent, ModelObserver, RowIndex};
use crate::projection::DiveProjection;
use log::debug;
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

/// Held for the duration of a compound command; released on drop.
#[derive(Debug)]
pub struct CommandMarker {
    depth: Rc<Cell<usize>>,
}

impl Drop for CommandMarker {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Identity-based selection state.
#[derive(Debug, Default)]
pub struct Selection {
    selected: HashSet<DiveId>,
    current: Option<DiveId>,
    /// Row last reported for `current`.
    current_row: Option<RowIndex>,
    command_depth: Rc<Cell<usize>>,
    reload_pending: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &HashSet<DiveId> {
        &self.selected
    }

    pub fn current(&self) -> Option<DiveId> {
        self.current
    }

    pub fn is_selected(&self, id: DiveId) -> bool {
        self.selected.contains(&id)
    }

    /// Whether any of `dives` is selected.
    pub fn touches(&self, dives: &[DiveId]) -> bool {
        dives.iter().any(|id| self.selected.contains(id))
    }

    /// Replaces the selection. The current dive is selected implicitly.
    pub fn select(&mut self, dives: &[DiveId], current: Option<DiveId>) {
        self.selected = dives.iter().copied().collect();
        if let Some(current) = current {
            self.selected.insert(current);
        }
        self.current = current;
    }

    /// Drops deleted dives from the selection.
    pub fn forget(&mut self, dives: &[DiveId]) {
        for id in dives {
            self.selected.remove(id);
        }
        if self.current.is_some_and(|current| dives.contains(&current)) {
            self.current = None;
        }
    }

    pub fn enter_command(&self) -> CommandMarker {
        self.command_depth.set(self.command_depth.get() + 1);
        CommandMarker {
            depth: Rc::clone(&self.command_depth),
        }
    }

    pub fn in_command(&self) -> bool {
        self.command_depth.get() > 0
    }

    /// Emits the full selection now, or once the command marker is released.
    pub fn request_reload(&mut self, projection: &dyn DiveProjection, sink: &mut dyn ModelObserver) {
        if self.in_command() {
            debug!("event=selection_reload module=selection status=deferred");
            self.reload_pending = true;
            return;
        }
        self.emit(projection, sink);
    }

    /// Sends a deferred reload, if any, once no marker is held.
    pub fn flush(&mut self, projection: &dyn DiveProjection, sink: &mut dyn ModelObserver) {
        if self.reload_pending && !self.in_command() {
            self.reload_pending = false;
            self.emit(projection, sink);
        }
    }

    /// Sends one batched `SelectionChanged` and one `CurrentChanged`.
    ///
    /// Selected dives absent from the projection are skipped.
    pub fn emit(&mut self, projection: &dyn DiveProjection, sink: &mut dyn ModelObserver) {
        let rows = projection.rows_of(&self.selected);
        debug!(
            "event=selection_emit module=selection status=ok selected={} found={}",
            self.selected.len(),
            rows.len()
        );
        sink.notify(ModelEvent::SelectionChanged {
            ranges: coalesce_rows(&rows),
        });
        self.current_row = self.current.and_then(|id| projection.row_of(id));
        sink.notify(ModelEvent::CurrentChanged {
            row: self.current_row,
        });
    }

    /// Re-reports the current row after a structural change, if it moved.
    pub fn track_current(&mut self, projection: &dyn DiveProjection, sink: &mut dyn ModelObserver) {
        let row = self.current.and_then(|id| projection.row_of(id));
        if row != self.current_row {
            self.current_row = row;
            sink.notify(ModelEvent::CurrentChanged { row });
        }
    }
}
