//! Core logic of the dive list.
//! Incremental list and trip-tree projections over one dive store.

pub mod config;
pub mod filter;
pub mod logging;
pub mod model;
pub mod notify;
pub mod presentation;
pub mod projection;
pub mod repo;
pub mod selection;
pub mod service;

pub use config::{ConfigError, DisplayPrefs, LoggingConfig, Units};
pub use filter::oracle::{FilterError, ShowAll, TextFilter, TextQuery, VisibilityOracle};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::dive::{Dive, DiveId, DiveKey};
pub use model::trip::{DiveSite, SiteField, SiteId, Trip, TripId};
pub use notify::{ChangedData, ModelEvent, ModelObserver, RowIndex, RowRange};
pub use presentation::columns::{Column, COLUMN_COUNT};
pub use presentation::edit::{EditError, RenumberRequest};
pub use projection::flat::FlatProjection;
pub use projection::grouped::GroupedProjection;
pub use projection::{DiveProjection, ProjectionContext, ProjectionKind, ProjectionState};
pub use repo::dive_repo::{
    DiveRepository, MemoryDiveRepository, RepoError, RepoResult, SnapshotError, StoreSnapshot,
};
pub use selection::Selection;
pub use service::dive_list_service::DiveListService;
pub use service::events::StoreEvent;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
