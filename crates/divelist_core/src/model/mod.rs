//! Dive log domain model.
//!
//! # Responsibility
//! - Define the records both projections reference: dives, trips, dive sites.
//! - Keep projection state out of the records; projections hold only keys.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - A dive belongs to at most one trip.

pub mod dive;
pub mod trip;
