//! Record store abstractions.
//!
//! # Responsibility
//! - Define the read contract projections resolve dives, trips and sites through.
//! - Provide the in-memory store used by the command layer, tools and tests.
//!
//! # Invariants
//! - Projections only ever read through `DiveRepository`.

pub mod dive_repo;
