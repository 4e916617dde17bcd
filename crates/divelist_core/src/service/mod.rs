//! Core use-case services.
//!
//! # Responsibility
//! - Route store events into the active projection.
//! - Keep the display layer decoupled from projection internals.

pub mod dive_list_service;
pub mod events;
