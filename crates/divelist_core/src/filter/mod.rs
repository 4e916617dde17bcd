//! Dive visibility: oracles and the per-projection cache of their answers.
//!
//! # Responsibility
//! - Keep visibility decisions outside the projections.
//! - Let each projection remember what it last showed, to diff against.

pub mod oracle;
pub mod visibility;
