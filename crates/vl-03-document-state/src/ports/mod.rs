//! Persistence port for the cached document projection.

pub mod store;
