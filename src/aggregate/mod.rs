//! Pure aggregation routines over already-fetched readings.
//!
//! Nothing in this module does I/O or holds state across requests; every
//! function is recomputed from a fresh slice of readings per call.

pub mod fleet;
pub mod monthly;
pub mod snapshot;
