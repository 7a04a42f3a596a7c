//! Collection of data types shared by every part of the Alt-DA challenge
//! subsystem: commitments and their wire framing, challenge keys and statuses,
//! and the per-rollup parameters.

pub mod commitment;
pub mod errors;
pub mod key;
pub mod l1;
pub mod params;
pub mod status;

pub mod prelude;
