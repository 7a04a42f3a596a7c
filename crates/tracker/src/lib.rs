//! Off-chain mirror of every commitment's challenge lifecycle, rebuilt from
//! contract events and local sightings and rewound on L1 reorgs.

pub mod errors;
pub mod tracker;

pub use errors::{TrackerError, TrackerResult, UnexpectedTransition};
pub use tracker::{ChallengeTracker, TrackedCommitment};
