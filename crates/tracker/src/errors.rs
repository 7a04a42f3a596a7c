use altda_primitives::prelude::*;
use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("unknown commitment {0}")]
    UnknownCommitment(CommitmentKey),

    #[error("challenge is {0}, not resolved")]
    NotResolved(ChallengeStatus),

    #[error("resolve data does not match commitment")]
    InvalidResolveData,
}

/// A contract event implied a status change we believe impossible.
///
/// This is an observation rather than a failure: the event is ignored, but
/// whoever drives derivation should treat it as grounds for a reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected transition {from} -> {to} for {key} at L1 block {l1_block}")]
pub struct UnexpectedTransition {
    pub key: CommitmentKey,
    pub from: ChallengeStatus,
    pub to: ChallengeStatus,
    pub l1_block: u64,
}
