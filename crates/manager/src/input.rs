//! What derivation gets back when it asks for a commitment's input.

use alloy_primitives::Bytes;
use altda_primitives::prelude::*;

use crate::errors::ManagerResult;

/// Why an input can't be produced yet. Derivation retries on its next step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NotReadyReason {
    /// Storage doesn't have the preimage but it may still be challenged and
    /// revealed on L1.
    AwaitingPossibleChallenge,

    /// Challenged, waiting for a resolution or for the resolve window to
    /// end.
    ChallengeActive,

    /// Resolved on L1 but we haven't seen the resolving calldata.
    AwaitingResolveData,

    StorageTimeout,

    StorageUnavailable,
}

/// Outcome of [`DaManager::get_input`](crate::DaManager::get_input).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputStatus {
    Ready(Bytes),
    NotReady(NotReadyReason),

    /// The data is lost for good. Anything built on it has to go.
    Unavailable,

    /// L1 rewound to this height and challenge statuses changed with it.
    Reorg(u64),
}

/// Events the driver exposes to the derivation pipeline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DriverEvent {
    InputReady(Bytes),
    WaitChallenge,
    WaitResolveData,
    WaitStorage,
    Unavailable,
    Reorg(u64),
}

impl From<InputStatus> for DriverEvent {
    fn from(value: InputStatus) -> Self {
        match value {
            InputStatus::Ready(data) => Self::InputReady(data),
            InputStatus::NotReady(reason) => match reason {
                NotReadyReason::AwaitingPossibleChallenge | NotReadyReason::ChallengeActive => {
                    Self::WaitChallenge
                }
                NotReadyReason::AwaitingResolveData => Self::WaitResolveData,
                NotReadyReason::StorageTimeout | NotReadyReason::StorageUnavailable => {
                    Self::WaitStorage
                }
            },
            InputStatus::Unavailable => Self::Unavailable,
            InputStatus::Reorg(height) => Self::Reorg(height),
        }
    }
}

/// Parses the commitment out of a batcher transaction included in
/// `l1_inclusion_block`. A malformed payload invalidates the whole batch.
pub fn key_from_tx_data(l1_inclusion_block: u64, data: &[u8]) -> ManagerResult<CommitmentKey> {
    let commitment = Commitment::from_tx_data(data)?;
    Ok(CommitmentKey::new(l1_inclusion_block, commitment))
}
