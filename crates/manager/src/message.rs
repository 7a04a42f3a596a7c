//! Messages in and out of the driver task.

use std::fmt;

use altda_primitives::prelude::*;
use altda_tracker::UnexpectedTransition;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{errors::ManagerResult, input::InputStatus, manager::ManagerStatus};

/// Messages from the handle to the driver to give it work to do, with a
/// completion to return a result.
#[derive(Debug)]
pub(crate) enum DriverMessage {
    GetInput(
        CommitmentKey,
        CancellationToken,
        oneshot::Sender<ManagerResult<InputStatus>>,
    ),
    Finalized(u64, oneshot::Sender<ManagerResult<bool>>),
    OnL1Finalized(u64, oneshot::Sender<ManagerResult<u64>>),
    AdvanceDerivationOrigin(u64, oneshot::Sender<ManagerResult<()>>),
    Status(oneshot::Sender<ManagerResult<ManagerStatus>>),
    ResetDerivation(oneshot::Sender<ManagerResult<()>>),
}

/// Pushed to the derivation pipeline when L1 invalidates what it did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PipelineSignal {
    /// L1 rewound to this height and some challenge statuses changed.
    Reorg(u64),

    /// Derivation has to start over from a safe point.
    Reset(ResetReason),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResetReason {
    /// A commitment derivation used expired without being resolved.
    ExpiredCommitment(CommitmentKey),

    UnexpectedTransition(UnexpectedTransition),
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpiredCommitment(key) => write!(f, "consumed commitment {key} expired"),
            Self::UnexpectedTransition(unexp) => write!(f, "{unexp}"),
        }
    }
}
