use altda_contract::ContractError;
use altda_primitives::errors::CommitmentError;
use altda_tracker::TrackerError;
use thiserror::Error;

pub type ManagerResult<T> = Result<T, ManagerError>;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("operation canceled")]
    Canceled,

    #[error("invalid commitment: {0}")]
    InvalidCommitment(#[from] CommitmentError),

    #[error("tracker: {0}")]
    Tracker(#[from] TrackerError),

    #[error("invalid contract params: {0}")]
    InvalidParams(#[from] ContractError),

    #[error("driver exited")]
    WorkerExited,
}
