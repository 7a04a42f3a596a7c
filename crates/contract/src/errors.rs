use alloy_primitives::{Address, Bytes, U256};
use altda_primitives::errors::CommitmentError;
use thiserror::Error;

pub type ContractResult<T> = Result<T, ContractError>;

/// Revert conditions of the challenge contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("challenge window not open")]
    ChallengeWindowNotOpen,

    #[error("challenge exists")]
    ChallengeExists,

    #[error("bond too low (have {have}, need {need})")]
    BondTooLow { have: U256, need: U256 },

    #[error("challenge not active")]
    ChallengeNotActive,

    #[error("challenge not expired")]
    ChallengeNotExpired,

    #[error("invalid input data (provided {provided}, expected {expected})")]
    InvalidInputData { provided: Bytes, expected: Bytes },

    #[error("withdrawal failed")]
    WithdrawalFailed,

    #[error("invalid resolver refund percentage {0}")]
    InvalidResolverRefundPercentage(U256),

    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    #[error("value sent to non-payable function")]
    NonPayable,

    #[error("invalid commitment: {0}")]
    InvalidCommitment(#[from] CommitmentError),
}

/// Errors decoding contract logs and calldata.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("abi: {0}")]
    Sol(#[from] alloy_sol_types::Error),

    #[error("block number {0} does not fit in u64")]
    BlockNumberOverflow(U256),

    #[error("commitment: {0}")]
    Commitment(#[from] CommitmentError),

    #[error("unknown challenge status {0}")]
    UnknownStatus(u8),

    #[error("empty resolve data")]
    EmptyResolveData,
}
