//! ABI of the data availability challenge contract.
//!
//! Only the parts the challenge subsystem touches are declared: the events it
//! follows, and the calls operators make (and whose calldata the watcher
//! parses to recover resolved preimages).

use alloy_primitives::{Address, Bytes, Log, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use altda_primitives::prelude::*;

use crate::errors::AbiError;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event ChallengeStatusChanged(
        uint256 indexed challengedBlockNumber,
        bytes challengedCommitment,
        uint8 status
    );

    #[derive(Debug, PartialEq, Eq)]
    event BalanceChanged(address account, uint256 balance);

    #[derive(Debug, PartialEq, Eq)]
    event RequiredBondSizeChanged(uint256 bondSize);

    #[derive(Debug, PartialEq, Eq)]
    event ResolverRefundPercentageChanged(uint256 resolverRefundPercentage);

    #[derive(Debug, PartialEq, Eq)]
    event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

    function deposit() external payable;

    function withdraw() external;

    function challenge(uint256 challengedBlockNumber, bytes calldata challengedCommitment)
        external
        payable;

    function resolve(
        uint256 challengedBlockNumber,
        bytes calldata challengedCommitment,
        bytes calldata resolveData
    ) external;

    function unlockBond(uint256 challengedBlockNumber, bytes calldata challengedCommitment)
        external;

    function getChallengeStatus(uint256 challengedBlockNumber, bytes calldata challengedCommitment)
        external
        view
        returns (uint8);

    function setBondSize(uint256 _bondSize) external;

    function setResolverRefundPercentage(uint256 _resolverRefundPercentage) external;
}

/// Decoded event emitted by the challenge contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContractEvent {
    ChallengeStatusChanged {
        key: CommitmentKey,
        status: ChallengeStatus,
    },

    BalanceChanged {
        account: Address,
        balance: U256,
    },

    RequiredBondSizeChanged(U256),

    ResolverRefundPercentageChanged(U256),

    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl ContractEvent {
    /// Encodes the event as an L1 log emitted by `address`.
    pub fn to_log(&self, address: Address) -> Log {
        let data = match self {
            Self::ChallengeStatusChanged { key, status } => ChallengeStatusChanged {
                challengedBlockNumber: U256::from(key.l1_inclusion_block),
                challengedCommitment: key.commitment.encode(),
                status: status.as_u8(),
            }
            .encode_log_data(),
            Self::BalanceChanged { account, balance } => BalanceChanged {
                account: *account,
                balance: *balance,
            }
            .encode_log_data(),
            Self::RequiredBondSizeChanged(bond_size) => RequiredBondSizeChanged {
                bondSize: *bond_size,
            }
            .encode_log_data(),
            Self::ResolverRefundPercentageChanged(pct) => ResolverRefundPercentageChanged {
                resolverRefundPercentage: *pct,
            }
            .encode_log_data(),
            Self::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => OwnershipTransferred {
                previousOwner: *previous_owner,
                newOwner: *new_owner,
            }
            .encode_log_data(),
        };
        Log { address, data }
    }
}

/// Decodes a log emitted by the challenge contract.
///
/// Returns `None` if the log is not one of the events we follow. The caller is
/// responsible for checking the emitting address.
pub fn decode_log(log: &Log) -> Option<Result<ContractEvent, AbiError>> {
    let topic0 = *log.data.topics().first()?;

    let res = if topic0 == ChallengeStatusChanged::SIGNATURE_HASH {
        decode_status_changed(log)
    } else if topic0 == BalanceChanged::SIGNATURE_HASH {
        BalanceChanged::decode_log_data(&log.data, true)
            .map(|ev| ContractEvent::BalanceChanged {
                account: ev.account,
                balance: ev.balance,
            })
            .map_err(AbiError::from)
    } else if topic0 == RequiredBondSizeChanged::SIGNATURE_HASH {
        RequiredBondSizeChanged::decode_log_data(&log.data, true)
            .map(|ev| ContractEvent::RequiredBondSizeChanged(ev.bondSize))
            .map_err(AbiError::from)
    } else if topic0 == ResolverRefundPercentageChanged::SIGNATURE_HASH {
        ResolverRefundPercentageChanged::decode_log_data(&log.data, true)
            .map(|ev| ContractEvent::ResolverRefundPercentageChanged(ev.resolverRefundPercentage))
            .map_err(AbiError::from)
    } else if topic0 == OwnershipTransferred::SIGNATURE_HASH {
        OwnershipTransferred::decode_log_data(&log.data, true)
            .map(|ev| ContractEvent::OwnershipTransferred {
                previous_owner: ev.previousOwner,
                new_owner: ev.newOwner,
            })
            .map_err(AbiError::from)
    } else {
        return None;
    };

    Some(res)
}

fn decode_status_changed(log: &Log) -> Result<ContractEvent, AbiError> {
    let ev = ChallengeStatusChanged::decode_log_data(&log.data, true)?;
    let key = decode_key(ev.challengedBlockNumber, &ev.challengedCommitment)?;
    let status = match ChallengeStatus::try_from(ev.status) {
        // Status 0 is never emitted.
        Ok(ChallengeStatus::Uninitialized) | Err(_) => {
            return Err(AbiError::UnknownStatus(ev.status))
        }
        Ok(s) => s,
    };
    Ok(ContractEvent::ChallengeStatusChanged { key, status })
}

fn decode_key(block_number: U256, commitment: &[u8]) -> Result<CommitmentKey, AbiError> {
    let l1_inclusion_block =
        u64::try_from(block_number).map_err(|_| AbiError::BlockNumberOverflow(block_number))?;
    let commitment = Commitment::decode(commitment)?;
    Ok(CommitmentKey::new(l1_inclusion_block, commitment))
}

/// Arguments of a `resolve` call recovered from transaction input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolveCall {
    pub key: CommitmentKey,
    pub preimage: Bytes,
}

impl ResolveCall {
    pub fn new(key: CommitmentKey, preimage: Bytes) -> Self {
        Self { key, preimage }
    }

    /// Parses transaction input, returning `None` if it is not a `resolve`
    /// call at all.
    pub fn from_calldata(input: &[u8]) -> Option<Result<Self, AbiError>> {
        if input.len() < 4 || input[..4] != resolveCall::SELECTOR {
            return None;
        }
        Some(Self::decode_calldata(input))
    }

    fn decode_calldata(input: &[u8]) -> Result<Self, AbiError> {
        let call = resolveCall::abi_decode(input, true)?;
        if call.resolveData.is_empty() {
            return Err(AbiError::EmptyResolveData);
        }
        let key = decode_key(call.challengedBlockNumber, &call.challengedCommitment)?;
        Ok(Self::new(key, call.resolveData))
    }

    /// Encodes the call as transaction input.
    pub fn to_calldata(&self) -> Bytes {
        resolve_calldata(&self.key, &self.preimage)
    }
}

pub fn deposit_calldata() -> Bytes {
    depositCall {}.abi_encode().into()
}

pub fn withdraw_calldata() -> Bytes {
    withdrawCall {}.abi_encode().into()
}

pub fn challenge_calldata(key: &CommitmentKey) -> Bytes {
    challengeCall {
        challengedBlockNumber: U256::from(key.l1_inclusion_block),
        challengedCommitment: key.commitment.encode(),
    }
    .abi_encode()
    .into()
}

pub fn resolve_calldata(key: &CommitmentKey, preimage: &[u8]) -> Bytes {
    resolveCall {
        challengedBlockNumber: U256::from(key.l1_inclusion_block),
        challengedCommitment: key.commitment.encode(),
        resolveData: Bytes::copy_from_slice(preimage),
    }
    .abi_encode()
    .into()
}

pub fn unlock_bond_calldata(key: &CommitmentKey) -> Bytes {
    unlockBondCall {
        challengedBlockNumber: U256::from(key.l1_inclusion_block),
        challengedCommitment: key.commitment.encode(),
    }
    .abi_encode()
    .into()
}
