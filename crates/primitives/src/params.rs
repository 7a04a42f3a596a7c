//! Per-rollup Alt-DA parameters.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{commitment::CommitmentType, key::CommitmentKey};

/// Parameters that don't change for the lifetime of the rollup, except for
/// the governance-controlled values the challenge contract announces through
/// events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AltDaParams {
    /// Challenge contract on L1, used to filter logs and resolve calls.
    pub challenge_contract: Address,

    /// Commitment type this rollup accepts.
    pub commitment_type: CommitmentType,

    /// Number of L1 blocks after inclusion during which a commitment may be
    /// challenged.
    pub challenge_window: u64,

    /// Number of L1 blocks after a challenge is opened during which it may be
    /// resolved.
    pub resolve_window: u64,

    /// Minimum bond locked when opening a challenge.
    pub bond_size: U256,

    /// Share of the resolution cost refunded to the resolver, in `[0, 100]`.
    pub resolver_refund_percentage: U256,
}

impl AltDaParams {
    /// Returns if a challenge for `key` could still be opened at `cur_l1`.
    pub fn in_challenge_window(&self, key: &CommitmentKey, cur_l1: u64) -> bool {
        key.in_challenge_window(cur_l1, self.challenge_window)
    }

    /// Returns if a challenge started at `start_block` may still be resolved
    /// at `cur_l1`.
    pub fn in_resolve_window(&self, start_block: u64, cur_l1: u64) -> bool {
        cur_l1.saturating_sub(start_block) <= self.resolve_window
    }

    /// First L1 block at which nothing can change the fate of `key` anymore.
    pub fn settlement_block(&self, key: &CommitmentKey) -> u64 {
        key.l1_inclusion_block
            .saturating_add(self.challenge_window)
            .saturating_add(self.resolve_window)
    }

    /// Parameters used throughout the test suites: 16 block windows, a bond of
    /// 1000 and a 50% resolver refund.
    pub fn new_test(challenge_contract: Address) -> Self {
        Self {
            challenge_contract,
            commitment_type: CommitmentType::Keccak256,
            challenge_window: 16,
            resolve_window: 16,
            bond_size: U256::from(1000),
            resolver_refund_percentage: U256::from(50),
        }
    }
}
