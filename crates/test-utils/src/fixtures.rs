//! Addresses and parameters shared by the test suites.

use alloy_primitives::{address, Address};
use altda_primitives::prelude::*;

pub const CHALLENGE_CONTRACT: Address = address!("00000000000000000000000000000000000da0da");

/// Where batchers post commitments. Not inspected by anything, but keeps the
/// mined blocks looking like real ones.
pub const BATCH_INBOX: Address = address!("ff00000000000000000000000000000000000420");

pub const OWNER: Address = address!("000000000000000000000000000000000000c0de");

pub const CHALLENGER: Address = address!("00000000000000000000000000000000000a11ce");

pub const RESOLVER: Address = address!("0000000000000000000000000000000000000b0b");

/// 16 block windows, bond of 1000, 50% refund.
pub fn test_params() -> AltDaParams {
    AltDaParams::new_test(CHALLENGE_CONTRACT)
}

pub fn keccak_key(l1_inclusion_block: u64, preimage: &[u8]) -> CommitmentKey {
    CommitmentKey::new(
        l1_inclusion_block,
        Commitment::from_preimage(CommitmentType::Keccak256, preimage),
    )
}
