use std::fmt;

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;

/// Identity of a challenge instance: the same commitment included at two
/// different L1 heights is challenged independently.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Arbitrary)]
#[derive(Serialize, Deserialize)]
pub struct CommitmentKey {
    /// L1 block the commitment was included in.
    pub l1_inclusion_block: u64,

    pub commitment: Commitment,
}

impl CommitmentKey {
    pub fn new(l1_inclusion_block: u64, commitment: Commitment) -> Self {
        Self {
            l1_inclusion_block,
            commitment,
        }
    }

    /// Last L1 block in which a challenge may still be opened.
    pub fn challenge_window_end(&self, challenge_window: u64) -> u64 {
        self.l1_inclusion_block.saturating_add(challenge_window)
    }

    /// Returns if a challenge could still be opened at `cur_l1`.
    pub fn in_challenge_window(&self, cur_l1: u64, challenge_window: u64) -> bool {
        cur_l1 >= self.l1_inclusion_block && cur_l1 <= self.challenge_window_end(challenge_window)
    }
}

impl fmt::Display for CommitmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.commitment, self.l1_inclusion_block)
    }
}
