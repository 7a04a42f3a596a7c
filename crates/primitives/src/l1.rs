use std::fmt;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Minimal reference to an L1 block.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct L1BlockRef {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
}

impl L1BlockRef {
    pub fn new(number: u64, hash: B256, parent_hash: B256) -> Self {
        Self {
            number,
            hash,
            parent_hash,
        }
    }

    /// Returns if `child` builds directly on this block.
    pub fn is_parent_of(&self, child: &L1BlockRef) -> bool {
        child.number == self.number + 1 && child.parent_hash == self.hash
    }
}

impl fmt::Display for L1BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.number, self.hash)
    }
}
