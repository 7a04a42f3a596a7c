use alloy_primitives::{Address, Bytes, Log, B256};
use altda_primitives::l1::L1BlockRef;

/// An L1 block with what the watcher needs from each transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct L1Block {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub transactions: Vec<L1Transaction>,
}

impl L1Block {
    pub fn block_ref(&self) -> L1BlockRef {
        L1BlockRef::new(self.number, self.hash, self.parent_hash)
    }
}

/// A transaction joined with its receipt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct L1Transaction {
    pub hash: B256,

    /// `None` for contract creations.
    pub to: Option<Address>,

    pub input: Bytes,

    /// Receipt status.
    pub success: bool,

    /// Logs in log index order, empty for failed transactions.
    pub logs: Vec<Log>,
}
