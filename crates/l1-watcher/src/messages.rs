use altda_contract::{ContractEvent, ResolveCall};
use altda_primitives::l1::L1BlockRef;

/// L1 events that we observe and want the driver to work on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WatcherEvent {
    /// Contract activity of the next block in the chain.
    Block(L1BlockData),

    /// Blocks above this height are no longer canonical.
    Rewind(u64),
}

/// What the challenge contract did in a single L1 block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct L1BlockData {
    pub block_ref: L1BlockRef,

    /// Decoded contract events in log index order.
    pub events: Vec<ContractEvent>,

    /// Successful `resolve` calls to the contract, in transaction order.
    pub resolve_calls: Vec<ResolveCall>,
}

impl L1BlockData {
    pub fn new(
        block_ref: L1BlockRef,
        events: Vec<ContractEvent>,
        resolve_calls: Vec<ResolveCall>,
    ) -> Self {
        Self {
            block_ref,
            events,
            resolve_calls,
        }
    }

    pub fn empty(block_ref: L1BlockRef) -> Self {
        Self::new(block_ref, Vec::new(), Vec::new())
    }

    pub fn number(&self) -> u64 {
        self.block_ref.number
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum WatcherStatus {
    /// Not polled successfully yet.
    #[default]
    Idle,

    Following,

    /// Rolling back to a common ancestor with the client's chain.
    Rewinding,
}
