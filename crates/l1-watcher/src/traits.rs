use alloy_primitives::B256;
use async_trait::async_trait;

use crate::types::L1Block;

#[async_trait]
pub trait L1Client: Sync + Send + 'static {
    /// Number of the latest block, corresponds to `eth_blockNumber`.
    async fn get_chain_head(&self) -> anyhow::Result<u64>;

    /// Fetches the hash of the block at a height, `None` if the chain is
    /// shorter than that.
    async fn get_block_hash(&self, height: u64) -> anyhow::Result<Option<B256>>;

    /// Fetches the block at a height with its transactions and receipts.
    async fn get_block_at(&self, height: u64) -> anyhow::Result<L1Block>;
}
