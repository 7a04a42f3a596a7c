//! Scriptable in-memory L1 chain.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{keccak256, B256};
use altda_l1_watcher::{L1Block, L1Client, L1Transaction};
use altda_primitives::l1::L1BlockRef;
use anyhow::bail;
use async_trait::async_trait;

struct ChainState {
    /// Canonical chain, indexed by height. Always has a genesis block.
    blocks: Vec<L1Block>,

    /// Bumped on every reorg so replacement blocks get fresh hashes.
    fork: u64,

    /// Number of upcoming client calls that fail.
    failures: usize,

    calls: usize,
}

impl ChainState {
    fn block_hash(&self, number: u64) -> B256 {
        let mut buf = [0; 16];
        buf[..8].copy_from_slice(&number.to_be_bytes());
        buf[8..].copy_from_slice(&self.fork.to_be_bytes());
        keccak256(buf)
    }

    fn tip(&self) -> &L1Block {
        // genesis is never removed
        &self.blocks[self.blocks.len() - 1]
    }

    fn check_failure(&mut self) -> anyhow::Result<()> {
        self.calls += 1;
        if self.failures > 0 {
            self.failures -= 1;
            bail!("injected L1 client failure");
        }
        Ok(())
    }
}

/// L1 chain whose blocks are pushed by the test. Clones share the same chain,
/// so a test can keep a handle while the watcher polls another.
#[derive(Clone)]
pub struct MockL1Chain {
    state: Arc<Mutex<ChainState>>,
}

impl Default for MockL1Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockL1Chain {
    pub fn new() -> Self {
        let mut state = ChainState {
            blocks: Vec::new(),
            fork: 0,
            failures: 0,
            calls: 0,
        };
        let genesis = L1Block {
            number: 0,
            hash: state.block_hash(0),
            parent_hash: B256::ZERO,
            transactions: Vec::new(),
        };
        state.blocks.push(genesis);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().expect("test: chain lock poisoned")
    }

    pub fn head(&self) -> u64 {
        self.lock().tip().number
    }

    pub fn block(&self, number: u64) -> Option<L1Block> {
        self.lock().blocks.get(number as usize).cloned()
    }

    /// Appends a block with the given transactions on top of the tip.
    pub fn push_block(&self, transactions: Vec<L1Transaction>) -> L1BlockRef {
        let mut state = self.lock();
        let number = state.tip().number + 1;
        let block = L1Block {
            number,
            hash: state.block_hash(number),
            parent_hash: state.tip().hash,
            transactions,
        };
        let block_ref = block.block_ref();
        state.blocks.push(block);
        block_ref
    }

    /// Appends `n` empty blocks, returning the new tip.
    pub fn push_empty(&self, n: u64) -> u64 {
        for _ in 0..n {
            self.push_block(Vec::new());
        }
        self.head()
    }

    /// Drops every block above `height`. Blocks pushed afterwards are on a
    /// new fork and hash differently from the ones they replace.
    pub fn reorg_to(&self, height: u64) {
        let mut state = self.lock();
        assert!(
            (height as usize) < state.blocks.len(),
            "test: reorg above tip"
        );
        state.blocks.truncate(height as usize + 1);
        state.fork += 1;
    }

    /// Makes the next `n` client calls fail.
    pub fn fail_next_calls(&self, n: usize) {
        self.lock().failures = n;
    }

    /// Number of client calls served or failed so far.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }
}

#[async_trait]
impl L1Client for MockL1Chain {
    async fn get_chain_head(&self) -> anyhow::Result<u64> {
        let mut state = self.lock();
        state.check_failure()?;
        Ok(state.tip().number)
    }

    async fn get_block_hash(&self, height: u64) -> anyhow::Result<Option<B256>> {
        let mut state = self.lock();
        state.check_failure()?;
        Ok(state.blocks.get(height as usize).map(|b| b.hash))
    }

    async fn get_block_at(&self, height: u64) -> anyhow::Result<L1Block> {
        let mut state = self.lock();
        state.check_failure()?;
        match state.blocks.get(height as usize) {
            Some(b) => Ok(b.clone()),
            None => bail!("no block at height {height}"),
        }
    }
}
