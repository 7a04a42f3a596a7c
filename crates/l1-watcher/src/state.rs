use std::collections::VecDeque;

use alloy_primitives::B256;

use crate::errors::WatcherError;

/// Recent canonical block hashes, used to find where a reorg forked off.
#[derive(Debug)]
pub struct ReaderState {
    /// Height of the next block to deliver, `.back()` of the queue + 1.
    next_height: u64,

    /// The `.back()` of this is the last delivered block.
    recent_blocks: VecDeque<B256>,

    /// Depth at which we start pulling recent blocks out of the front of the
    /// queue.
    max_depth: usize,
}

impl ReaderState {
    /// Constructs a new reader state. `recent_blocks` ends at
    /// `next_height - 1` and may be empty when starting from genesis.
    pub fn new(next_height: u64, max_depth: usize, recent_blocks: VecDeque<B256>) -> Self {
        assert!(recent_blocks.len() as u64 <= next_height);
        Self {
            next_height,
            recent_blocks,
            max_depth,
        }
    }

    pub fn next_height(&self) -> u64 {
        self.next_height
    }

    pub fn best_block(&self) -> Option<&B256> {
        self.recent_blocks.back()
    }

    pub fn best_block_idx(&self) -> Option<u64> {
        self.best_block().map(|_| self.next_height - 1)
    }

    /// Returns the idx of the deepest block in the reader state.
    fn deepest_block(&self) -> u64 {
        self.next_height - self.recent_blocks.len() as u64
    }

    /// Accepts a new block and possibly purges a buried one.
    pub fn accept_new_block(&mut self, blkhash: B256) -> Option<B256> {
        let ret = if self.recent_blocks.len() >= self.max_depth {
            self.recent_blocks.pop_front()
        } else {
            None
        };

        self.recent_blocks.push_back(blkhash);
        self.next_height += 1;
        ret
    }

    /// Gets the blockhash of the given height, if we have it.
    pub fn get_height_blkid(&self, height: u64) -> Option<&B256> {
        if height >= self.next_height || height < self.deepest_block() {
            return None;
        }

        let off = height - self.deepest_block();
        self.recent_blocks.get(off as usize)
    }

    /// Drops every block above `new_height`, returning the dropped hashes
    /// tip first.
    pub fn rollback_to_height(&mut self, new_height: u64) -> Result<Vec<B256>, WatcherError> {
        let tip = self.best_block_idx().ok_or(WatcherError::NoCommonAncestor)?;
        if new_height > tip {
            return Err(WatcherError::RollbackAboveTip(new_height, tip));
        }
        if new_height < self.deepest_block() {
            return Err(WatcherError::ReorgTooDeep(new_height, self.deepest_block()));
        }

        let mut buf = Vec::new();
        while self.next_height > new_height + 1 {
            if let Some(blkhash) = self.recent_blocks.pop_back() {
                buf.push(blkhash);
            }
            self.next_height -= 1;
        }

        Ok(buf)
    }

    /// Iterates over the blocks back from the tip, giving both the height and
    /// the blockhash to compare against the chain.
    pub fn iter_blocks_back(&self) -> impl Iterator<Item = (u64, &B256)> {
        let next = self.next_height;
        self.recent_blocks
            .iter()
            .rev()
            .enumerate()
            .map(move |(i, b)| (next - 1 - i as u64, b))
    }
}
