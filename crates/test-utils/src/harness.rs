//! Drives a [`ChallengeContract`] mirror and records its calls as
//! transactions in a [`MockL1Chain`], the way they would land on L1.

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Address, Bytes, U256};
use altda_contract::{abi, CallContext, ChallengeContract, ContractResult};
use altda_l1_watcher::{L1Block, L1Transaction};
use altda_primitives::prelude::*;

use crate::{fixtures, l1::MockL1Chain};

pub struct L1Harness {
    chain: MockL1Chain,
    contract: ChallengeContract,

    /// Contract state as of the end of each mined block, for reorgs.
    snapshots: BTreeMap<u64, ChallengeContract>,

    /// Transactions for the block being built.
    pending: Vec<L1Transaction>,

    base_fee: U256,
    nonce: u64,
}

impl L1Harness {
    pub fn new(params: &AltDaParams) -> Self {
        let contract = ChallengeContract::from_altda_params(params, fixtures::OWNER)
            .expect("test: invalid contract params");
        let mut snapshots = BTreeMap::new();
        snapshots.insert(0, contract.clone());
        Self {
            chain: MockL1Chain::new(),
            contract,
            snapshots,
            pending: Vec::new(),
            base_fee: U256::from(1),
            nonce: 0,
        }
    }

    /// Handle to the chain, for the watcher to poll.
    pub fn chain(&self) -> MockL1Chain {
        self.chain.clone()
    }

    pub fn contract(&self) -> &ChallengeContract {
        &self.contract
    }

    pub fn head(&self) -> u64 {
        self.chain.head()
    }

    /// Height of the block pending transactions will be mined in.
    pub fn next_block(&self) -> u64 {
        self.head() + 1
    }

    pub fn set_base_fee(&mut self, base_fee: U256) {
        self.base_fee = base_fee;
    }

    fn ctx(&self, caller: Address, value: U256) -> CallContext {
        CallContext::new(caller, self.next_block())
            .with_value(value)
            .with_base_fee(self.base_fee)
    }

    fn push_tx(&mut self, to: Address, input: Bytes, success: bool) {
        self.nonce += 1;
        let logs = self
            .contract
            .take_events()
            .iter()
            .map(|ev| ev.to_log(self.contract.address()))
            .collect();
        self.pending.push(L1Transaction {
            hash: keccak256(self.nonce.to_be_bytes()),
            to: Some(to),
            input,
            success,
            logs: if success { logs } else { Vec::new() },
        });
    }

    fn push_call(&mut self, input: Bytes, res: &ContractResult<()>) {
        self.push_tx(self.contract.address(), input, res.is_ok());
    }

    /// Posts a batcher transaction carrying the commitment to `preimage`.
    /// Returns its key, included in the next block.
    pub fn commit(&mut self, preimage: &[u8]) -> CommitmentKey {
        let key = fixtures::keccak_key(self.next_block(), preimage);
        self.push_tx(fixtures::BATCH_INBOX, key.commitment.tx_data(), true);
        key
    }

    pub fn deposit(&mut self, from: Address, value: U256) -> ContractResult<()> {
        let ctx = self.ctx(from, value);
        let res = self.contract.deposit(&ctx);
        self.push_call(abi::deposit_calldata(), &res);
        res
    }

    /// Withdraws, with the recipient accepting the transfer if `accept`.
    pub fn withdraw(&mut self, from: Address, accept: bool) -> ContractResult<()> {
        let ctx = self.ctx(from, U256::ZERO);
        let res = self
            .contract
            .withdraw(&ctx, &mut |_: Address, _: U256| accept);
        self.push_call(abi::withdraw_calldata(), &res);
        res
    }

    pub fn challenge(
        &mut self,
        from: Address,
        key: &CommitmentKey,
        value: U256,
    ) -> ContractResult<()> {
        let ctx = self.ctx(from, value);
        let res = self.contract.challenge(
            &ctx,
            key.l1_inclusion_block,
            &key.commitment.encode(),
        );
        self.push_call(abi::challenge_calldata(key), &res);
        res
    }

    pub fn resolve(
        &mut self,
        from: Address,
        key: &CommitmentKey,
        preimage: &[u8],
    ) -> ContractResult<()> {
        let ctx = self.ctx(from, U256::ZERO);
        let res = self.contract.resolve(
            &ctx,
            key.l1_inclusion_block,
            &key.commitment.encode(),
            preimage,
        );
        self.push_call(abi::resolve_calldata(key, preimage), &res);
        res
    }

    pub fn unlock_bond(&mut self, from: Address, key: &CommitmentKey) -> ContractResult<()> {
        let ctx = self.ctx(from, U256::ZERO);
        let res =
            self.contract
                .unlock_bond(&ctx, key.l1_inclusion_block, &key.commitment.encode());
        self.push_call(abi::unlock_bond_calldata(key), &res);
        res
    }

    /// Mines the pending transactions into a new block.
    pub fn mine(&mut self) -> L1Block {
        let txs = std::mem::take(&mut self.pending);
        let block_ref = self.chain.push_block(txs);
        self.snapshots.insert(block_ref.number, self.contract.clone());
        self.chain
            .block(block_ref.number)
            .expect("test: block just mined")
    }

    /// Mines blocks until the tip is at `height`. The first one carries any
    /// pending transactions.
    pub fn mine_until(&mut self, height: u64) {
        while self.head() < height {
            self.mine();
        }
    }

    /// Reorgs the chain back to `height`, restoring the contract state as of
    /// that block. Pending transactions are dropped.
    pub fn reorg_to(&mut self, height: u64) {
        self.chain.reorg_to(height);
        self.contract = self
            .snapshots
            .get(&height)
            .cloned()
            .expect("test: no snapshot at reorg height");
        self.snapshots.retain(|h, _| *h <= height);
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use altda_contract::{abi::decode_log, ContractError, ContractEvent};

    use super::*;
    use crate::fixtures::*;

    #[test]
    fn test_calls_become_logs() {
        let mut h = L1Harness::new(&test_params());
        h.mine_until(99);

        let key = h.commit(b"hello");
        assert_eq!(key.l1_inclusion_block, 100);
        h.mine();

        h.challenge(CHALLENGER, &key, U256::from(1000)).unwrap();
        let block = h.mine();
        assert_eq!(block.number, 101);

        let tx = &block.transactions[0];
        assert!(tx.success);
        assert_eq!(tx.to, Some(CHALLENGE_CONTRACT));
        let events: Vec<_> = tx
            .logs
            .iter()
            .map(|l| decode_log(l).unwrap().unwrap())
            .collect();
        assert_eq!(
            events.last(),
            Some(&ContractEvent::ChallengeStatusChanged {
                key,
                status: ChallengeStatus::Active,
            })
        );
    }

    #[test]
    fn test_failed_call_has_no_logs() {
        let mut h = L1Harness::new(&test_params());
        let key = h.commit(b"hello");
        h.mine();

        let res = h.challenge(CHALLENGER, &key, U256::from(10));
        assert!(matches!(res, Err(ContractError::BondTooLow { .. })));
        let block = h.mine();
        assert!(!block.transactions[0].success);
        assert!(block.transactions[0].logs.is_empty());
    }

    #[test]
    fn test_reorg_restores_contract() {
        let mut h = L1Harness::new(&test_params());
        let key = h.commit(b"hello");
        h.mine();
        h.challenge(CHALLENGER, &key, U256::from(1000)).unwrap();
        h.mine();
        h.mine();
        let old_hash = h.chain().block(2).unwrap().hash;

        h.reorg_to(1);
        assert_eq!(h.head(), 1);
        assert!(h.contract().challenge_of(&key).is_none());

        h.mine();
        assert_ne!(h.chain().block(2).unwrap().hash, old_hash);
    }
}
