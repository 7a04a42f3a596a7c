//! End-to-end challenge scenarios with 16 block windows, a bond of 1000 and
//! a 50% resolver refund.

use std::{sync::Arc, time::Duration};

use alloy_primitives::{Bytes, U256};
use altda_contract::{ContractError, ContractEvent};
use altda_l1_watcher::{filter::extract_block_data, L1BlockData};
use altda_manager::{DaManager, DriverEvent, InputStatus, L1BlockOutcome, NotReadyReason};
use altda_primitives::prelude::*;
use altda_storage_client::{MemoryStorageClient, StorageClient};
use altda_test_utils::{fixtures::*, L1Harness};
use tokio_util::sync::CancellationToken;

struct World {
    l1: L1Harness,
    storage: Arc<MemoryStorageClient>,
    mgr: DaManager,

    /// Last L1 block handed to the manager.
    synced: u64,
}

impl World {
    fn new() -> Self {
        altda_common::logging::init_test();
        let storage = Arc::new(MemoryStorageClient::new(CommitmentType::Keccak256));
        Self {
            l1: L1Harness::new(&test_params()),
            mgr: new_manager(storage.clone()),
            storage,
            synced: 0,
        }
    }

    fn block_data(&self, number: u64) -> L1BlockData {
        let block = self.l1.chain().block(number).expect("test: missing block");
        extract_block_data(&block, CHALLENGE_CONTRACT)
    }

    /// Feeds every mined block the manager hasn't seen.
    fn sync(&mut self) -> Vec<L1BlockOutcome> {
        let head = self.l1.head();
        let outcomes = (self.synced + 1..=head)
            .map(|n| {
                let data = self.block_data(n);
                self.mgr.on_l1_block(&data)
            })
            .collect();
        self.synced = head;
        outcomes
    }

    fn reorg_to(&mut self, height: u64) -> Vec<CommitmentKey> {
        self.l1.reorg_to(height);
        self.synced = height;
        self.mgr.on_l1_rewind(height)
    }

    async fn get_input(&mut self, key: CommitmentKey) -> InputStatus {
        self.mgr
            .get_input(key, &CancellationToken::new())
            .await
            .expect("test: get_input failed")
    }
}

fn new_manager(storage: Arc<dyn StorageClient>) -> DaManager {
    DaManager::new(test_params(), storage, Duration::from_secs(1)).unwrap()
}

fn no_resets(outcomes: &[L1BlockOutcome]) -> bool {
    outcomes.iter().all(|o| !o.needs_reset())
}

fn ready(data: &'static [u8]) -> InputStatus {
    InputStatus::Ready(Bytes::from_static(data))
}

/// Posts `preimage` at L1 block 100.
fn commit_at_100(w: &mut World, preimage: &[u8]) -> CommitmentKey {
    w.l1.mine_until(99);
    let key = w.l1.commit(preimage);
    w.l1.mine();
    assert_eq!(key.l1_inclusion_block, 100);
    key
}

#[tokio::test]
async fn test_challenge_expired_reorgs_l2() {
    let mut w = World::new();
    w.storage.set(b"hello").await.unwrap();
    let key = commit_at_100(&mut w, b"hello");
    w.sync();

    // The sequencer builds on it.
    assert_eq!(w.get_input(key).await, ready(b"hello"));

    w.l1.challenge(CHALLENGER, &key, U256::from(1000)).unwrap();
    w.l1.mine();
    assert!(no_resets(&w.sync()));
    assert_eq!(
        w.get_input(key).await,
        InputStatus::NotReady(NotReadyReason::ChallengeActive)
    );

    // Last block of the resolve window, the bond is still locked.
    w.l1.mine_until(116);
    assert_eq!(
        w.l1.unlock_bond(CHALLENGER, &key),
        Err(ContractError::ChallengeNotExpired)
    );
    w.l1.mine();
    assert!(no_resets(&w.sync()));

    w.l1.unlock_bond(CHALLENGER, &key).unwrap();
    w.l1.mine();
    assert_eq!(w.l1.head(), 118);
    assert_eq!(w.l1.contract().balance_of(&CHALLENGER), U256::from(1000));

    let outcomes = w.sync();
    let expired: Vec<_> = outcomes.iter().flat_map(|o| o.expired.clone()).collect();
    assert_eq!(expired, vec![key]);
    assert_eq!(
        w.mgr.tracker().status(&key).unwrap().status,
        ChallengeStatus::Expired
    );
    assert_eq!(w.get_input(key).await, InputStatus::Unavailable);
    w.mgr.reset_derivation();

    // A verifier syncing from scratch makes the same call.
    let mut verifier = new_manager(w.storage.clone());
    for n in 1..=w.l1.head() {
        verifier.on_l1_block(&w.block_data(n));
    }
    assert_eq!(
        verifier
            .get_input(key, &CancellationToken::new())
            .await
            .unwrap(),
        InputStatus::Unavailable
    );

    w.l1.mine_until(140);
    w.sync();
    for n in 119..=140 {
        verifier.on_l1_block(&w.block_data(n));
    }

    // Nothing finalizes past what derivation has read.
    assert_eq!(w.mgr.on_l1_finalized(140), 99);
    w.mgr.advance_derivation_origin(140);
    verifier.advance_derivation_origin(140);
    let origin = w.mgr.on_l1_finalized(140);
    assert_eq!(origin, 124);
    assert_eq!(verifier.on_l1_finalized(140), origin);
    w.l1.contract().check_invariants().unwrap();
}

#[tokio::test]
async fn test_challenge_resolved() {
    let mut w = World::new();
    // Storage lost the data.
    let key = commit_at_100(&mut w, b"hello");

    w.l1.challenge(CHALLENGER, &key, U256::from(1000)).unwrap();
    w.l1.mine();
    w.l1.mine_until(107);
    w.l1.resolve(RESOLVER, &key, b"hello").unwrap();
    w.l1.mine();
    assert!(no_resets(&w.sync()));

    let tracked = w.mgr.tracker().status(&key).unwrap();
    assert_eq!(tracked.status, ChallengeStatus::Resolved);
    assert_eq!(tracked.resolve_data, Some(Bytes::from_static(b"hello")));
    assert_eq!(w.get_input(key).await, ready(b"hello"));

    // The fixed cost alone is worth more than the bond, so the resolver takes
    // all of it.
    let contract = w.l1.contract();
    assert_eq!(contract.balance_of(&RESOLVER), U256::from(1000));
    assert_eq!(contract.balance_of(&CHALLENGER), U256::ZERO);
    assert_eq!(w.mgr.balance_of(&RESOLVER), U256::from(1000));
    assert_eq!(w.mgr.balance_of(&CHALLENGER), U256::ZERO);
    contract.check_invariants().unwrap();
}

#[tokio::test]
async fn test_storage_offline_inside_window() {
    let mut w = World::new();
    w.storage.set(b"hello").await.unwrap();
    w.storage.set_offline(true);

    let key = commit_at_100(&mut w, b"hello");
    w.l1.mine_until(108);
    w.sync();

    let status = w.get_input(key).await;
    assert_eq!(
        status,
        InputStatus::NotReady(NotReadyReason::StorageUnavailable)
    );
    assert_eq!(DriverEvent::from(status), DriverEvent::WaitStorage);

    w.storage.set_offline(false);
    assert_eq!(w.get_input(key).await, ready(b"hello"));

    w.l1.mine_until(140);
    assert!(no_resets(&w.sync()));
    assert_eq!(w.get_input(key).await, ready(b"hello"));
}

#[tokio::test]
async fn test_l1_reorg_demotes_resolution() {
    let mut w = World::new();
    let key = commit_at_100(&mut w, b"hello");

    w.l1.challenge(CHALLENGER, &key, U256::from(1000)).unwrap();
    w.l1.mine();
    w.l1.mine_until(107);
    w.l1.resolve(RESOLVER, &key, b"hello").unwrap();
    w.l1.mine();
    w.sync();
    assert_eq!(w.get_input(key).await, ready(b"hello"));

    // The resolving block is gone.
    assert_eq!(w.reorg_to(106), vec![key]);
    assert_eq!(w.get_input(key).await, InputStatus::Reorg(106));
    assert_eq!(
        w.get_input(key).await,
        InputStatus::NotReady(NotReadyReason::ChallengeActive)
    );
    assert_eq!(w.mgr.tracker().status(&key).unwrap().resolve_data, None);

    // Nobody resolves again before the window runs out.
    w.l1.mine_until(117);
    assert!(no_resets(&w.sync()));
    w.l1.mine();
    let outcomes = w.sync();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].expired, vec![key]);
    assert_eq!(w.get_input(key).await, InputStatus::Unavailable);
}

#[tokio::test]
async fn test_multi_commitment_stall() {
    let mut w = World::new();
    let c1 = commit_at_100(&mut w, b"one");
    w.l1.mine_until(104);
    let c2 = w.l1.commit(b"two");
    w.l1.mine();
    assert_eq!(c2.l1_inclusion_block, 105);

    w.l1.challenge(CHALLENGER, &c2, U256::from(1000)).unwrap();
    w.l1.mine();
    w.l1.mine_until(109);
    w.l1.resolve(RESOLVER, &c2, b"two").unwrap();
    w.l1.mine();
    let mut outcomes = w.sync();

    let waiting = InputStatus::NotReady(NotReadyReason::AwaitingPossibleChallenge);
    assert_eq!(w.get_input(c1).await, waiting);
    assert_eq!(w.get_input(c2).await, ready(b"two"));

    w.l1.mine_until(114);
    outcomes.extend(w.sync());
    assert_eq!(w.get_input(c1).await, waiting);

    w.l1.challenge(CHALLENGER, &c1, U256::from(1000)).unwrap();
    w.l1.mine();
    outcomes.extend(w.sync());
    assert_eq!(
        w.get_input(c1).await,
        InputStatus::NotReady(NotReadyReason::ChallengeActive)
    );

    w.l1.resolve(RESOLVER, &c1, b"one").unwrap();
    w.l1.mine();
    assert_eq!(w.l1.head(), 116);
    outcomes.extend(w.sync());

    assert_eq!(w.get_input(c1).await, ready(b"one"));
    assert_eq!(w.get_input(c2).await, ready(b"two"));
    assert!(no_resets(&outcomes));
}

#[tokio::test]
async fn test_missing_commitment_lost_after_window() {
    let mut w = World::new();
    let key = commit_at_100(&mut w, b"one");

    w.l1.mine_until(116);
    w.sync();
    assert_eq!(
        w.get_input(key).await,
        InputStatus::NotReady(NotReadyReason::AwaitingPossibleChallenge)
    );

    w.l1.mine();
    w.sync();
    assert_eq!(w.get_input(key).await, InputStatus::Unavailable);
}

#[tokio::test]
async fn test_withdrawal_atomicity() {
    let mut w = World::new();
    w.l1.deposit(CHALLENGER, U256::from(2000)).unwrap();
    w.l1.mine();
    w.sync();
    assert_eq!(w.mgr.balance_of(&CHALLENGER), U256::from(2000));

    assert_eq!(
        w.l1.withdraw(CHALLENGER, false),
        Err(ContractError::WithdrawalFailed)
    );
    let failed = w.l1.mine();
    assert!(!failed.transactions[0].success);
    assert!(w.block_data(failed.number).events.is_empty());
    assert_eq!(w.l1.contract().balance_of(&CHALLENGER), U256::from(2000));
    assert_eq!(w.l1.contract().native_balance(), U256::from(2000));
    w.sync();
    assert_eq!(w.mgr.balance_of(&CHALLENGER), U256::from(2000));

    w.l1.withdraw(CHALLENGER, true).unwrap();
    let ok = w.l1.mine();
    let events = w.block_data(ok.number).events;
    assert_eq!(
        events,
        vec![ContractEvent::BalanceChanged {
            account: CHALLENGER,
            balance: U256::ZERO,
        }]
    );
    assert_eq!(w.l1.contract().balance_of(&CHALLENGER), U256::ZERO);
    assert_eq!(w.l1.contract().native_balance(), U256::ZERO);
    w.sync();
    assert_eq!(w.mgr.balance_of(&CHALLENGER), U256::ZERO);
    w.l1.contract().check_invariants().unwrap();
}
