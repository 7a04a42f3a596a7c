use std::{sync::Arc, time::Duration};

use alloy_primitives::U256;
use altda_config::WatcherConfig;
use altda_contract::ContractEvent;
use altda_l1_watcher::{watcher_task, WatcherEvent, WatcherStatus};
use altda_primitives::prelude::*;
use altda_test_utils::{fixtures::*, L1Harness, MockL1Chain};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;

struct Running {
    events: mpsc::Receiver<WatcherEvent>,
    status: watch::Receiver<WatcherStatus>,
    cancel: CancellationToken,
    task: JoinHandle<anyhow::Result<()>>,
}

fn test_config() -> WatcherConfig {
    let mut config = WatcherConfig::new("http://unused".to_owned());
    config.poll_interval_ms = 10;
    config.retry_base_delay_ms = 1;
    config.max_reorg_depth = 8;
    config
}

fn spawn_watcher(chain: MockL1Chain, start_height: u64, config: WatcherConfig) -> Running {
    altda_common::logging::init_test();
    let (event_tx, events) = mpsc::channel(16);
    let (status_tx, status) = watch::channel(WatcherStatus::default());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(watcher_task(
        chain,
        event_tx,
        start_height,
        CHALLENGE_CONTRACT,
        Arc::new(config),
        status_tx,
        cancel.clone(),
    ));
    Running {
        events,
        status,
        cancel,
        task,
    }
}

async fn next_event(r: &mut Running) -> WatcherEvent {
    timeout(Duration::from_secs(5), r.events.recv())
        .await
        .expect("test: timed out waiting for watcher")
        .expect("test: watcher exited")
}

async fn next_block(r: &mut Running) -> L1BlockRef {
    match next_event(r).await {
        WatcherEvent::Block(data) => data.block_ref,
        ev => panic!("test: expected block, got {ev:?}"),
    }
}

#[tokio::test]
async fn test_follows_chain_in_order() {
    let chain = MockL1Chain::new();
    chain.push_empty(5);

    let mut r = spawn_watcher(chain.clone(), 1, test_config());
    for expected in 1..=5 {
        let block = next_block(&mut r).await;
        assert_eq!(block.number, expected);
        assert_eq!(Some(block.hash), chain.block(expected).map(|b| b.hash));
    }

    chain.push_empty(1);
    assert_eq!(next_block(&mut r).await.number, 6);
    assert_eq!(*r.status.borrow(), WatcherStatus::Following);

    r.cancel.cancel();
    r.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_respects_confirmation_depth() {
    let chain = MockL1Chain::new();
    chain.push_empty(5);

    let mut config = test_config();
    config.confirmation_depth = 2;
    let mut r = spawn_watcher(chain.clone(), 1, config);

    for expected in 1..=3 {
        assert_eq!(next_block(&mut r).await.number, expected);
    }
    assert!(timeout(Duration::from_millis(100), r.events.recv())
        .await
        .is_err());

    chain.push_empty(1);
    assert_eq!(next_block(&mut r).await.number, 4);

    r.cancel.cancel();
    r.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_rewinds_on_reorg() {
    let chain = MockL1Chain::new();
    chain.push_empty(5);

    let mut r = spawn_watcher(chain.clone(), 1, test_config());
    for expected in 1..=5 {
        assert_eq!(next_block(&mut r).await.number, expected);
    }

    chain.reorg_to(3);
    chain.push_empty(3);

    assert_eq!(next_event(&mut r).await, WatcherEvent::Rewind(3));
    for expected in 4..=6 {
        let block = next_block(&mut r).await;
        assert_eq!(block.number, expected);
        assert_eq!(Some(block.hash), chain.block(expected).map(|b| b.hash));
    }

    r.cancel.cancel();
    r.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_survives_transient_failures() {
    let chain = MockL1Chain::new();
    chain.push_empty(2);
    chain.fail_next_calls(3);

    let mut r = spawn_watcher(chain.clone(), 1, test_config());
    assert_eq!(next_block(&mut r).await.number, 1);
    assert_eq!(next_block(&mut r).await.number, 2);
    assert!(chain.calls() > 3);

    r.cancel.cancel();
    r.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_rejects_start_above_head() {
    let chain = MockL1Chain::new();
    chain.push_empty(2);

    let r = spawn_watcher(chain, 10, test_config());
    assert!(r.task.await.unwrap().is_err());
}

#[tokio::test]
async fn test_exits_when_driver_gone() {
    let chain = MockL1Chain::new();
    chain.push_empty(2);

    let r = spawn_watcher(chain, 1, test_config());
    drop(r.events);
    assert!(r.task.await.unwrap().is_err());
}

#[tokio::test]
async fn test_delivers_contract_activity() {
    let mut h = L1Harness::new(&test_params());
    let key = h.commit(b"hello");
    h.mine();
    h.challenge(CHALLENGER, &key, U256::from(1000)).unwrap();
    h.mine();
    h.resolve(RESOLVER, &key, b"hello").unwrap();
    h.mine();

    let mut r = spawn_watcher(h.chain(), 1, test_config());

    let WatcherEvent::Block(commit) = next_event(&mut r).await else {
        panic!("test: expected block");
    };
    assert!(commit.events.is_empty());

    let WatcherEvent::Block(challenge) = next_event(&mut r).await else {
        panic!("test: expected block");
    };
    assert!(challenge
        .events
        .contains(&ContractEvent::ChallengeStatusChanged {
            key,
            status: ChallengeStatus::Active,
        }));
    assert!(challenge.resolve_calls.is_empty());

    let WatcherEvent::Block(resolve) = next_event(&mut r).await else {
        panic!("test: expected block");
    };
    assert_eq!(
        resolve.events[0],
        ContractEvent::ChallengeStatusChanged {
            key,
            status: ChallengeStatus::Resolved,
        }
    );
    assert_eq!(resolve.resolve_calls.len(), 1);
    assert_eq!(resolve.resolve_calls[0].key, key);
    assert_eq!(&resolve.resolve_calls[0].preimage[..], b"hello");

    r.cancel.cancel();
    r.task.await.unwrap().unwrap();
}
