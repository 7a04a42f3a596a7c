//! Wires the watcher and driver tasks together.

use std::{sync::Arc, time::Duration};

use altda_config::{Config, WatcherConfig};
use altda_l1_watcher::{rpc::RpcL1Client, watcher_task, L1Client, WatcherStatus};
use altda_primitives::prelude::*;
use altda_storage_client::{HttpStorageClient, StorageClient};
use anyhow::Context;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    driver::driver_task,
    handle::{driver_channel, DriverHandle},
    manager::DaManager,
    message::PipelineSignal,
};

const HANDLE_CHANNEL_CAPACITY: usize = 64;

/// Running Alt-DA tasks and the ends derivation talks to.
pub struct AltDaTasks {
    pub handle: DriverHandle,

    /// Must be drained, the driver blocks while it's full.
    pub signals: mpsc::Receiver<PipelineSignal>,
    pub watcher_status: watch::Receiver<WatcherStatus>,
    pub watcher: JoinHandle<anyhow::Result<()>>,
    pub driver: JoinHandle<anyhow::Result<()>>,
}

/// Spawns the watcher and driver on the current runtime, following L1 from
/// `start_height`.
pub fn spawn_altda(
    params: AltDaParams,
    l1_client: impl L1Client,
    storage: Arc<dyn StorageClient>,
    watcher_config: Arc<WatcherConfig>,
    fetch_timeout: Duration,
    start_height: u64,
    cancel: CancellationToken,
) -> anyhow::Result<AltDaTasks> {
    let contract = params.challenge_contract;
    let manager = DaManager::new(params, storage, fetch_timeout)?;

    let (event_tx, event_rx) = mpsc::channel(watcher_config.channel_capacity);
    let (signal_tx, signals) = mpsc::channel(watcher_config.channel_capacity);
    let (status_tx, watcher_status) = watch::channel(WatcherStatus::default());
    let (handle, input) = driver_channel(HANDLE_CHANNEL_CAPACITY);

    let watcher = tokio::spawn(watcher_task(
        l1_client,
        event_tx,
        start_height,
        contract,
        watcher_config,
        status_tx,
        cancel.clone(),
    ));
    let driver = tokio::spawn(driver_task(manager, input, event_rx, signal_tx, cancel));

    Ok(AltDaTasks {
        handle,
        signals,
        watcher_status,
        watcher,
        driver,
    })
}

/// Like [`spawn_altda`], with the JSON-RPC L1 client and HTTP storage
/// client built from `config`.
pub fn spawn_altda_from_config(
    config: &Config,
    start_height: u64,
    cancel: CancellationToken,
) -> anyhow::Result<AltDaTasks> {
    let params = config.altda.to_params()?;
    let l1_client = RpcL1Client::new(&config.watcher.rpc_url)?;
    let storage = HttpStorageClient::new(&config.storage.url, params.commitment_type)
        .context("failed to build storage client")?;

    spawn_altda(
        params,
        l1_client,
        Arc::new(storage),
        Arc::new(config.watcher.clone()),
        Duration::from_millis(config.storage.fetch_timeout_ms),
        start_height,
        cancel,
    )
}
