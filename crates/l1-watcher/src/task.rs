use std::{collections::VecDeque, sync::Arc, time::Duration};

use alloy_primitives::{Address, B256};
use altda_common::retry::{policies::ExponentialBackoff, retry_with_backoff_async};
use altda_config::WatcherConfig;
use anyhow::bail;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    errors::WatcherError,
    filter::extract_block_data,
    messages::{WatcherEvent, WatcherStatus},
    state::ReaderState,
    traits::L1Client,
};

/// Context shared by the functions of a single watcher task.
struct WatcherCtx<'a, C> {
    client: &'a C,
    event_tx: &'a mpsc::Sender<WatcherEvent>,
    status_tx: &'a watch::Sender<WatcherStatus>,
    contract: Address,
    config: &'a WatcherConfig,
    backoff: ExponentialBackoff,
}

impl<C: L1Client> WatcherCtx<'_, C> {
    async fn chain_head(&self) -> anyhow::Result<u64> {
        retry_with_backoff_async("eth_blockNumber", self.config.retry_count, &self.backoff, || {
            self.client.get_chain_head()
        })
        .await
    }

    async fn block_hash(&self, height: u64) -> anyhow::Result<Option<B256>> {
        retry_with_backoff_async("get_block_hash", self.config.retry_count, &self.backoff, || {
            self.client.get_block_hash(height)
        })
        .await
    }

    fn set_status(&self, status: WatcherStatus) {
        self.status_tx.send_if_modified(|cur| {
            let changed = *cur != status;
            *cur = status;
            changed
        });
    }
}

/// Follows the L1 chain from `start_height`, sending contract activity of
/// every block to `event_tx` in chain order.
///
/// Runs until canceled or until the receiver goes away. Transient RPC errors
/// are retried and then skipped until the next poll.
pub async fn watcher_task(
    client: impl L1Client,
    event_tx: mpsc::Sender<WatcherEvent>,
    start_height: u64,
    contract: Address,
    config: Arc<WatcherConfig>,
    status_tx: watch::Sender<WatcherStatus>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let ctx = WatcherCtx {
        client: &client,
        event_tx: &event_tx,
        status_tx: &status_tx,
        contract,
        config: &config,
        backoff: ExponentialBackoff::new(config.retry_base_delay_ms, 2, 1),
    };

    let res = tokio::select! {
        res = do_watcher_task(&ctx, start_height) => res,
        _ = cancel.cancelled() => {
            info!("L1 watcher canceled");
            Ok(())
        }
    };

    if let Err(e) = &res {
        error!(err = %e, "L1 watcher task exited");
    }
    res
}

async fn do_watcher_task<C: L1Client>(
    ctx: &WatcherCtx<'_, C>,
    start_height: u64,
) -> anyhow::Result<()> {
    info!(%start_height, contract = %ctx.contract, "started L1 watcher task");

    let poll_dur = Duration::from_millis(ctx.config.poll_interval_ms);
    let lookback = (ctx.config.max_reorg_depth as usize).max(1);
    let mut state = init_reader_state(ctx, start_height, lookback).await?;
    debug!(next_height = %state.next_height(), "initialized L1 watcher state");

    loop {
        let next_height = state.next_height();
        let poll_span = debug_span!("l1poll", %next_height);

        if let Err(err) = poll_for_new_blocks(ctx, &mut state)
            .instrument(poll_span)
            .await
        {
            // Nothing we can recover from by polling again.
            if err.downcast_ref::<WatcherError>().is_some() {
                return Err(err);
            }
            warn!(%next_height, err = %err, "failed to poll L1 client");
        }

        tokio::time::sleep(poll_dur).await;
    }
}

/// Inits the reader state by backfilling the hashes of the blocks just below
/// `start_height`, so a reorg right after startup can still be detected.
async fn init_reader_state<C: L1Client>(
    ctx: &WatcherCtx<'_, C>,
    start_height: u64,
    lookback: usize,
) -> anyhow::Result<ReaderState> {
    let head = ctx.chain_head().await?;
    if start_height > head + 1 {
        bail!("start height {start_height} above chain head {head}");
    }

    let mut init_queue = VecDeque::new();
    let backfill_start = start_height.saturating_sub(lookback as u64);
    for height in backfill_start..start_height {
        let Some(blkid) = ctx.block_hash(height).await? else {
            bail!("missing L1 block {height} below head {head}");
        };
        trace!(%height, %blkid, "loaded recent L1 block");
        init_queue.push_back(blkid);
    }

    Ok(ReaderState::new(start_height, lookback, init_queue))
}

/// Polls the chain to see if there's new blocks to look at, rewinding first
/// if the last block we delivered is no longer canonical.
async fn poll_for_new_blocks<C: L1Client>(
    ctx: &WatcherCtx<'_, C>,
    state: &mut ReaderState,
) -> anyhow::Result<()> {
    let client_height = ctx.chain_head().await?;

    if let Some(best_idx) = state.best_block_idx() {
        let canonical = ctx.block_hash(best_idx).await?;
        if canonical.as_ref() != state.best_block() {
            ctx.set_status(WatcherStatus::Rewinding);

            let Some((pivot_height, pivot_blkid)) = find_pivot_block(ctx, state).await? else {
                error!("unable to find common block with client chain");
                return Err(WatcherError::NoCommonAncestor.into());
            };

            info!(%pivot_height, %pivot_blkid, "found apparent reorg");
            state.rollback_to_height(pivot_height)?;
            if ctx
                .event_tx
                .send(WatcherEvent::Rewind(pivot_height))
                .await
                .is_err()
            {
                return Err(WatcherError::ReceiverDropped.into());
            }
        }
    }

    ctx.set_status(WatcherStatus::Following);

    let target = client_height.saturating_sub(ctx.config.confirmation_depth);
    if target < state.next_height() {
        trace!(%client_height, %target, "polled client, nothing to do");
        return Ok(());
    }

    debug!(%client_height, %target, "have new blocks");

    for fetch_height in state.next_height()..=target {
        let blkid = match fetch_and_process_block(ctx, state, fetch_height).await {
            Ok(Some(b)) => b,
            Ok(None) => break,
            Err(e) => {
                if e.downcast_ref::<WatcherError>().is_some() {
                    return Err(e);
                }
                warn!(%fetch_height, err = %e, "failed to fetch new block");
                break;
            }
        };
        info!(%fetch_height, %blkid, "accepted new block");
    }

    Ok(())
}

/// Finds the highest block index where we do agree with the node.
async fn find_pivot_block<C: L1Client>(
    ctx: &WatcherCtx<'_, C>,
    state: &ReaderState,
) -> anyhow::Result<Option<(u64, B256)>> {
    for (height, blkid) in state.iter_blocks_back() {
        // If at genesis, we can't reorg any farther.
        if height == 0 {
            return Ok(Some((height, *blkid)));
        }

        let queried_blkid = ctx.block_hash(height).await?;
        trace!(%height, %blkid, ?queried_blkid, "comparing blocks to find pivot");
        if queried_blkid.as_ref() == Some(blkid) {
            return Ok(Some((height, *blkid)));
        }
    }

    Ok(None)
}

/// Fetches a block and hands its contract activity to the driver. Returns
/// `None` if the block doesn't build on our tip, in which case the chain
/// changed under us and the next poll rewinds.
async fn fetch_and_process_block<C: L1Client>(
    ctx: &WatcherCtx<'_, C>,
    state: &mut ReaderState,
    height: u64,
) -> anyhow::Result<Option<B256>> {
    let block = retry_with_backoff_async("get_block_at", ctx.config.retry_count, &ctx.backoff, || {
        ctx.client.get_block_at(height)
    })
    .await?;

    if let Some(best) = state.best_block() {
        if block.parent_hash != *best {
            warn!(%height, parent = %block.parent_hash, tip = %best, "new block does not extend tip");
            return Ok(None);
        }
    }

    let data = extract_block_data(&block, ctx.contract);
    if ctx.event_tx.send(WatcherEvent::Block(data)).await.is_err() {
        error!("failed to submit L1 block event, did the driver exit?");
        return Err(WatcherError::ReceiverDropped.into());
    }

    state.accept_new_block(block.hash);
    Ok(Some(block.hash))
}
