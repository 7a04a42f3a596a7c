//! Driver task, the only owner of the manager state.
//!
//! L1 events from the watcher and requests from handles are processed one at
//! a time, so nothing in the manager needs locking.
//!
//! Pipeline signals are sent on a bounded channel and never dropped. If
//! derivation stops draining it the driver stops too, including answering
//! handle requests, so the pipeline must not wait on a [`DriverHandle`]
//! reply without also polling its signal receiver.
//!
//! [`DriverHandle`]: crate::handle::DriverHandle

use altda_l1_watcher::WatcherEvent;
use anyhow::anyhow;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    errors::ManagerError,
    handle::DriverInput,
    manager::DaManager,
    message::{DriverMessage, PipelineSignal, ResetReason},
};

pub async fn driver_task(
    mut manager: DaManager,
    mut input: DriverInput,
    mut watcher_rx: mpsc::Receiver<WatcherEvent>,
    signal_tx: mpsc::Sender<PipelineSignal>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    info!(head = manager.l1_head(), "started Alt-DA driver task");

    let res = loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Alt-DA driver canceled");
                break Ok(());
            }

            // L1 first, so requests see the newest statuses.
            ev = watcher_rx.recv() => {
                let Some(ev) = ev else {
                    break Err(anyhow!("L1 watcher exited"));
                };
                if let Err(e) = handle_watcher_event(&mut manager, ev, &signal_tx).await {
                    break Err(e);
                }
            }

            msg = input.recv_next() => {
                let Some(msg) = msg else {
                    info!("all driver handles dropped, exiting");
                    break Ok(());
                };
                handle_message(&mut manager, msg).await;
            }
        }
    };

    if let Err(e) = &res {
        error!(err = %e, "Alt-DA driver task exited");
    }
    res
}

async fn handle_watcher_event(
    manager: &mut DaManager,
    ev: WatcherEvent,
    signal_tx: &mpsc::Sender<PipelineSignal>,
) -> anyhow::Result<()> {
    match ev {
        WatcherEvent::Block(data) => {
            let height = data.number();
            trace!(%height, events = data.events.len(), "processing L1 block");

            let outcome = manager.on_l1_block(&data);
            let reasons = outcome
                .expired
                .into_iter()
                .map(ResetReason::ExpiredCommitment)
                .chain(
                    outcome
                        .unexpected
                        .into_iter()
                        .map(ResetReason::UnexpectedTransition),
                );
            for reason in reasons {
                info!(%height, %reason, "requesting pipeline reset");
                send_signal(signal_tx, PipelineSignal::Reset(reason)).await?;
            }
        }

        WatcherEvent::Rewind(new_head) => {
            let changed = manager.on_l1_rewind(new_head);
            if !changed.is_empty() {
                info!(%new_head, changed = changed.len(), "signaling pipeline reorg");
                send_signal(signal_tx, PipelineSignal::Reorg(new_head)).await?;
            }
        }
    }

    Ok(())
}

async fn send_signal(
    signal_tx: &mpsc::Sender<PipelineSignal>,
    signal: PipelineSignal,
) -> anyhow::Result<()> {
    let signal = match signal_tx.try_send(signal) {
        Ok(()) => return Ok(()),
        Err(TrySendError::Full(signal)) => signal,
        Err(TrySendError::Closed(_)) => {
            return Err(anyhow!("derivation pipeline dropped signal channel"));
        }
    };

    warn!(?signal, "pipeline signal channel full, blocking until drained");
    signal_tx
        .send(signal)
        .await
        .map_err(|_| anyhow!("derivation pipeline dropped signal channel"))
}

async fn handle_message(manager: &mut DaManager, msg: DriverMessage) {
    match msg {
        DriverMessage::GetInput(key, cancel, completion) => {
            let res = manager.get_input(key, &cancel).await;
            if let Err(ManagerError::Canceled) = &res {
                debug!(%key, "input request canceled");
            }
            let _ = completion.send(res);
        }

        DriverMessage::Finalized(candidate, completion) => {
            let _ = completion.send(Ok(manager.finalized(candidate)));
        }

        DriverMessage::OnL1Finalized(l1_finalized, completion) => {
            let _ = completion.send(Ok(manager.on_l1_finalized(l1_finalized)));
        }

        DriverMessage::AdvanceDerivationOrigin(l1_block, completion) => {
            manager.advance_derivation_origin(l1_block);
            let _ = completion.send(Ok(()));
        }

        DriverMessage::Status(completion) => {
            let _ = completion.send(Ok(manager.status()));
        }

        DriverMessage::ResetDerivation(completion) => {
            manager.reset_derivation();
            let _ = completion.send(Ok(()));
        }
    }
}
