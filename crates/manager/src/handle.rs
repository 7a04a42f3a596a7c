use altda_primitives::prelude::*;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::{ManagerError, ManagerResult},
    input::InputStatus,
    manager::ManagerStatus,
    message::DriverMessage,
};

/// Creates a connected handle and driver input.
pub fn driver_channel(capacity: usize) -> (DriverHandle, DriverInput) {
    let (msg_tx, msg_rx) = mpsc::channel(capacity);
    (DriverHandle { msg_tx }, DriverInput { msg_rx })
}

/// Handle to talk to the driver task. Cheap to clone.
#[derive(Clone, Debug)]
pub struct DriverHandle {
    msg_tx: mpsc::Sender<DriverMessage>,
}

impl DriverHandle {
    /// Low-level caller to dispatch work to the driver task.
    async fn send_and_wait<R>(
        &self,
        make_fn: impl FnOnce(oneshot::Sender<ManagerResult<R>>) -> DriverMessage,
    ) -> ManagerResult<R> {
        // Construct the message with the lambda.
        let (completion_tx, completion_rx) = oneshot::channel();
        let msg = make_fn(completion_tx);

        // Then send it and wait for a response.
        if self.msg_tx.send(msg).await.is_err() {
            return Err(ManagerError::WorkerExited);
        }

        match completion_rx.await {
            Ok(r) => r,
            Err(_) => Err(ManagerError::WorkerExited),
        }
    }

    /// Asks for the input behind a commitment. Returns
    /// [`ManagerError::Canceled`] if `cancel` fires before it's known.
    pub async fn get_input(
        &self,
        key: CommitmentKey,
        cancel: CancellationToken,
    ) -> ManagerResult<InputStatus> {
        self.send_and_wait(|tx| DriverMessage::GetInput(key, cancel, tx))
            .await
    }

    pub async fn finalized(&self, candidate: u64) -> ManagerResult<bool> {
        self.send_and_wait(|tx| DriverMessage::Finalized(candidate, tx))
            .await
    }

    /// Reports a new finalized L1 head, returning how far L2 can be
    /// finalized.
    pub async fn on_l1_finalized(&self, l1_finalized: u64) -> ManagerResult<u64> {
        self.send_and_wait(|tx| DriverMessage::OnL1Finalized(l1_finalized, tx))
            .await
    }

    /// Tells the driver derivation has read every commitment included up to
    /// `l1_block`. Finality never gets ahead of this.
    pub async fn advance_derivation_origin(&self, l1_block: u64) -> ManagerResult<()> {
        self.send_and_wait(|tx| DriverMessage::AdvanceDerivationOrigin(l1_block, tx))
            .await
    }

    pub async fn status(&self) -> ManagerResult<ManagerStatus> {
        self.send_and_wait(DriverMessage::Status).await
    }

    pub async fn reset_derivation(&self) -> ManagerResult<()> {
        self.send_and_wait(DriverMessage::ResetDerivation).await
    }
}

/// Input to the driver, reading requests from the handles.
pub struct DriverInput {
    msg_rx: mpsc::Receiver<DriverMessage>,
}

impl DriverInput {
    pub(crate) async fn recv_next(&mut self) -> Option<DriverMessage> {
        self.msg_rx.recv().await
    }
}
