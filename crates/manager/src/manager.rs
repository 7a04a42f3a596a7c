//! Single entry point derivation uses to turn commitments into inputs.

use std::{collections::HashSet, sync::Arc, time::Duration};

use alloy_primitives::{Address, U256};
use altda_contract::{mirror::BalanceMirror, ContractEvent, ContractParams};
use altda_l1_watcher::L1BlockData;
use altda_primitives::prelude::*;
use altda_storage_client::{StorageClient, StorageError};
use altda_tracker::{ChallengeTracker, UnexpectedTransition};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    errors::{ManagerError, ManagerResult},
    finality::FinalityGate,
    input::{InputStatus, NotReadyReason},
};

/// What processing an L1 block turned up that derivation has to react to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct L1BlockOutcome {
    /// Events the tracker refused to apply.
    pub unexpected: Vec<UnexpectedTransition>,

    /// Commitments derivation already consumed that have now expired.
    pub expired: Vec<CommitmentKey>,
}

impl L1BlockOutcome {
    /// Returns if derivation needs to be reset.
    pub fn needs_reset(&self) -> bool {
        !self.unexpected.is_empty() || !self.expired.is_empty()
    }
}

/// Snapshot of the manager's state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManagerStatus {
    pub l1_head: u64,
    pub l1_finalized: u64,
    pub derivation_origin: u64,
    pub tracked: usize,
    pub consumed: usize,
    pub contract_params: ContractParams,
}

pub struct DaManager {
    params: AltDaParams,

    /// Latest governance parameters seen on L1.
    contract_params: Arc<ContractParams>,

    tracker: ChallengeTracker,
    storage: Arc<dyn StorageClient>,
    fetch_timeout: Duration,

    /// Advisory only.
    balances: BalanceMirror,

    /// Commitments handed to derivation that could still expire.
    consumed: HashSet<CommitmentKey>,

    l1_finalized: u64,

    /// Highest L1 block whose commitments derivation has all handed to us.
    /// The watcher runs ahead of derivation, so the tracker alone can't tell
    /// which commitments exist below its head.
    derivation_origin: u64,

    /// Rewind height to report on the next `get_input`.
    pending_reorg: Option<u64>,
}

impl DaManager {
    pub fn new(
        params: AltDaParams,
        storage: Arc<dyn StorageClient>,
        fetch_timeout: Duration,
    ) -> ManagerResult<Self> {
        let contract_params = Arc::new(ContractParams::from_altda_params(&params)?);
        Ok(Self {
            tracker: ChallengeTracker::new(params.clone()),
            params,
            contract_params,
            storage,
            fetch_timeout,
            balances: BalanceMirror::new(),
            consumed: HashSet::new(),
            l1_finalized: 0,
            derivation_origin: 0,
            pending_reorg: None,
        })
    }

    pub fn params(&self) -> &AltDaParams {
        &self.params
    }

    pub fn contract_params(&self) -> &Arc<ContractParams> {
        &self.contract_params
    }

    pub fn tracker(&self) -> &ChallengeTracker {
        &self.tracker
    }

    pub fn l1_head(&self) -> u64 {
        self.tracker.head()
    }

    /// Contract balance of an account as last announced on L1.
    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.balance_of(account)
    }

    pub fn status(&self) -> ManagerStatus {
        ManagerStatus {
            l1_head: self.tracker.head(),
            l1_finalized: self.l1_finalized,
            derivation_origin: self.derivation_origin,
            tracked: self.tracker.len(),
            consumed: self.consumed.len(),
            contract_params: (*self.contract_params).clone(),
        }
    }

    /// Returns the input a commitment stands for, if it can be had yet.
    ///
    /// Only talks to storage for commitments nobody has challenged. If
    /// `cancel` fires during that fetch nothing is recorded.
    pub async fn get_input(
        &mut self,
        key: CommitmentKey,
        cancel: &CancellationToken,
    ) -> ManagerResult<InputStatus> {
        if let Some(height) = self.pending_reorg.take() {
            debug!(%key, %height, "reporting L1 rewind before input");
            return Ok(InputStatus::Reorg(height));
        }

        // Commitments are read in L1 order, everything below this one has
        // been asked about already.
        self.advance_derivation_origin(key.l1_inclusion_block.saturating_sub(1));

        if key.commitment.commitment_type() != self.params.commitment_type {
            warn!(%key, expected = %self.params.commitment_type, "skipping commitment of wrong type");
            return Ok(InputStatus::Unavailable);
        }

        let (status, resolve_data) = match self.tracker.status(&key) {
            Some(t) => (t.status, t.resolve_data.clone()),
            None => (ChallengeStatus::Uninitialized, None),
        };

        match status {
            ChallengeStatus::Uninitialized => self.fetch_from_storage(key, cancel).await,
            ChallengeStatus::Active => Ok(InputStatus::NotReady(NotReadyReason::ChallengeActive)),
            ChallengeStatus::Resolved => match resolve_data {
                Some(data) => {
                    self.consume(key)?;
                    Ok(InputStatus::Ready(data))
                }
                None => Ok(InputStatus::NotReady(NotReadyReason::AwaitingResolveData)),
            },
            ChallengeStatus::Expired => {
                debug!(%key, "commitment expired");
                Ok(InputStatus::Unavailable)
            }
        }
    }

    async fn fetch_from_storage(
        &mut self,
        key: CommitmentKey,
        cancel: &CancellationToken,
    ) -> ManagerResult<InputStatus> {
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ManagerError::Canceled),
            res = tokio::time::timeout(self.fetch_timeout, self.storage.get(&key.commitment)) => res,
        };

        self.tracker.record_commitment(key);

        let res = match res {
            Ok(Ok(data)) if !key.commitment.verify(&data) => Err(StorageError::InvalidPreimage),
            Ok(res) => res,
            Err(_) => Err(StorageError::Timeout),
        };

        match res {
            Ok(data) => {
                trace!(%key, len = data.len(), "fetched preimage");
                self.consume(key)?;
                Ok(InputStatus::Ready(data))
            }
            Err(StorageError::NotFound | StorageError::InvalidPreimage) => {
                let head = self.tracker.head();
                let window_end = key.challenge_window_end(self.params.challenge_window);
                if head <= window_end {
                    warn!(%key, %head, %window_end, "preimage missing from storage, waiting for challenge window");
                    Ok(InputStatus::NotReady(
                        NotReadyReason::AwaitingPossibleChallenge,
                    ))
                } else {
                    warn!(%key, %head, "preimage missing from storage after challenge window");
                    Ok(InputStatus::Unavailable)
                }
            }
            Err(StorageError::Timeout) => {
                warn!(%key, timeout = ?self.fetch_timeout, "storage fetch timed out");
                Ok(InputStatus::NotReady(NotReadyReason::StorageTimeout))
            }
            Err(StorageError::Transport(e)) => {
                error!(%key, err = %e, "failed to reach storage");
                Ok(InputStatus::NotReady(NotReadyReason::StorageUnavailable))
            }
        }
    }

    fn consume(&mut self, key: CommitmentKey) -> ManagerResult<()> {
        if self.consumed.insert(key) {
            self.tracker.retain(&key)?;
        }
        Ok(())
    }

    /// Notes that derivation has read every commitment included up to
    /// `l1_block`.
    pub fn advance_derivation_origin(&mut self, l1_block: u64) {
        if l1_block > self.derivation_origin {
            trace!(%l1_block, "advanced derivation origin");
            self.derivation_origin = l1_block;
        }
    }

    pub fn derivation_origin(&self) -> u64 {
        self.derivation_origin
    }

    /// Processes the contract activity of the next L1 block.
    pub fn on_l1_block(&mut self, data: &L1BlockData) -> L1BlockOutcome {
        let height = data.number();
        let mut outcome = L1BlockOutcome::default();

        for ev in &data.events {
            match ev {
                ContractEvent::ChallengeStatusChanged { key, status } => {
                    if let Some(unexp) = self.tracker.apply_event(*key, *status, height) {
                        outcome.unexpected.push(unexp);
                    }
                }
                ContractEvent::BalanceChanged { .. } => {
                    self.balances.apply_event(ev, height);
                }
                ContractEvent::RequiredBondSizeChanged(_)
                | ContractEvent::ResolverRefundPercentageChanged(_) => {
                    if let Some(next) = self.contract_params.apply_event(ev) {
                        self.contract_params = next;
                    }
                }
                ContractEvent::OwnershipTransferred {
                    previous_owner,
                    new_owner,
                } => {
                    debug!(%previous_owner, %new_owner, %height, "challenge contract changed owner");
                }
            }
        }

        for call in &data.resolve_calls {
            if let Err(e) = self
                .tracker
                .attach_resolve_data(&call.key, call.preimage.clone())
            {
                warn!(key = %call.key, %height, err = %e, "ignoring resolve calldata");
            }
        }

        self.tracker.advance_l1(height);

        let tracker = &self.tracker;
        let expired: Vec<_> = self
            .consumed
            .iter()
            .filter(|k| {
                tracker
                    .status(k)
                    .is_some_and(|t| t.status == ChallengeStatus::Expired)
            })
            .copied()
            .collect();

        for key in expired {
            warn!(%key, %height, "consumed commitment expired");
            self.consumed.remove(&key);
            self.tracker.release(&key);
            outcome.expired.push(key);
        }

        outcome
    }

    /// Rewinds to `new_head` after an L1 reorg. Returns the commitments whose
    /// status changed, and if there are any, the next `get_input` reports
    /// the rewind.
    pub fn on_l1_rewind(&mut self, new_head: u64) -> Vec<CommitmentKey> {
        let changed = self.tracker.rewind_l1(new_head);
        self.derivation_origin = self.derivation_origin.min(new_head);

        let tracker = &self.tracker;
        self.consumed.retain(|k| tracker.status(k).is_some());

        if self.balances.last_block() > new_head {
            self.balances.clear();
        }

        if !changed.is_empty() {
            info!(%new_head, changed = changed.len(), "L1 rewind changed challenge statuses");
            self.pending_reorg = Some(new_head);
        }
        changed
    }

    /// Records a new finalized L1 head and drops what can't change anymore.
    /// Returns the highest L1 origin L2 may be finalized up to.
    pub fn on_l1_finalized(&mut self, l1_finalized: u64) -> u64 {
        if l1_finalized < self.l1_finalized {
            warn!(%l1_finalized, cur = self.l1_finalized, "ignoring finalized L1 going backwards");
            return self.finalized_l2_origin();
        }
        self.l1_finalized = l1_finalized;

        let cur = self.settled_l1();
        let params = &self.params;
        let tracker = &self.tracker;
        let settled: Vec<_> = self
            .consumed
            .iter()
            .filter(|k| {
                cur >= params.settlement_block(k)
                    && tracker
                        .status(k)
                        .is_some_and(|t| t.status != ChallengeStatus::Active)
            })
            .copied()
            .collect();

        for key in &settled {
            self.consumed.remove(key);
            self.tracker.release(key);
        }

        // Derivation never goes back below the finalized origin, so what's
        // settled there won't be asked about again.
        let origin = self.finalized_l2_origin();
        let pruned = self.tracker.prune(cur, origin);
        debug!(%l1_finalized, released = settled.len(), pruned = pruned.len(), %origin, "processed finalized L1");
        origin
    }

    /// Returns if L2 blocks with an L1 origin up to `candidate` may be
    /// finalized.
    pub fn finalized(&self, candidate: u64) -> bool {
        FinalityGate::check(
            &self.tracker,
            candidate,
            self.settled_l1(),
            self.derivation_origin,
        )
    }

    pub fn finalized_l2_origin(&self) -> u64 {
        FinalityGate::highest_finalizable(
            &self.tracker,
            self.settled_l1(),
            self.derivation_origin,
        )
    }

    /// L1 height both finalized and processed, statuses are only known up
    /// to the latter.
    fn settled_l1(&self) -> u64 {
        self.l1_finalized.min(self.tracker.head())
    }

    /// Forgets what derivation consumed, after the pipeline was reset and
    /// will ask again.
    pub fn reset_derivation(&mut self) {
        info!(consumed = self.consumed.len(), "resetting derivation references");
        self.tracker.release_all();
        self.consumed.clear();
        self.pending_reorg = None;
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Bytes;
    use altda_contract::ResolveCall;
    use altda_storage_client::{MemoryStorageClient, MockStorageClient, StorageResult};
    use altda_test_utils::fixtures::*;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn block(number: u64, events: Vec<ContractEvent>, resolve_calls: Vec<ResolveCall>) -> L1BlockData {
        let block_ref = L1BlockRef::new(number, Default::default(), Default::default());
        L1BlockData::new(block_ref, events, resolve_calls)
    }

    fn status_event(key: CommitmentKey, status: ChallengeStatus) -> ContractEvent {
        ContractEvent::ChallengeStatusChanged { key, status }
    }

    fn advance(mgr: &mut DaManager, to: u64) {
        for n in mgr.l1_head() + 1..=to {
            let block_ref = L1BlockRef::new(n, Default::default(), Default::default());
            mgr.on_l1_block(&L1BlockData::empty(block_ref));
        }
    }

    fn manager_with(storage: Arc<dyn StorageClient>) -> DaManager {
        DaManager::new(test_params(), storage, TIMEOUT).unwrap()
    }

    fn mock_storage(res: StorageResult<Bytes>) -> Arc<dyn StorageClient> {
        let mut mock = MockStorageClient::new();
        mock.expect_get().returning(move |_| res.clone());
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_storage_hit() {
        let storage = Arc::new(MemoryStorageClient::new(CommitmentType::Keccak256));
        let comm = storage.set(b"hello").await.unwrap();
        let key = CommitmentKey::new(100, comm);

        let mut mgr = manager_with(storage);
        advance(&mut mgr, 100);

        let cancel = CancellationToken::new();
        let res = mgr.get_input(key, &cancel).await.unwrap();
        assert_eq!(res, InputStatus::Ready(Bytes::from_static(b"hello")));
        assert_eq!(mgr.tracker().refs(&key), 1);

        // Idempotent, and only referenced once.
        assert_eq!(mgr.get_input(key, &cancel).await.unwrap(), res);
        assert_eq!(mgr.tracker().refs(&key), 1);
    }

    #[tokio::test]
    async fn test_storage_miss_depends_on_window() {
        let key = keccak_key(100, b"hello");
        let mut mgr = manager_with(mock_storage(Err(StorageError::NotFound)));
        let cancel = CancellationToken::new();

        advance(&mut mgr, 116);
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::AwaitingPossibleChallenge)
        );

        advance(&mut mgr, 117);
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::Unavailable
        );
    }

    #[tokio::test]
    async fn test_storage_wrong_preimage() {
        let key = keccak_key(100, b"hello");
        let mut mgr = manager_with(mock_storage(Ok(Bytes::from_static(b"bye"))));
        advance(&mut mgr, 101);
        assert_eq!(
            mgr.get_input(key, &CancellationToken::new()).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::AwaitingPossibleChallenge)
        );
        assert_eq!(mgr.status().consumed, 0);
    }

    #[tokio::test]
    async fn test_storage_failures_are_retryable() {
        let key = keccak_key(100, b"hello");
        let cancel = CancellationToken::new();

        let mut mgr = manager_with(mock_storage(Err(StorageError::Transport(
            "connection refused".to_owned(),
        ))));
        advance(&mut mgr, 200);
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::StorageUnavailable)
        );

        let mut mgr = manager_with(mock_storage(Err(StorageError::Timeout)));
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::StorageTimeout)
        );
    }

    #[tokio::test]
    async fn test_fetch_deadline() {
        let storage = Arc::new(MemoryStorageClient::new(CommitmentType::Keccak256));
        let comm = storage.set(b"hello").await.unwrap();
        storage.set_delay(Duration::from_millis(200));

        let mut mgr =
            DaManager::new(test_params(), storage, Duration::from_millis(10)).unwrap();
        assert_eq!(
            mgr.get_input(CommitmentKey::new(100, comm), &CancellationToken::new())
                .await
                .unwrap(),
            InputStatus::NotReady(NotReadyReason::StorageTimeout)
        );
    }

    #[tokio::test]
    async fn test_canceled_fetch_leaves_no_trace() {
        let storage = Arc::new(MemoryStorageClient::new(CommitmentType::Keccak256));
        storage.set_delay(Duration::from_secs(10));
        let mut mgr = manager_with(storage);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = mgr.get_input(keccak_key(100, b"hello"), &cancel).await;
        assert!(matches!(res, Err(ManagerError::Canceled)));
        assert!(mgr.tracker().is_empty());
    }

    #[tokio::test]
    async fn test_challenge_lifecycle() {
        let key = keccak_key(100, b"hello");
        let mut mgr = manager_with(mock_storage(Err(StorageError::NotFound)));
        let cancel = CancellationToken::new();
        advance(&mut mgr, 100);

        mgr.on_l1_block(&block(101, vec![status_event(key, ChallengeStatus::Active)], vec![]));
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::ChallengeActive)
        );

        // Resolved, but the calldata went missing somehow.
        mgr.on_l1_block(&block(108, vec![status_event(key, ChallengeStatus::Resolved)], vec![]));
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::AwaitingResolveData)
        );
    }

    #[test]
    fn test_consumed_expiry_reported_once() {
        let key = keccak_key(100, b"hello");
        let storage = mock_storage(Ok(Bytes::from_static(b"hello")));
        let mut mgr = manager_with(storage);
        advance(&mut mgr, 100);

        mgr.tracker.record_commitment(key);
        mgr.consume(key).unwrap();

        mgr.on_l1_block(&block(101, vec![status_event(key, ChallengeStatus::Active)], vec![]));
        advance(&mut mgr, 117);
        assert_eq!(mgr.status().consumed, 1);

        let outcome = mgr.on_l1_block(&block(118, vec![], vec![]));
        assert_eq!(outcome.expired, vec![key]);
        assert!(outcome.needs_reset());
        assert_eq!(mgr.tracker().refs(&key), 0);

        // The bond unlock after the fact doesn't trigger anything.
        let outcome =
            mgr.on_l1_block(&block(119, vec![status_event(key, ChallengeStatus::Expired)], vec![]));
        assert!(!outcome.needs_reset());
    }

    #[test]
    fn test_unexpected_transition_reported() {
        let key = keccak_key(100, b"hello");
        let mut mgr = manager_with(mock_storage(Err(StorageError::NotFound)));
        let outcome =
            mgr.on_l1_block(&block(101, vec![status_event(key, ChallengeStatus::Resolved)], vec![]));
        assert_eq!(outcome.unexpected.len(), 1);
        assert_eq!(outcome.unexpected[0].from, ChallengeStatus::Uninitialized);
        assert!(outcome.needs_reset());
    }

    #[test]
    fn test_governance_and_balances() {
        let mut mgr = manager_with(mock_storage(Err(StorageError::NotFound)));
        mgr.on_l1_block(&block(
            1,
            vec![
                ContractEvent::RequiredBondSizeChanged(U256::from(2000)),
                ContractEvent::ResolverRefundPercentageChanged(U256::from(10)),
                ContractEvent::BalanceChanged {
                    account: CHALLENGER,
                    balance: U256::from(500),
                },
            ],
            vec![],
        ));

        let params = mgr.contract_params();
        assert_eq!(params.bond_size, U256::from(2000));
        assert_eq!(params.resolver_refund_percentage, U256::from(10));
        assert_eq!(mgr.balance_of(&CHALLENGER), U256::from(500));

        // Balances from rewound blocks are dropped.
        mgr.on_l1_rewind(0);
        assert_eq!(mgr.balance_of(&CHALLENGER), U256::ZERO);
    }

    #[tokio::test]
    async fn test_rewind_reported_once() {
        let key = keccak_key(100, b"hello");
        let mut mgr = manager_with(mock_storage(Err(StorageError::NotFound)));
        let cancel = CancellationToken::new();
        advance(&mut mgr, 100);
        mgr.on_l1_block(&block(101, vec![status_event(key, ChallengeStatus::Active)], vec![]));
        mgr.on_l1_block(&block(
            102,
            vec![status_event(key, ChallengeStatus::Resolved)],
            vec![ResolveCall::new(key, Bytes::from_static(b"hello"))],
        ));
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::Ready(Bytes::from_static(b"hello"))
        );

        assert_eq!(mgr.on_l1_rewind(101), vec![key]);
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::Reorg(101)
        );
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::ChallengeActive)
        );

        // Nothing tracked above the head, nothing to report.
        assert!(mgr.on_l1_rewind(101).is_empty());
        assert_eq!(
            mgr.get_input(key, &cancel).await.unwrap(),
            InputStatus::NotReady(NotReadyReason::ChallengeActive)
        );
    }

    #[tokio::test]
    async fn test_finalization() {
        let storage = Arc::new(MemoryStorageClient::new(CommitmentType::Keccak256));
        let comm = storage.set(b"hello").await.unwrap();
        let key = CommitmentKey::new(100, comm);
        let mut mgr = manager_with(storage);

        advance(&mut mgr, 100);
        mgr.get_input(key, &CancellationToken::new()).await.unwrap();

        // Nothing processed past 100 yet, so finalized L1 is capped there.
        assert_eq!(mgr.on_l1_finalized(150), 84);
        assert!(!mgr.finalized(100));

        advance(&mut mgr, 150);
        assert_eq!(mgr.on_l1_finalized(150), 99);
        mgr.advance_derivation_origin(150);
        assert_eq!(mgr.on_l1_finalized(150), 134);
        assert!(mgr.finalized(100));
        assert_eq!(mgr.status().consumed, 0);
        assert!(mgr.tracker().is_empty());
    }

    #[tokio::test]
    async fn test_reset_derivation() {
        let storage = Arc::new(MemoryStorageClient::new(CommitmentType::Keccak256));
        let comm = storage.set(b"hello").await.unwrap();
        let key = CommitmentKey::new(100, comm);
        let mut mgr = manager_with(storage);

        mgr.get_input(key, &CancellationToken::new()).await.unwrap();
        assert_eq!(mgr.tracker().refs(&key), 1);

        mgr.reset_derivation();
        assert_eq!(mgr.tracker().refs(&key), 0);
        assert_eq!(mgr.status().consumed, 0);
    }

    /// Feeds two managers the same L1 history, where only the first hears
    /// about L1 finality before derivation asks about `key`.
    async fn inputs_around_finality(
        storage: Arc<dyn StorageClient>,
        blocks: &[L1BlockData],
        key: CommitmentKey,
    ) -> (InputStatus, InputStatus) {
        let cancel = CancellationToken::new();
        let mut early = manager_with(storage.clone());
        let mut late = manager_with(storage);
        for b in blocks {
            early.on_l1_block(b);
            late.on_l1_block(b);
        }

        early.on_l1_finalized(140);
        let a = early.get_input(key, &cancel).await.unwrap();
        let b = late.get_input(key, &cancel).await.unwrap();
        late.on_l1_finalized(140);
        (a, b)
    }

    fn history(key: CommitmentKey, resolve: bool) -> Vec<L1BlockData> {
        (1..=140)
            .map(|n| match n {
                101 => block(n, vec![status_event(key, ChallengeStatus::Active)], vec![]),
                108 if resolve => block(
                    n,
                    vec![status_event(key, ChallengeStatus::Resolved)],
                    vec![ResolveCall::new(key, Bytes::from_static(b"hello"))],
                ),
                _ => block(n, vec![], vec![]),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_finality_ahead_of_derivation_keeps_resolved() {
        let key = keccak_key(100, b"hello");
        let storage = mock_storage(Err(StorageError::NotFound));
        let (early, late) = inputs_around_finality(storage, &history(key, true), key).await;
        assert_eq!(early, InputStatus::Ready(Bytes::from_static(b"hello")));
        assert_eq!(early, late);
    }

    #[tokio::test]
    async fn test_finality_ahead_of_derivation_keeps_expired() {
        let key = keccak_key(100, b"hello");
        let storage = mock_storage(Ok(Bytes::from_static(b"hello")));
        let (early, late) = inputs_around_finality(storage, &history(key, false), key).await;
        assert_eq!(early, InputStatus::Unavailable);
        assert_eq!(early, late);
    }

    #[tokio::test]
    async fn test_finality_waits_for_derivation() {
        let storage = Arc::new(MemoryStorageClient::new(CommitmentType::Keccak256));
        let comm = storage.set(b"late").await.unwrap();
        let key = CommitmentKey::new(120, comm);
        let mut mgr = manager_with(storage);
        advance(&mut mgr, 150);

        // The watcher is far ahead but derivation hasn't read anything.
        assert_eq!(mgr.on_l1_finalized(150), 0);
        assert!(!mgr.finalized(130));

        assert_eq!(
            mgr.get_input(key, &CancellationToken::new()).await.unwrap(),
            InputStatus::Ready(Bytes::from_static(b"late"))
        );
        assert_eq!(mgr.derivation_origin(), 119);
        assert_eq!(mgr.on_l1_finalized(150), 119);
        assert!(!mgr.finalized(130));

        // Settles two blocks later.
        advance(&mut mgr, 152);
        mgr.advance_derivation_origin(152);
        assert_eq!(mgr.on_l1_finalized(152), 136);
        assert!(mgr.finalized(130));
    }

    #[test]
    fn test_rewind_lowers_derivation_origin() {
        let mut mgr = manager_with(mock_storage(Err(StorageError::NotFound)));
        advance(&mut mgr, 50);
        mgr.advance_derivation_origin(50);
        mgr.advance_derivation_origin(40);
        assert_eq!(mgr.derivation_origin(), 50);

        mgr.on_l1_rewind(45);
        assert_eq!(mgr.derivation_origin(), 45);
    }
}
