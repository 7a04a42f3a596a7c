//! Tracker for the challenge status of every commitment derivation has seen.

use std::collections::*;

use alloy_primitives::Bytes;
use altda_primitives::prelude::*;
use tracing::*;

use crate::errors::{TrackerError, TrackerResult, UnexpectedTransition};

/// What the tracker knows about a single commitment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrackedCommitment {
    pub key: CommitmentKey,
    pub status: ChallengeStatus,

    /// L1 block where the status last changed, 0 while uninitialized.
    pub challenge_block: u64,

    /// Preimage recovered from the resolving transaction, only while resolved.
    pub resolve_data: Option<Bytes>,

    /// L1 block from which the entry may be pruned.
    pub expiry_block: u64,
}

impl TrackedCommitment {
    fn new(key: CommitmentKey, params: &AltDaParams) -> Self {
        Self {
            key,
            status: ChallengeStatus::Uninitialized,
            challenge_block: 0,
            resolve_data: None,
            expiry_block: params.settlement_block(&key),
        }
    }
}

/// A status change that led to the current state of an entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum HistoryKind {
    /// Observed `ChallengeStatusChanged` event.
    Event(ChallengeStatus),

    /// Resolve window elapsed without the contract telling us yet.
    WindowElapsed,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct HistoryItem {
    l1_block: u64,
    kind: HistoryKind,
}

struct Entry {
    tracked: TrackedCommitment,

    /// Ordered transitions. Never more than two: opened, then resolved or
    /// expired.
    history: Vec<HistoryItem>,

    /// Outstanding derivation references.
    refs: usize,
}

impl Entry {
    fn new(key: CommitmentKey, params: &AltDaParams) -> Self {
        Self {
            tracked: TrackedCommitment::new(key, params),
            history: Vec::new(),
            refs: 0,
        }
    }

    /// Applies one transition to the tracked state without any checks.
    fn apply(&mut self, item: HistoryItem, params: &AltDaParams) {
        let t = &mut self.tracked;
        match item.kind {
            HistoryKind::Event(ChallengeStatus::Active) => {
                t.status = ChallengeStatus::Active;
                t.challenge_block = item.l1_block;
                t.expiry_block = item.l1_block.saturating_add(params.resolve_window);
            }
            HistoryKind::Event(status) => {
                t.status = status;
                t.challenge_block = item.l1_block;
            }
            HistoryKind::WindowElapsed => {
                t.status = ChallengeStatus::Expired;
                t.challenge_block = item.l1_block;
            }
        }
    }

    /// Recomputes the tracked state from the history alone.
    fn replay(&mut self, params: &AltDaParams) {
        let resolve_data = self.tracked.resolve_data.take();
        self.tracked = TrackedCommitment::new(self.tracked.key, params);
        for item in self.history.clone() {
            self.apply(item, params);
        }
        if self.tracked.status == ChallengeStatus::Resolved {
            self.tracked.resolve_data = resolve_data;
        }
    }
}

/// Tracks the challenge lifecycle of commitments against the L1 head.
///
/// Entries are keyed by [`CommitmentKey`], so the same commitment included at
/// two heights is tracked twice. Reorgs are handled by dropping transitions
/// above the new head and replaying what's left, never by diffing.
pub struct ChallengeTracker {
    params: AltDaParams,

    /// Highest L1 block we've been advanced to.
    head: u64,

    entries: HashMap<CommitmentKey, Entry>,
}

impl ChallengeTracker {
    pub fn new(params: AltDaParams) -> Self {
        Self {
            params,
            head: 0,
            entries: HashMap::new(),
        }
    }

    pub fn params(&self) -> &AltDaParams {
        &self.params
    }

    pub fn head(&self) -> u64 {
        self.head
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedCommitment> {
        self.entries.values().map(|e| &e.tracked)
    }

    pub fn status(&self, key: &CommitmentKey) -> Option<&TrackedCommitment> {
        self.entries.get(key).map(|e| &e.tracked)
    }

    pub fn refs(&self, key: &CommitmentKey) -> usize {
        self.entries.get(key).map(|e| e.refs).unwrap_or(0)
    }

    /// Starts tracking a commitment seen by derivation. Does nothing if it's
    /// already tracked.
    pub fn record_commitment(&mut self, key: CommitmentKey) -> &TrackedCommitment {
        let params = &self.params;
        &self
            .entries
            .entry(key)
            .or_insert_with(|| {
                trace!(%key, "tracking new commitment");
                Entry::new(key, params)
            })
            .tracked
    }

    /// Applies a `ChallengeStatusChanged` event seen in `l1_block`.
    ///
    /// Returns the offending transition if the event was ignored because it
    /// doesn't follow from the current state.
    pub fn apply_event(
        &mut self,
        key: CommitmentKey,
        status: ChallengeStatus,
        l1_block: u64,
    ) -> Option<UnexpectedTransition> {
        let params = &self.params;
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| Entry::new(key, params));

        let from = entry.tracked.status;
        let valid = matches!(
            (from, status),
            (ChallengeStatus::Uninitialized, ChallengeStatus::Active)
                | (ChallengeStatus::Active, ChallengeStatus::Resolved)
                | (ChallengeStatus::Active, ChallengeStatus::Expired)
        );

        if !valid {
            // The bond unlock for a challenge we already expired on our own.
            let derived = entry
                .history
                .last()
                .is_some_and(|h| h.kind == HistoryKind::WindowElapsed);
            if from == ChallengeStatus::Expired && status == ChallengeStatus::Expired && derived {
                debug!(%key, %l1_block, "bond unlocked for elapsed challenge");
                return None;
            }

            let unexp = UnexpectedTransition {
                key,
                from,
                to: status,
                l1_block,
            };
            warn!(%unexp, "ignoring challenge event");
            return Some(unexp);
        }

        let item = HistoryItem {
            l1_block,
            kind: HistoryKind::Event(status),
        };
        entry.history.push(item);
        entry.apply(item, params);
        info!(%key, %from, to = %status, %l1_block, "challenge status changed");
        None
    }

    /// Attaches the preimage revealed by a `resolve` call.
    pub fn attach_resolve_data(&mut self, key: &CommitmentKey, preimage: Bytes) -> TrackerResult<()> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or(TrackerError::UnknownCommitment(*key))?;

        if entry.tracked.status != ChallengeStatus::Resolved {
            return Err(TrackerError::NotResolved(entry.tracked.status));
        }

        if !key.commitment.verify(&preimage) {
            return Err(TrackerError::InvalidResolveData);
        }

        debug!(%key, len = preimage.len(), "attached resolve data");
        entry.tracked.resolve_data = Some(preimage);
        Ok(())
    }

    /// Moves the L1 head forward, expiring active challenges whose resolve
    /// window has passed. Calling it again with the same head is a no-op.
    pub fn advance_l1(&mut self, new_head: u64) {
        if new_head < self.head {
            warn!(head = self.head, %new_head, "tried to advance tracker backwards");
            return;
        }
        self.head = new_head;

        let params = &self.params;
        for entry in self.entries.values_mut() {
            let t = &entry.tracked;
            if t.status != ChallengeStatus::Active
                || params.in_resolve_window(t.challenge_block, new_head)
            {
                continue;
            }

            let item = HistoryItem {
                l1_block: t
                    .challenge_block
                    .saturating_add(params.resolve_window)
                    .saturating_add(1),
                kind: HistoryKind::WindowElapsed,
            };
            entry.history.push(item);
            entry.apply(item, params);
            info!(key = %entry.tracked.key, l1_block = item.l1_block, "challenge expired");
        }
    }

    /// Undoes every transition above `new_head`.
    ///
    /// Returns the keys whose status changed as a result. Commitments
    /// included above the new head are forgotten entirely.
    pub fn rewind_l1(&mut self, new_head: u64) -> Vec<CommitmentKey> {
        let mut changed = Vec::new();
        let params = &self.params;

        self.entries.retain(|key, entry| {
            if key.l1_inclusion_block > new_head {
                debug!(%key, %new_head, "dropping commitment included above rewind");
                changed.push(*key);
                return false;
            }

            let before = entry.history.len();
            entry.history.retain(|h| h.l1_block <= new_head);
            if entry.history.len() == before {
                return true;
            }

            let from = entry.tracked.status;
            entry.replay(params);
            info!(%key, %from, to = %entry.tracked.status, %new_head, "rewound challenge status");
            changed.push(*key);
            true
        });

        self.head = new_head;
        // Anything that was already past its window at the new head expires
        // again right away.
        self.advance_l1(new_head);
        changed
    }

    /// Rebuilds every entry's state from its retained history.
    pub fn replay(&mut self) {
        let params = &self.params;
        for entry in self.entries.values_mut() {
            entry.replay(params);
        }
    }

    /// Takes a derivation reference on a tracked commitment.
    pub fn retain(&mut self, key: &CommitmentKey) -> TrackerResult<()> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or(TrackerError::UnknownCommitment(*key))?;
        entry.refs += 1;
        Ok(())
    }

    pub fn release(&mut self, key: &CommitmentKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refs = entry.refs.saturating_sub(1);
        }
    }

    /// Drops every derivation reference.
    pub fn release_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.refs = 0;
        }
    }

    /// Removes entries past their expiry that derivation no longer depends
    /// on. Only commitments included at or below `max_inclusion` are
    /// considered, derivation may still ask about the rest. Active
    /// challenges are always kept. Returns the pruned keys.
    pub fn prune(&mut self, cur_l1: u64, max_inclusion: u64) -> Vec<CommitmentKey> {
        let mut pruned = Vec::new();
        self.entries.retain(|key, entry| {
            let t = &entry.tracked;
            let keep = t.key.l1_inclusion_block > max_inclusion
                || cur_l1 < t.expiry_block
                || entry.refs > 0
                || t.status == ChallengeStatus::Active;
            if !keep {
                pruned.push(*key);
            }
            keep
        });

        if !pruned.is_empty() {
            debug!(%cur_l1, count = pruned.len(), "pruned commitments");
        }
        pruned
    }
}
