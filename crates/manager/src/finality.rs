//! Decides how far L2 can be finalized without a late challenge or
//! resolution being able to change it.

use altda_primitives::prelude::*;
use altda_tracker::{ChallengeTracker, TrackedCommitment};

/// Stateless rules over a [`ChallengeTracker`].
pub struct FinalityGate;

impl FinalityGate {
    /// Returns if L2 blocks whose L1 origin is at or below `candidate` may be
    /// finalized, given the L1 chain is final up to `l1_finalized` and
    /// derivation has handed over every commitment included up to
    /// `derived_to`.
    ///
    /// Every commitment included at or below the candidate must have settled:
    /// both of its windows closed as of `l1_finalized` and its status
    /// definitive. The candidate itself must be out of the challenge window
    /// and no higher than `derived_to`, otherwise a commitment we haven't
    /// been told about could still be in it.
    pub fn check(
        tracker: &ChallengeTracker,
        candidate: u64,
        l1_finalized: u64,
        derived_to: u64,
    ) -> bool {
        let params = tracker.params();
        if candidate > derived_to
            || candidate.saturating_add(params.challenge_window) > l1_finalized
        {
            return false;
        }

        tracker
            .iter()
            .filter(|t| t.key.l1_inclusion_block <= candidate)
            .all(|t| is_settled(t, params, l1_finalized))
    }

    /// Highest candidate [`check`](Self::check) accepts. Returns 0 if not
    /// even genesis qualifies.
    pub fn highest_finalizable(
        tracker: &ChallengeTracker,
        l1_finalized: u64,
        derived_to: u64,
    ) -> u64 {
        let params = tracker.params();
        let bound = l1_finalized
            .saturating_sub(params.challenge_window)
            .min(derived_to);
        tracker
            .iter()
            .filter(|t| !is_settled(t, params, l1_finalized))
            .map(|t| t.key.l1_inclusion_block.saturating_sub(1))
            .fold(bound, u64::min)
    }
}

fn is_settled(t: &TrackedCommitment, params: &AltDaParams, cur_l1: u64) -> bool {
    if cur_l1 < params.settlement_block(&t.key) {
        return false;
    }

    match t.status {
        // Past the settlement block, so the challenge window is long closed.
        ChallengeStatus::Uninitialized => true,
        ChallengeStatus::Active => false,
        ChallengeStatus::Resolved => t.resolve_data.is_some(),
        ChallengeStatus::Expired => true,
    }
}
