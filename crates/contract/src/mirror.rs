//! Off-chain view of contract balances rebuilt from `BalanceChanged` logs.
//!
//! Purely informational. Nothing on the derivation path reads it.

use alloy_primitives::{Address, U256};
use tracing::*;

use crate::{abi::ContractEvent, ledger::BalanceLedger};

#[derive(Clone, Debug, Default)]
pub struct BalanceMirror {
    ledger: BalanceLedger,
    last_block: u64,
}

impl BalanceMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event seen in `l1_block`. Returns if the event was a
    /// balance update.
    pub fn apply_event(&mut self, ev: &ContractEvent, l1_block: u64) -> bool {
        let ContractEvent::BalanceChanged { account, balance } = ev else {
            return false;
        };
        trace!(%account, %balance, %l1_block, "mirrored balance update");
        self.ledger.set(*account, *balance);
        self.last_block = self.last_block.max(l1_block);
        true
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.ledger.balance_of(account)
    }

    /// Highest L1 block a balance update was seen in.
    pub fn last_block(&self) -> u64 {
        self.last_block
    }

    /// Forgets everything. Balances are absolute so the next update for an
    /// account is enough to restore it.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn test_mirror_tracks_latest_balance() {
        let alice = address!("00000000000000000000000000000000000a11ce");
        let mut mirror = BalanceMirror::new();

        assert!(mirror.apply_event(
            &ContractEvent::BalanceChanged {
                account: alice,
                balance: U256::from(2000),
            },
            10,
        ));
        assert!(mirror.apply_event(
            &ContractEvent::BalanceChanged {
                account: alice,
                balance: U256::from(1000),
            },
            11,
        ));
        assert!(!mirror.apply_event(&ContractEvent::RequiredBondSizeChanged(U256::from(1)), 12));

        assert_eq!(mirror.balance_of(&alice), U256::from(1000));
        assert_eq!(mirror.last_block(), 11);

        mirror.clear();
        assert_eq!(mirror.balance_of(&alice), U256::ZERO);
    }
}
