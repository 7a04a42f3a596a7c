use std::collections::HashMap;

use alloy_primitives::{Address, U256};

/// Refundable balances held by the challenge contract, keyed by account.
#[derive(Clone, Debug, Default)]
pub struct BalanceLedger {
    balances: HashMap<Address, U256>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Adds to an account's balance, returning the new balance.
    pub fn credit(&mut self, account: Address, amount: U256) -> U256 {
        let bal = self.balances.entry(account).or_default();
        *bal = bal.saturating_add(amount);
        *bal
    }

    /// Overwrites an account's balance. Zero balances are removed.
    pub fn set(&mut self, account: Address, amount: U256) {
        if amount.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    /// Sum of all balances.
    pub fn total(&self) -> U256 {
        self.balances
            .values()
            .fold(U256::ZERO, |acc, b| acc.saturating_add(*b))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter()
    }
}
