//! Deterministic mirror of the challenge contract's state machine.
//!
//! Every call either applies all of its effects and appends its events, or
//! returns the revert reason and leaves the state exactly as it was.

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, U256};
use altda_primitives::prelude::*;
use tracing::*;

use crate::{
    abi::ContractEvent,
    errors::{ContractError, ContractResult},
    ledger::BalanceLedger,
    params::{check_refund_percentage, ContractParams},
};

/// Execution context of a single contract call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallContext {
    pub caller: Address,

    /// Native value attached to the call.
    pub value: U256,

    /// Number of the L1 block the call executes in.
    pub block_number: u64,

    /// Base fee of that block.
    pub base_fee: U256,
}

impl CallContext {
    pub fn new(caller: Address, block_number: u64) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            block_number,
            base_fee: U256::from(1),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_base_fee(mut self, base_fee: U256) -> Self {
        self.base_fee = base_fee;
        self
    }
}

/// Sends native value out of the contract. Returns `false` if the recipient
/// rejected the transfer.
pub trait NativeTransfer {
    fn transfer(&mut self, to: Address, amount: U256) -> bool;
}

impl<F> NativeTransfer for F
where
    F: FnMut(Address, U256) -> bool,
{
    fn transfer(&mut self, to: Address, amount: U256) -> bool {
        self(to, amount)
    }
}

/// Stored challenge record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Challenge {
    pub challenger: Address,
    pub locked_bond: U256,
    pub start_block: u64,

    /// 0 while unresolved.
    pub resolved_block: u64,

    /// Status as of the last call that touched the challenge. An `Active`
    /// challenge past its resolve window is only recorded as `Expired` once
    /// its bond is unlocked.
    pub status: ChallengeStatus,
}

#[derive(Clone, Debug)]
pub struct ChallengeContract {
    address: Address,
    owner: Address,
    challenge_window: u64,
    resolve_window: u64,
    params: ContractParams,
    ledger: BalanceLedger,
    challenges: HashMap<CommitmentKey, Challenge>,
    native_balance: U256,
    events: Vec<ContractEvent>,
}

impl ChallengeContract {
    pub fn new(
        address: Address,
        owner: Address,
        challenge_window: u64,
        resolve_window: u64,
        params: ContractParams,
    ) -> Self {
        Self {
            address,
            owner,
            challenge_window,
            resolve_window,
            params,
            ledger: BalanceLedger::new(),
            challenges: HashMap::new(),
            native_balance: U256::ZERO,
            events: Vec::new(),
        }
    }

    pub fn from_altda_params(params: &AltDaParams, owner: Address) -> ContractResult<Self> {
        Ok(Self::new(
            params.challenge_contract,
            owner,
            params.challenge_window,
            params.resolve_window,
            ContractParams::from_altda_params(params)?,
        ))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn params(&self) -> &ContractParams {
        &self.params
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.ledger.balance_of(account)
    }

    /// Native value held by the contract.
    pub fn native_balance(&self) -> U256 {
        self.native_balance
    }

    pub fn challenge_of(&self, key: &CommitmentKey) -> Option<&Challenge> {
        self.challenges.get(key)
    }

    /// Drains the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, ev: ContractEvent) {
        trace!(?ev, "contract event");
        self.events.push(ev);
    }

    fn emit_balance(&mut self, account: Address) {
        let balance = self.ledger.balance_of(&account);
        self.emit(ContractEvent::BalanceChanged { account, balance });
    }

    fn emit_status(&mut self, key: CommitmentKey, status: ChallengeStatus) {
        self.emit(ContractEvent::ChallengeStatusChanged { key, status });
    }

    pub fn deposit(&mut self, ctx: &CallContext) -> ContractResult<()> {
        self.ledger.credit(ctx.caller, ctx.value);
        self.native_balance = self.native_balance.saturating_add(ctx.value);
        self.emit_balance(ctx.caller);
        Ok(())
    }

    /// Pays out the caller's whole balance. If the transfer fails nothing
    /// changes and no event is emitted.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        transfer: &mut impl NativeTransfer,
    ) -> ContractResult<()> {
        check_non_payable(ctx)?;

        let balance = self.ledger.balance_of(&ctx.caller);
        if !transfer.transfer(ctx.caller, balance) {
            debug!(caller = %ctx.caller, %balance, "withdrawal transfer rejected");
            return Err(ContractError::WithdrawalFailed);
        }

        self.ledger.set(ctx.caller, U256::ZERO);
        self.native_balance = self.native_balance.saturating_sub(balance);
        self.emit_balance(ctx.caller);
        Ok(())
    }

    /// Opens a challenge, topping up the caller's balance with the attached
    /// value and locking exactly the current bond size.
    pub fn challenge(
        &mut self,
        ctx: &CallContext,
        block_number: u64,
        commitment: &[u8],
    ) -> ContractResult<()> {
        let key = CommitmentKey::new(block_number, Commitment::decode(commitment)?);

        if !key.in_challenge_window(ctx.block_number, self.challenge_window) {
            return Err(ContractError::ChallengeWindowNotOpen);
        }

        if self.challenges.contains_key(&key) {
            return Err(ContractError::ChallengeExists);
        }

        let have = self
            .ledger
            .balance_of(&ctx.caller)
            .saturating_add(ctx.value);
        let need = self.params.bond_size;
        if have < need {
            return Err(ContractError::BondTooLow { have, need });
        }

        self.native_balance = self.native_balance.saturating_add(ctx.value);
        self.ledger.set(ctx.caller, have - need);
        self.challenges.insert(
            key,
            Challenge {
                challenger: ctx.caller,
                locked_bond: need,
                start_block: ctx.block_number,
                resolved_block: 0,
                status: ChallengeStatus::Active,
            },
        );

        debug!(%key, challenger = %ctx.caller, block = ctx.block_number, "challenge opened");
        self.emit_balance(ctx.caller);
        self.emit_status(key, ChallengeStatus::Active);
        Ok(())
    }

    /// Resolves an active challenge by revealing the preimage, splitting the
    /// locked bond between the resolver and the challenger.
    ///
    /// The resolver gets its refund share of the resolution cost, clamped to
    /// the locked bond, and the challenger gets whatever is left of the bond.
    pub fn resolve(
        &mut self,
        ctx: &CallContext,
        block_number: u64,
        commitment: &[u8],
        preimage: &[u8],
    ) -> ContractResult<()> {
        check_non_payable(ctx)?;
        let comm = Commitment::decode(commitment)?;
        let key = CommitmentKey::new(block_number, comm);

        if self.get_challenge_status(&key, ctx.block_number) != ChallengeStatus::Active {
            return Err(ContractError::ChallengeNotActive);
        }

        if !comm.verify(preimage) {
            let provided = Commitment::from_preimage(comm.commitment_type(), preimage).encode();
            return Err(ContractError::InvalidInputData {
                provided,
                expected: Bytes::copy_from_slice(commitment),
            });
        }

        let Some(challenge) = self.challenges.get_mut(&key) else {
            return Err(ContractError::ChallengeNotActive);
        };
        let locked = challenge.locked_bond;
        let challenger = challenge.challenger;
        let refund = self
            .params
            .resolver_refund(locked, preimage.len(), ctx.base_fee);

        challenge.resolved_block = ctx.block_number;
        challenge.locked_bond = U256::ZERO;
        challenge.status = ChallengeStatus::Resolved;

        self.ledger.credit(ctx.caller, refund);
        self.ledger.credit(challenger, locked - refund);

        debug!(%key, resolver = %ctx.caller, %refund, "challenge resolved");
        self.emit_status(key, ChallengeStatus::Resolved);
        self.emit_balance(ctx.caller);
        self.emit_balance(challenger);
        Ok(())
    }

    /// Returns the bond of a challenge whose resolve window has elapsed to
    /// its challenger.
    pub fn unlock_bond(
        &mut self,
        ctx: &CallContext,
        block_number: u64,
        commitment: &[u8],
    ) -> ContractResult<()> {
        check_non_payable(ctx)?;
        let key = CommitmentKey::new(block_number, Commitment::decode(commitment)?);
        let resolve_window = self.resolve_window;

        let challenge = match self.challenges.get_mut(&key) {
            Some(c) if c.status == ChallengeStatus::Active => c,
            _ => return Err(ContractError::ChallengeNotActive),
        };

        if ctx.block_number.saturating_sub(challenge.start_block) <= resolve_window {
            return Err(ContractError::ChallengeNotExpired);
        }

        let locked = challenge.locked_bond;
        let challenger = challenge.challenger;
        challenge.locked_bond = U256::ZERO;
        challenge.status = ChallengeStatus::Expired;
        self.ledger.credit(challenger, locked);

        debug!(%key, %challenger, "bond unlocked");
        self.emit_balance(challenger);
        self.emit_status(key, ChallengeStatus::Expired);
        Ok(())
    }

    /// Status of a challenge as seen at `cur_l1`. An active challenge whose
    /// resolve window has passed reads as expired even before its bond is
    /// unlocked.
    pub fn get_challenge_status(&self, key: &CommitmentKey, cur_l1: u64) -> ChallengeStatus {
        let Some(c) = self.challenges.get(key) else {
            return ChallengeStatus::Uninitialized;
        };
        match c.status {
            ChallengeStatus::Active
                if cur_l1.saturating_sub(c.start_block) > self.resolve_window =>
            {
                ChallengeStatus::Expired
            }
            s => s,
        }
    }

    pub fn set_bond_size(&mut self, ctx: &CallContext, bond_size: U256) -> ContractResult<()> {
        self.check_owner(ctx)?;
        self.params = ContractParams {
            bond_size,
            ..self.params.clone()
        };
        self.emit(ContractEvent::RequiredBondSizeChanged(bond_size));
        Ok(())
    }

    pub fn set_resolver_refund_percentage(
        &mut self,
        ctx: &CallContext,
        pct: U256,
    ) -> ContractResult<()> {
        self.check_owner(ctx)?;
        check_refund_percentage(pct)?;
        self.params = ContractParams {
            resolver_refund_percentage: pct,
            ..self.params.clone()
        };
        self.emit(ContractEvent::ResolverRefundPercentageChanged(pct));
        Ok(())
    }

    pub fn transfer_ownership(&mut self, ctx: &CallContext, new_owner: Address) -> ContractResult<()> {
        self.check_owner(ctx)?;
        let previous_owner = self.owner;
        self.owner = new_owner;
        self.emit(ContractEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn renounce_ownership(&mut self, ctx: &CallContext) -> ContractResult<()> {
        self.transfer_ownership(ctx, Address::ZERO)
    }

    fn check_owner(&self, ctx: &CallContext) -> ContractResult<()> {
        check_non_payable(ctx)?;
        if ctx.caller != self.owner {
            return Err(ContractError::NotOwner(ctx.caller));
        }
        Ok(())
    }

    /// Checks the accounting and status invariants, returning a description
    /// of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut locked_total = U256::ZERO;
        for (key, c) in &self.challenges {
            let active = c.status == ChallengeStatus::Active;
            if active == c.locked_bond.is_zero() {
                return Err(format!(
                    "challenge {key} is {} with locked bond {}",
                    c.status, c.locked_bond
                ));
            }

            if c.status == ChallengeStatus::Resolved
                && (c.resolved_block < c.start_block
                    || c.resolved_block - c.start_block > self.resolve_window)
            {
                return Err(format!(
                    "challenge {key} resolved at {} outside window from {}",
                    c.resolved_block, c.start_block
                ));
            }

            locked_total = locked_total.saturating_add(c.locked_bond);
        }

        let held = self.ledger.total().saturating_add(locked_total);
        if held != self.native_balance {
            return Err(format!(
                "balances ({held}) don't match native balance ({})",
                self.native_balance
            ));
        }

        Ok(())
    }
}

fn check_non_payable(ctx: &CallContext) -> ContractResult<()> {
    if !ctx.value.is_zero() {
        return Err(ContractError::NonPayable);
    }
    Ok(())
}
