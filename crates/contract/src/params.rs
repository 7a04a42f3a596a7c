//! Governance-controlled contract parameters.

use std::sync::Arc;

use alloy_primitives::U256;
use altda_primitives::params::AltDaParams;
use tracing::*;

use crate::{
    abi::ContractEvent,
    errors::{ContractError, ContractResult},
};

/// Fixed gas cost of a `resolve` call, charged regardless of preimage size.
pub const FIXED_RESOLUTION_COST: u64 = 72925;

/// Per-byte gas cost of the preimage, scaled by
/// [`VARIABLE_RESOLUTION_COST_PRECISION`].
pub const VARIABLE_RESOLUTION_COST: u64 = 16;

pub const VARIABLE_RESOLUTION_COST_PRECISION: u64 = 1000;

/// Snapshot of the owner-settable contract parameters.
///
/// Shared as an `Arc` and replaced wholesale whenever a governance event is
/// observed, never mutated in place.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContractParams {
    pub bond_size: U256,
    pub resolver_refund_percentage: U256,
}

impl ContractParams {
    pub fn new(bond_size: U256, resolver_refund_percentage: U256) -> ContractResult<Self> {
        check_refund_percentage(resolver_refund_percentage)?;
        Ok(Self {
            bond_size,
            resolver_refund_percentage,
        })
    }

    pub fn from_altda_params(params: &AltDaParams) -> ContractResult<Self> {
        Self::new(params.bond_size, params.resolver_refund_percentage)
    }

    /// Gas-denominated cost of resolving with a preimage of `preimage_len`
    /// bytes, multiplied by `base_fee`.
    pub fn resolution_cost(preimage_len: usize, base_fee: U256) -> U256 {
        let variable = U256::from(VARIABLE_RESOLUTION_COST) * U256::from(preimage_len)
            / U256::from(VARIABLE_RESOLUTION_COST_PRECISION);
        (U256::from(FIXED_RESOLUTION_COST) + variable).saturating_mul(base_fee)
    }

    /// Share of the locked bond refunded to the resolver. Never more than
    /// `locked_bond`.
    pub fn resolver_refund(&self, locked_bond: U256, preimage_len: usize, base_fee: U256) -> U256 {
        let cost = Self::resolution_cost(preimage_len, base_fee);
        let refund = cost.saturating_mul(self.resolver_refund_percentage) / U256::from(100);
        refund.min(locked_bond)
    }

    /// Returns the snapshot that results from a governance event, or `None`
    /// if the event doesn't touch the parameters.
    ///
    /// Out of range refund percentages can't be set on chain, so seeing one
    /// means the log was not produced by the contract we think it was; it is
    /// ignored.
    pub fn apply_event(self: &Arc<Self>, ev: &ContractEvent) -> Option<Arc<Self>> {
        match ev {
            ContractEvent::RequiredBondSizeChanged(bond_size) => {
                info!(%bond_size, "bond size changed");
                Some(Arc::new(Self {
                    bond_size: *bond_size,
                    ..(**self).clone()
                }))
            }
            ContractEvent::ResolverRefundPercentageChanged(pct) => {
                if let Err(e) = check_refund_percentage(*pct) {
                    warn!(err = %e, "ignoring refund percentage update");
                    return None;
                }
                info!(%pct, "resolver refund percentage changed");
                Some(Arc::new(Self {
                    resolver_refund_percentage: *pct,
                    ..(**self).clone()
                }))
            }
            _ => None,
        }
    }
}

pub(crate) fn check_refund_percentage(pct: U256) -> ContractResult<()> {
    if pct > U256::from(100) {
        return Err(ContractError::InvalidResolverRefundPercentage(pct));
    }
    Ok(())
}
