use alloy_primitives::{Address, U256};
use altda_primitives::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default value for `da_commitment_type` in [`AltDaConfig`].
const DEFAULT_COMMITMENT_TYPE: &str = CommitmentType::KECCAK_STR;

/// Rollup-level Alt-DA parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltDaConfig {
    /// Address of the challenge contract on L1.
    #[serde(alias = "da_challenge_contract_address")]
    pub da_challenge_address: Address,

    /// Challenge window, in L1 blocks.
    pub da_challenge_window: u64,

    /// Resolve window, in L1 blocks.
    pub da_resolve_window: u64,

    #[serde(default = "default_commitment_type")]
    pub da_commitment_type: String,

    /// Initial bond size, later updated from contract events.
    pub bond_size: u64,

    /// Initial resolver refund percentage, later updated from contract events.
    #[serde(default)]
    pub resolver_refund_percentage: u64,
}

fn default_commitment_type() -> String {
    DEFAULT_COMMITMENT_TYPE.to_string()
}

impl AltDaConfig {
    /// Validates the config and turns it into the parameters used at runtime.
    pub fn to_params(&self) -> Result<AltDaParams, ConfigError> {
        if self.da_challenge_window == 0 {
            return Err(ConfigError::Invalid(
                "da_challenge_window must be positive".to_string(),
            ));
        }
        if self.da_resolve_window == 0 {
            return Err(ConfigError::Invalid(
                "da_resolve_window must be positive".to_string(),
            ));
        }
        if self.resolver_refund_percentage > 100 {
            return Err(ConfigError::Invalid(format!(
                "resolver_refund_percentage {} out of range",
                self.resolver_refund_percentage
            )));
        }

        let commitment_type = CommitmentType::from_config_str(&self.da_commitment_type)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unsupported commitment type {}",
                    self.da_commitment_type
                ))
            })?;

        Ok(AltDaParams {
            challenge_contract: self.da_challenge_address,
            commitment_type,
            challenge_window: self.da_challenge_window,
            resolve_window: self.da_resolve_window,
            bond_size: U256::from(self.bond_size),
            resolver_refund_percentage: U256::from(self.resolver_refund_percentage),
        })
    }
}
