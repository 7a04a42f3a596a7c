//! Challenge contract interface and a deterministic mirror of its state
//! machine.
//!
//! The contract itself lives on L1. The mirror here reproduces its externally
//! observable behavior so operator tooling and tests can reason about bonds,
//! challenges and resolutions without an EVM.

pub mod abi;
pub mod contract;
pub mod errors;
pub mod ledger;
pub mod mirror;
pub mod params;

pub use abi::{ContractEvent, ResolveCall};
pub use contract::{CallContext, Challenge, ChallengeContract, NativeTransfer};
pub use errors::{AbiError, ContractError, ContractResult};
pub use params::ContractParams;
