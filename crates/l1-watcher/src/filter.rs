//! Picks the challenge contract's logs and `resolve` calls out of a block.

use alloy_primitives::Address;
use altda_contract::{abi, ResolveCall};
use tracing::*;

use crate::{messages::L1BlockData, types::L1Block};

/// Extracts contract activity from a block.
///
/// Only successful transactions count. Logs must be emitted by `contract`
/// itself and resolve calls must be sent to it directly. Anything that fails
/// to decode is logged and skipped.
pub fn extract_block_data(block: &L1Block, contract: Address) -> L1BlockData {
    let mut events = Vec::new();
    let mut resolve_calls = Vec::new();

    for tx in block.transactions.iter().filter(|tx| tx.success) {
        for log in tx.logs.iter().filter(|l| l.address == contract) {
            match abi::decode_log(log) {
                Some(Ok(ev)) => events.push(ev),
                Some(Err(e)) => {
                    warn!(height = block.number, tx = %tx.hash, err = %e, "failed to decode contract log")
                }
                None => {}
            }
        }

        if tx.to != Some(contract) {
            continue;
        }

        match ResolveCall::from_calldata(&tx.input) {
            Some(Ok(call)) => resolve_calls.push(call),
            Some(Err(e)) => {
                warn!(height = block.number, tx = %tx.hash, err = %e, "failed to decode resolve call")
            }
            None => {}
        }
    }

    if !events.is_empty() {
        debug!(
            height = block.number,
            events = events.len(),
            resolves = resolve_calls.len(),
            "found contract activity"
        );
    }

    L1BlockData::new(block.block_ref(), events, resolve_calls)
}
