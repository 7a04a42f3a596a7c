use alloy_primitives::Bytes;
use altda_primitives::prelude::*;
use async_trait::async_trait;
#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

use crate::errors::StorageResult;

/// Key-value store mapping commitments to preimages.
///
/// Implementations must return exactly the preimage that hashes to the
/// requested commitment. Storage is content addressed, so the same preimage
/// referenced from two L1 heights is stored once.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
    /// Fetches the preimage of a commitment.
    async fn get(&self, commitment: &Commitment) -> StorageResult<Bytes>;

    /// Stores a preimage, returning its commitment.
    async fn set(&self, preimage: &[u8]) -> StorageResult<Commitment>;
}
