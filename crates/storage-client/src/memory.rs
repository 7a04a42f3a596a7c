use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};

use alloy_primitives::Bytes;
use altda_primitives::prelude::*;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::*;

use crate::{
    errors::{StorageError, StorageResult},
    traits::StorageClient,
};

/// In-process storage with switches for simulating outages and data loss.
#[derive(Debug)]
pub struct MemoryStorageClient {
    commitment_type: CommitmentType,
    preimages: RwLock<HashMap<Commitment, Bytes>>,
    offline: AtomicBool,
    delay_ms: AtomicU64,
}

impl MemoryStorageClient {
    pub fn new(commitment_type: CommitmentType) -> Self {
        Self {
            commitment_type,
            preimages: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// While offline every call fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Delays every response, for exercising caller deadlines.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Drops a stored preimage.
    pub async fn forget(&self, commitment: &Commitment) -> bool {
        self.preimages.write().await.remove(commitment).is_some()
    }

    pub async fn len(&self) -> usize {
        self.preimages.read().await.len()
    }

    async fn enter(&self) -> StorageResult<()> {
        let delay = self.delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.offline.load(Ordering::Relaxed) {
            return Err(StorageError::Transport("storage offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    async fn get(&self, commitment: &Commitment) -> StorageResult<Bytes> {
        self.enter().await?;
        self.preimages
            .read()
            .await
            .get(commitment)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn set(&self, preimage: &[u8]) -> StorageResult<Commitment> {
        self.enter().await?;
        let commitment = Commitment::from_preimage(self.commitment_type, preimage);
        self.preimages
            .write()
            .await
            .insert(commitment, Bytes::copy_from_slice(preimage));
        trace!(%commitment, "stored preimage in memory");
        Ok(commitment)
    }
}
