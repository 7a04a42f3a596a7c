use alloy_primitives::Bytes;
use altda_primitives::prelude::*;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::*;

use crate::{
    errors::{StorageError, StorageResult},
    traits::StorageClient,
};

/// Client for the DA server HTTP protocol.
///
/// Preimages are read with `GET /get/0x<commitment>` and written with
/// `PUT /put/0x<commitment>`, where the commitment is computed locally.
#[derive(Debug, Clone)]
pub struct HttpStorageClient {
    base_url: String,
    commitment_type: CommitmentType,
    client: reqwest::Client,
}

impl HttpStorageClient {
    pub fn new(base_url: &str, commitment_type: CommitmentType) -> StorageResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            commitment_type,
            client,
        })
    }

    fn url(&self, op: &str, commitment: &Commitment) -> String {
        format!(
            "{}/{op}/0x{}",
            self.base_url,
            hex::encode(commitment.encode())
        )
    }
}

#[async_trait]
impl StorageClient for HttpStorageClient {
    async fn get(&self, commitment: &Commitment) -> StorageResult<Bytes> {
        let url = self.url("get", commitment);
        let resp = self.client.get(&url).send().await?;

        match resp.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound),
            status => {
                return Err(StorageError::Transport(format!(
                    "unexpected status {status}"
                )))
            }
        }

        let body = Bytes::from(resp.bytes().await?);
        if !commitment.verify(&body) {
            warn!(%commitment, len = body.len(), "storage returned mismatched preimage");
            return Err(StorageError::InvalidPreimage);
        }

        trace!(%commitment, len = body.len(), "fetched preimage");
        Ok(body)
    }

    async fn set(&self, preimage: &[u8]) -> StorageResult<Commitment> {
        let commitment = Commitment::from_preimage(self.commitment_type, preimage);
        let url = self.url("put", &commitment);
        let resp = self
            .client
            .put(&url)
            .body(preimage.to_vec())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(StorageError::Transport(format!(
                "unexpected status {}",
                resp.status()
            )));
        }

        debug!(%commitment, len = preimage.len(), "stored preimage");
        Ok(commitment)
    }
}
