//! JSON-RPC implementation of [`L1Client`] for Ethereum execution clients.

use alloy_primitives::{Address, Bytes, Log, LogData, B256, U64};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use jsonrpsee::{
    core::client::ClientT,
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use serde::Deserialize;

use crate::{
    traits::L1Client,
    types::{L1Block, L1Transaction},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlockHeader {
    number: U64,
    hash: B256,
    parent_hash: B256,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    #[serde(flatten)]
    header: RpcBlockHeader,
    transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: B256,
    to: Option<Address>,
    input: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,

    /// 1 for success, missing on pre-byzantium receipts.
    status: Option<U64>,

    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
}

impl From<RpcLog> for Log {
    fn from(log: RpcLog) -> Self {
        Log {
            address: log.address,
            data: LogData::new_unchecked(log.topics, log.data),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RpcL1Client {
    client: HttpClient,
}

impl RpcL1Client {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let client = HttpClientBuilder::default()
            .build(url)
            .with_context(|| format!("failed to build L1 client for {url}"))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl L1Client for RpcL1Client {
    async fn get_chain_head(&self) -> anyhow::Result<u64> {
        let number: U64 = self.client.request("eth_blockNumber", rpc_params![]).await?;
        Ok(number.to::<u64>())
    }

    async fn get_block_hash(&self, height: u64) -> anyhow::Result<Option<B256>> {
        let header: Option<RpcBlockHeader> = self
            .client
            .request("eth_getBlockByNumber", rpc_params![U64::from(height), false])
            .await?;
        Ok(header.map(|h| h.hash))
    }

    async fn get_block_at(&self, height: u64) -> anyhow::Result<L1Block> {
        let block: Option<RpcBlock> = self
            .client
            .request("eth_getBlockByNumber", rpc_params![U64::from(height), true])
            .await?;
        let block = block.ok_or_else(|| anyhow!("L1 block {height} not found"))?;

        // By hash, so a reorg in between can't hand us another fork's receipts.
        let receipts: Vec<RpcReceipt> = self
            .client
            .request("eth_getBlockReceipts", rpc_params![block.header.hash])
            .await?;

        join_receipts(block, receipts)
    }
}

fn join_receipts(block: RpcBlock, receipts: Vec<RpcReceipt>) -> anyhow::Result<L1Block> {
    if block.transactions.len() != receipts.len() {
        return Err(anyhow!(
            "block {} has {} txs but {} receipts",
            block.header.hash,
            block.transactions.len(),
            receipts.len()
        ));
    }

    let mut transactions = Vec::with_capacity(receipts.len());
    for (tx, receipt) in block.transactions.into_iter().zip(receipts) {
        if tx.hash != receipt.transaction_hash {
            return Err(anyhow!(
                "receipt for {} does not match tx {}",
                receipt.transaction_hash,
                tx.hash
            ));
        }

        let success = receipt.status.map_or(true, |s| s == U64::from(1));
        let logs = if success {
            receipt.logs.into_iter().map(Log::from).collect()
        } else {
            Vec::new()
        };

        transactions.push(L1Transaction {
            hash: tx.hash,
            to: tx.to,
            input: tx.input,
            success,
            logs,
        });
    }

    Ok(L1Block {
        number: block.header.number.to::<u64>(),
        hash: block.header.hash,
        parent_hash: block.header.parent_hash,
        transactions,
    })
}
