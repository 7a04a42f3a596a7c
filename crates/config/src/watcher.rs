use serde::{Deserialize, Serialize};

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAX_REORG_DEPTH: u64 = 64;
const DEFAULT_RETRY_COUNT: u16 = 5;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for the L1 watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// L1 execution client JSON-RPC endpoint.
    pub rpc_url: String,

    /// How often to poll the L1 client for a new head.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Blocks are only delivered once this many blocks are built on them.
    #[serde(default)]
    pub confirmation_depth: u64,

    /// How many recent block hashes to keep for finding a reorg pivot.
    #[serde(default = "default_max_reorg_depth")]
    pub max_reorg_depth: u64,

    #[serde(default = "default_retry_count")]
    pub retry_count: u16,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Capacity of the channel to the driver.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl WatcherConfig {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            confirmation_depth: 0,
            max_reorg_depth: DEFAULT_MAX_REORG_DEPTH,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_reorg_depth() -> u64 {
    DEFAULT_MAX_REORG_DEPTH
}

fn default_retry_count() -> u16 {
    DEFAULT_RETRY_COUNT
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}
