use serde::{Deserialize, Serialize};

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;

/// Configuration for the DA storage service client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the DA server.
    pub url: String,

    /// Deadline for a single preimage fetch.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}
