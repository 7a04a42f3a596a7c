//! Client side of the off-chain DA storage service.
//!
//! Derivation only needs to know whether a preimage came back, was missing,
//! or couldn't be fetched at all. Those are the outcomes [`StorageError`]
//! distinguishes.

pub mod errors;
pub mod http;
pub mod memory;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use http::HttpStorageClient;
pub use memory::MemoryStorageClient;
#[cfg(any(test, feature = "mocks"))]
pub use traits::MockStorageClient;
pub use traits::StorageClient;
