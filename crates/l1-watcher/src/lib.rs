//! Follows the L1 chain and turns challenge contract activity into an ordered
//! stream of per-block events, with explicit rewinds on reorgs.

pub mod errors;
pub mod filter;
pub mod messages;
pub mod rpc;
pub mod state;
pub mod task;
pub mod traits;
pub mod types;

pub use messages::{L1BlockData, WatcherEvent, WatcherStatus};
pub use task::watcher_task;
pub use traits::L1Client;
pub use types::{L1Block, L1Transaction};
