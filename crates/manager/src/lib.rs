//! Alt-DA manager: turns commitments into derivation inputs while tracking
//! their challenges on L1, and decides how far L2 can be finalized.

pub mod driver;
pub mod errors;
pub mod finality;
pub mod handle;
pub mod input;
pub mod manager;
pub mod message;
pub mod service;

pub use driver::driver_task;
pub use errors::{ManagerError, ManagerResult};
pub use finality::FinalityGate;
pub use handle::{driver_channel, DriverHandle, DriverInput};
pub use input::{key_from_tx_data, DriverEvent, InputStatus, NotReadyReason};
pub use manager::{DaManager, L1BlockOutcome, ManagerStatus};
pub use message::{PipelineSignal, ResetReason};
pub use service::{spawn_altda, spawn_altda_from_config, AltDaTasks};
