use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("tried to roll back to {0} above tip {1}")]
    RollbackAboveTip(u64, u64),

    #[error("tried to roll back to {0} past deepest tracked block {1}")]
    ReorgTooDeep(u64, u64),

    #[error("unable to find common block with client chain")]
    NoCommonAncestor,

    #[error("event receiver dropped")]
    ReceiverDropped,
}
