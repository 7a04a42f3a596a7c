pub use crate::{
    commitment::{Commitment, CommitmentType},
    errors::CommitmentError,
    key::CommitmentKey,
    l1::L1BlockRef,
    params::AltDaParams,
    status::ChallengeStatus,
};
