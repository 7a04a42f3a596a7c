//! Commitment codec.
//!
//! A commitment is a one byte type tag followed by a digest whose length is
//! fixed per type. Inside batcher transactions it is additionally prefixed
//! with [`TX_DATA_VERSION`] so derivation can tell Alt-DA frames apart from
//! plain calldata.

use std::fmt;

use alloy_primitives::{keccak256, Bytes, B256};
use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

use crate::errors::CommitmentError;

/// Derivation version byte that marks Alt-DA framing in batcher transactions.
pub const TX_DATA_VERSION: u8 = 1;

/// Known commitment types.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Arbitrary)]
#[derive(Serialize, Deserialize)]
#[repr(u8)]
pub enum CommitmentType {
    /// keccak256 of the preimage, resolvable on L1 from `resolve` calldata.
    Keccak256 = 0,
}

impl CommitmentType {
    /// Config string used by rollup configs for this type.
    pub const KECCAK_STR: &'static str = "KeccakCommitment";

    pub fn tag(&self) -> u8 {
        *self as u8
    }

    pub fn from_tag(tag: u8) -> Result<Self, CommitmentError> {
        match tag {
            0 => Ok(Self::Keccak256),
            t => Err(CommitmentError::UnknownType(t)),
        }
    }

    /// Length of the digest that follows the type tag.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Keccak256 => 32,
        }
    }

    /// Computes the digest for a preimage under this commitment type.
    pub fn digest(&self, preimage: &[u8]) -> B256 {
        match self {
            Self::Keccak256 => keccak256(preimage),
        }
    }

    /// Parses the rollup config representation.
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s {
            Self::KECCAK_STR => Some(Self::Keccak256),
            _ => None,
        }
    }
}

impl fmt::Display for CommitmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keccak256 => f.write_str(Self::KECCAK_STR),
        }
    }
}

/// A validated commitment.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Arbitrary)]
#[derive(Serialize, Deserialize)]
pub enum Commitment {
    Keccak256(B256),
}

impl Commitment {
    /// Commits to a preimage with the given type.
    pub fn from_preimage(ty: CommitmentType, preimage: &[u8]) -> Self {
        match ty {
            CommitmentType::Keccak256 => Self::Keccak256(ty.digest(preimage)),
        }
    }

    pub fn commitment_type(&self) -> CommitmentType {
        match self {
            Self::Keccak256(_) => CommitmentType::Keccak256,
        }
    }

    pub fn digest(&self) -> &[u8] {
        match self {
            Self::Keccak256(d) => d.as_slice(),
        }
    }

    /// Returns `type || digest`.
    pub fn encode(&self) -> Bytes {
        encode(self.commitment_type().tag(), self.digest())
    }

    /// Parses `type || digest`, rejecting unknown types and bad lengths.
    pub fn decode(buf: &[u8]) -> Result<Self, CommitmentError> {
        validate(buf)?;
        let ty = CommitmentType::from_tag(buf[0])?;
        match ty {
            CommitmentType::Keccak256 => Ok(Self::Keccak256(B256::from_slice(&buf[1..]))),
        }
    }

    /// Returns the batcher transaction payload `0x01 || type || digest`.
    pub fn tx_data(&self) -> Bytes {
        tx_data(&self.encode())
    }

    /// Parses a batcher transaction payload.
    pub fn from_tx_data(buf: &[u8]) -> Result<Self, CommitmentError> {
        Self::decode(strip_tx_data(buf)?)
    }

    /// Checks that `preimage` hashes to this commitment.
    pub fn verify(&self, preimage: &[u8]) -> bool {
        match self {
            Self::Keccak256(d) => keccak256(preimage) == *d,
        }
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.encode()))
    }
}

/// Checks a raw commitment for a known type tag and the matching length.
pub fn validate(buf: &[u8]) -> Result<(), CommitmentError> {
    let Some(&tag) = buf.first() else {
        return Err(CommitmentError::Empty);
    };
    let ty = CommitmentType::from_tag(tag)?;
    let actual = buf.len() - 1;
    if actual != ty.digest_len() {
        return Err(CommitmentError::InvalidLength(tag, ty.digest_len(), actual));
    }
    Ok(())
}

/// Produces `ty || digest` without checking anything.
pub fn encode(ty: u8, digest: &[u8]) -> Bytes {
    let mut buf = Vec::with_capacity(digest.len() + 1);
    buf.push(ty);
    buf.extend_from_slice(digest);
    buf.into()
}

/// Splits the type tag off a validated commitment.
pub fn decode(buf: &[u8]) -> Result<(CommitmentType, &[u8]), CommitmentError> {
    validate(buf)?;
    let ty = CommitmentType::from_tag(buf[0])?;
    Ok((ty, &buf[1..]))
}

/// Prepends the derivation version byte.
pub fn tx_data(buf: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(buf.len() + 1);
    out.push(TX_DATA_VERSION);
    out.extend_from_slice(buf);
    out.into()
}

/// Removes and checks the derivation version byte.
pub fn strip_tx_data(buf: &[u8]) -> Result<&[u8], CommitmentError> {
    match buf.split_first() {
        None => Err(CommitmentError::MissingTxDataVersion),
        Some((&TX_DATA_VERSION, rest)) => Ok(rest),
        Some((&v, _)) => Err(CommitmentError::WrongTxDataVersion(v)),
    }
}
