use std::fmt;

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a challenge, with the contract's numeric encoding.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Arbitrary, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChallengeStatus {
    #[default]
    Uninitialized = 0,
    Active = 1,
    Resolved = 2,
    Expired = 3,
}

impl ChallengeStatus {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Returns if no further status change is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Expired)
    }
}

impl TryFrom<u8> for ChallengeStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Uninitialized),
            1 => Ok(Self::Active),
            2 => Ok(Self::Resolved),
            3 => Ok(Self::Expired),
            v => Err(v),
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_encoding() {
        for s in [
            ChallengeStatus::Uninitialized,
            ChallengeStatus::Active,
            ChallengeStatus::Resolved,
            ChallengeStatus::Expired,
        ] {
            assert_eq!(ChallengeStatus::try_from(s.as_u8()), Ok(s));
        }
        assert_eq!(ChallengeStatus::try_from(4), Err(4));
    }
}
