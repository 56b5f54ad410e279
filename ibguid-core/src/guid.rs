//! InfiniBand GUID value type.
//!
//! A GUID is a 64-bit hardware identifier written as 8 colon-separated
//! hex byte groups, most-significant byte first: `00:01:02:03:04:05:06:08`.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

/// Number of bytes in a GUID.
pub const GUID_LEN: usize = 8;

/// Error returned when a string is not a valid GUID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseGuidError {
    #[error("expected 8 colon-separated byte groups, got {0}")]
    GroupCount(usize),

    #[error("invalid byte group {0:?} (expected two hex digits)")]
    InvalidGroup(String),
}

/// 64-bit InfiniBand GUID.
///
/// Ordering and arithmetic follow the unsigned integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Guid(u64);

impl Guid {
    /// Generate a GUID from the process-wide random source.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// The GUID as an unsigned integer.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Big-endian byte representation.
    pub fn to_bytes(self) -> [u8; GUID_LEN] {
        self.0.to_be_bytes()
    }

    /// The GUID `n` positions after this one, wrapping at 2^64.
    pub fn offset(self, n: u32) -> Self {
        Self(self.0.wrapping_add(u64::from(n)))
    }
}

impl From<u64> for Guid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<[u8; GUID_LEN]> for Guid {
    fn from(bytes: [u8; GUID_LEN]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl Add<u32> for Guid {
    type Output = Guid;

    fn add(self, rhs: u32) -> Guid {
        self.offset(rhs)
    }
}

impl FromStr for Guid {
    type Err = ParseGuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split(':').collect();
        if groups.len() != GUID_LEN {
            return Err(ParseGuidError::GroupCount(groups.len()));
        }

        let mut bytes = [0u8; GUID_LEN];
        for (byte, group) in bytes.iter_mut().zip(&groups) {
            // from_str_radix accepts a leading '+', so check the digits first
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseGuidError::InvalidGroup(group.to_string()));
            }
            *byte = u8::from_str_radix(group, 16)
                .map_err(|_| ParseGuidError::InvalidGroup(group.to_string()))?;
        }

        Ok(Self::from(bytes))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.to_bytes();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]
        )
    }
}
