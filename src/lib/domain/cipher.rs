use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::field::{hex_u256, EncodingError};

/// A 32-byte payload encrypted as one MiMC block.
///
/// The block is interpreted as two big-endian 128-bit halves, each of which
/// fits in the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaintextBlock([u8; 32]);

impl PlaintextBlock {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| EncodingError::BlockLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Parse `0x`-prefixed (or bare) hex of exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| EncodingError::InvalidScalar(s.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The `(left, right)` 128-bit halves.
    pub fn split(&self) -> (U256, U256) {
        (
            U256::from_be_slice(&self.0[..16]),
            U256::from_be_slice(&self.0[16..]),
        )
    }

    /// Rebuild a block from its halves; `None` if either exceeds 128 bits.
    pub fn join(left: U256, right: U256) -> Option<Self> {
        if left.bit_len() > 128 || right.bit_len() > 128 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&left.to_be_bytes::<32>()[16..]);
        bytes[16..].copy_from_slice(&right.to_be_bytes::<32>()[16..]);
        Some(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for PlaintextBlock {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// Plaintext never goes to logs.
impl fmt::Debug for PlaintextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextBlock(..)")
    }
}

impl Serialize for PlaintextBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PlaintextBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// MiMC ciphertext: the two field elements left by the permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimcCipher {
    #[serde(rename = "xL", with = "hex_u256")]
    pub xl: U256,
    #[serde(rename = "xR", with = "hex_u256")]
    pub xr: U256,
}

impl MimcCipher {
    pub fn new(xl: U256, xr: U256) -> Self {
        Self { xl, xr }
    }

    /// As the `uint256[2]` the access-proof condition takes.
    pub fn to_pair(&self) -> [U256; 2] {
        [self.xl, self.xr]
    }
}
