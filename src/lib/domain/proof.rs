use alloy::primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

use super::cipher::MimcCipher;
use super::keys::BabyjubPublicKey;
use crate::crypto::field::{hex_bytes, hex_u256, hex_u256_vec};

/// Number of public signals of the key-transfer circuit.
pub const KEY_TRANSFER_SIGNALS: usize = 7;

/// A PLONK proof for the key-transfer circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnarkProof {
    /// Proof as the on-chain verifier takes it (`bytes proof` of `fulfill`).
    #[serde(with = "hex_bytes")]
    pub calldata: Bytes,
    /// Prover-native JSON, needed for off-chain verification.
    pub proof: serde_json::Value,
    /// `[buyer_x, buyer_y, provider_x, provider_y, cipher_xL, cipher_xR, hash_plain]`
    #[serde(with = "hex_u256_vec")]
    pub public_signals: Vec<U256>,
}

/// Chaum-Pedersen challenge and response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqProof {
    #[serde(with = "hex_u256")]
    pub e: U256,
    #[serde(with = "hex_u256")]
    pub f: U256,
}

impl DleqProof {
    /// As the `uint256[2] proof` argument of the DLEQ condition.
    pub fn to_pair(&self) -> [U256; 2] {
        [self.e, self.f]
    }
}

/// What a provider submits on the DLEQ path: proof plus re-encryption `yR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqTransfer {
    pub proof: DleqProof,
    pub reencrypt: BabyjubPublicKey,
}

/// What a provider submits on the SNARK path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnarkTransfer {
    pub cipher: MimcCipher,
    #[serde(with = "hex_u256")]
    pub orig_hash: U256,
    pub proof: SnarkProof,
}
