pub mod assets;
pub mod escrow;
pub mod prover;

use alloy::primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::crypto::field::{hex_bytes, hex_u256};
use crate::domain::cipher::MimcCipher;
use crate::domain::keys::BabyjubPublicKey;
use crate::domain::proof::DleqProof;

/// Minimal transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub success: bool,
}

/// Arguments of `AccessProofCondition.fulfill`, also what its `Fulfilled` event carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessProofFulfillment {
    #[serde(with = "hex_u256")]
    pub orig_hash: U256,
    pub buyer: BabyjubPublicKey,
    pub provider: BabyjubPublicKey,
    pub cipher: MimcCipher,
    #[serde(with = "hex_bytes")]
    pub proof: Bytes,
}

/// Arguments of `AccessDLEQCondition.fulfill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDleqFulfillment {
    #[serde(with = "hex_u256")]
    pub cipher: U256,
    pub secret_id: BabyjubPublicKey,
    pub provider: BabyjubPublicKey,
    pub buyer: BabyjubPublicKey,
    pub reencrypt: BabyjubPublicKey,
    pub proof: DleqProof,
}
