use std::future::Future;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::crypto::field::hex_u256;
use crate::domain::cipher::PlaintextBlock;
use crate::domain::keys::BabyjubPublicKey;
use crate::scheme::SchemeKind;

/// Service attributes an asset was published with.
///
/// `access-proof` services carry `_hash` and `_providerPub`; `access-dleq`
/// services carry the masked key, the secret anchor and the provider key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServiceAttributes {
    AccessProof {
        #[serde(rename = "_hash", with = "hex_u256")]
        hash: U256,
        #[serde(rename = "_providerPub")]
        provider_pub: BabyjubPublicKey,
    },
    AccessDleq {
        #[serde(rename = "_cipherDLEQ", with = "hex_u256")]
        cipher: U256,
        #[serde(rename = "_secretId")]
        secret_id: BabyjubPublicKey,
        #[serde(rename = "_providerPub")]
        provider_pub: BabyjubPublicKey,
    },
}

impl ServiceAttributes {
    pub fn kind(&self) -> SchemeKind {
        match self {
            ServiceAttributes::AccessProof { .. } => SchemeKind::AccessProof,
            ServiceAttributes::AccessDleq { .. } => SchemeKind::AccessDleq,
        }
    }

    pub fn provider_pub(&self) -> &BabyjubPublicKey {
        match self {
            ServiceAttributes::AccessProof { provider_pub, .. }
            | ServiceAttributes::AccessDleq { provider_pub, .. } => provider_pub,
        }
    }
}

/// Port for asset resolution and the provider-side plaintext store.
///
/// Implementations:
/// - `InMemoryAssets` (for PoC/testing)
pub trait AssetResolver: Send + Sync {
    fn service_attributes(
        &self,
        did: &str,
    ) -> impl Future<Output = Result<ServiceAttributes, AssetError>> + Send;

    /// Plaintext key of an `access-proof` asset. Only the provider has this.
    fn plaintext(&self, did: &str)
        -> impl Future<Output = Result<PlaintextBlock, AssetError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("asset {0} has no plaintext on this node")]
    NoPlaintext(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dleq_attributes_wire_names() {
        let key = BabyjubPublicKey::new(U256::from(1u64), U256::from(2u64));
        let attrs = ServiceAttributes::AccessDleq {
            cipher: U256::from(3u64),
            secret_id: key,
            provider_pub: key,
        };
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["type"], "access-dleq");
        assert_eq!(
            json["_cipherDLEQ"],
            "0x0000000000000000000000000000000000000000000000000000000000000003"
        );
        assert!(json.get("_cipher").is_none());
        assert!(json.get("_secretId").is_some());

        let back: ServiceAttributes = serde_json::from_value(json).unwrap();
        assert_eq!(back, attrs);
        assert_eq!(back.kind(), SchemeKind::AccessDleq);
    }
}
