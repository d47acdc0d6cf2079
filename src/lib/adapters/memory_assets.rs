use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::cipher::PlaintextBlock;
use crate::ports::assets::{AssetError, AssetResolver, ServiceAttributes};

/// In-memory implementation of `AssetResolver` for PoC and testing.
///
/// Stands in for both the metadata store (service attributes by DID) and the
/// provider's private plaintext store.
pub struct InMemoryAssets {
    attributes: Mutex<HashMap<String, ServiceAttributes>>,
    plaintexts: Mutex<HashMap<String, PlaintextBlock>>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self {
            attributes: Mutex::new(HashMap::new()),
            plaintexts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn publish(&self, did: impl Into<String>, attributes: ServiceAttributes) {
        self.attributes.lock().await.insert(did.into(), attributes);
    }

    pub async fn store_plaintext(&self, did: impl Into<String>, data: PlaintextBlock) {
        self.plaintexts.lock().await.insert(did.into(), data);
    }
}

impl Default for InMemoryAssets {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetResolver for InMemoryAssets {
    async fn service_attributes(&self, did: &str) -> Result<ServiceAttributes, AssetError> {
        let attributes = self.attributes.lock().await;
        attributes
            .get(did)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(did.to_string()))
    }

    async fn plaintext(&self, did: &str) -> Result<PlaintextBlock, AssetError> {
        if !self.attributes.lock().await.contains_key(did) {
            return Err(AssetError::NotFound(did.to_string()));
        }
        let plaintexts = self.plaintexts.lock().await;
        plaintexts
            .get(did)
            .copied()
            .ok_or_else(|| AssetError::NoPlaintext(did.to_string()))
    }
}
